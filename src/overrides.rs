//! Directory-scoped overrides.
//!
//! A library directory may pin the catalogue subject its files belong to and
//! shift the local numbering by a fixed offset. The resolver only consumes
//! the resolved [`LocalOverride`]; finding it is the job of an
//! [`OverrideStore`].
//!
//! [`IniOverrideStore`] reads a `bangumi.ini` sidecar:
//!
//! ```ini
//! [Bangumi]
//! ID=69496
//! Offset=26
//! ```

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use animatch_common::SubjectId;
use serde::Serialize;
use tracing::{debug, warn};

/// Name of the sidecar file read by [`IniOverrideStore`].
pub const OVERRIDE_FILE_NAME: &str = "bangumi.ini";

/// Per-directory correction applied before remote matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocalOverride {
    /// Subject to match against, bypassing the host's subject ids.
    pub explicit_subject_id: Option<SubjectId>,
    /// Subtracted from the extracted index of Normal episodes before lookup.
    pub offset: i32,
}

impl LocalOverride {
    /// `true` when the override changes nothing.
    pub fn is_empty(&self) -> bool {
        self.explicit_subject_id.is_none() && self.offset == 0
    }
}

/// Source of directory overrides.
pub trait OverrideStore: Send + Sync {
    /// The override in effect for files in `directory`.
    fn resolve_override(&self, directory: &Path) -> LocalOverride;
}

impl<S: BuildHasher + Send + Sync> OverrideStore for HashMap<PathBuf, LocalOverride, S> {
    fn resolve_override(&self, directory: &Path) -> LocalOverride {
        self.get(directory).copied().unwrap_or_default()
    }
}

/// Parse the contents of an override file.
///
/// Keys are case-insensitive, `#` and `;` start comment lines, and section
/// headers are ignored. Values that do not parse are skipped with a warning.
pub fn parse_override(content: &str) -> LocalOverride {
    let mut result = LocalOverride::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') || line.starts_with('[')
        {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "id" => match value.parse::<u64>() {
                Ok(0) => {}
                Ok(id) => result.explicit_subject_id = Some(SubjectId::new(id)),
                Err(_) => warn!(value, "Ignoring invalid subject id in override"),
            },
            "offset" => match value.parse::<i32>() {
                Ok(offset) => result.offset = offset,
                Err(_) => warn!(value, "Ignoring invalid offset in override"),
            },
            _ => {}
        }
    }

    result
}

/// Reads `bangumi.ini` from a directory or its nearest ancestor that has one.
#[derive(Debug, Clone, Default)]
pub struct IniOverrideStore {
    root: Option<PathBuf>,
}

impl IniOverrideStore {
    /// Search every ancestor up to the filesystem root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the ancestor search at `root` (inclusive).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn read(path: &Path) -> Option<LocalOverride> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(parse_override(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read override file");
                None
            }
        }
    }
}

impl OverrideStore for IniOverrideStore {
    fn resolve_override(&self, directory: &Path) -> LocalOverride {
        for dir in directory.ancestors() {
            let candidate = dir.join(OVERRIDE_FILE_NAME);
            if let Some(found) = Self::read(&candidate) {
                debug!(path = %candidate.display(), ?found, "Loaded directory override");
                return found;
            }
            if self.root.as_deref() == Some(dir) {
                break;
            }
        }
        LocalOverride::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_override() {
        let parsed = parse_override("[Bangumi]\nID=69496\nOffset=26\n");
        assert_eq!(parsed.explicit_subject_id, Some(SubjectId::new(69496)));
        assert_eq!(parsed.offset, 26);
    }

    #[test]
    fn test_parse_case_and_comments() {
        let parsed = parse_override("# pinned\n; legacy\nid = 12\nOFFSET = -3\n");
        assert_eq!(parsed.explicit_subject_id, Some(SubjectId::new(12)));
        assert_eq!(parsed.offset, -3);
    }

    #[test]
    fn test_parse_ignores_bad_values() {
        let parsed = parse_override("ID=abc\nOffset=1.5\n");
        assert!(parsed.is_empty());
        assert!(parse_override("ID=0").explicit_subject_id.is_none());
    }

    #[test]
    fn test_store_inherits_from_ancestor() {
        let dir = tempdir().unwrap();
        let season = dir.path().join("Show").join("Season 2");
        std::fs::create_dir_all(&season).unwrap();
        std::fs::write(dir.path().join("Show").join(OVERRIDE_FILE_NAME), "Offset=12").unwrap();

        let store = IniOverrideStore::with_root(dir.path());
        assert_eq!(store.resolve_override(&season).offset, 12);
    }

    #[test]
    fn test_nearest_file_wins() {
        let dir = tempdir().unwrap();
        let season = dir.path().join("Show").join("Season 2");
        std::fs::create_dir_all(&season).unwrap();
        std::fs::write(dir.path().join("Show").join(OVERRIDE_FILE_NAME), "Offset=12").unwrap();
        std::fs::write(season.join(OVERRIDE_FILE_NAME), "ID=5").unwrap();

        let store = IniOverrideStore::with_root(dir.path());
        let found = store.resolve_override(&season);
        assert_eq!(found.explicit_subject_id, Some(SubjectId::new(5)));
        assert_eq!(found.offset, 0);
    }

    #[test]
    fn test_root_bounds_search() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("library");
        let show = library.join("Show");
        std::fs::create_dir_all(&show).unwrap();
        std::fs::write(dir.path().join(OVERRIDE_FILE_NAME), "Offset=7").unwrap();

        let store = IniOverrideStore::with_root(&library);
        assert!(store.resolve_override(&show).is_empty());
    }

    #[test]
    fn test_map_store() {
        let mut map = HashMap::new();
        map.insert(
            PathBuf::from("/anime/Show"),
            LocalOverride {
                explicit_subject_id: None,
                offset: 26,
            },
        );
        assert_eq!(map.resolve_override(Path::new("/anime/Show")).offset, 26);
        assert!(map.resolve_override(Path::new("/anime/Other")).is_empty());
    }
}
