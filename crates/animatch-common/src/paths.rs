//! Path utilities for detecting file types by extension.
//!
//! Used by the directory scanner to pick episode files, and by the
//! classifier to strip a known media extension before pattern matching.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "rmvb",
];

/// Subtitle extensions, stripped alongside video ones.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "vtt", "idx", "sup"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use animatch_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("Show - 01.mkv")));
/// assert!(is_video_file(Path::new("/library/Show/ep01.MP4")));
/// assert!(!is_video_file(Path::new("Show - 01.ass")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Strip a trailing video or subtitle extension from a bare file name.
///
/// Names with any other suffix are returned unchanged, so a dot inside a
/// fractional episode number ("12.5") is never mistaken for an extension.
///
/// # Examples
///
/// ```
/// use animatch_common::paths::strip_media_extension;
///
/// assert_eq!(strip_media_extension("ep01.mp4"), "ep01");
/// assert_eq!(strip_media_extension("Show - 12.5"), "Show - 12.5");
/// ```
pub fn strip_media_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
                    || SUBTITLE_EXTENSIONS.contains(&ext.to_lowercase().as_str())) =>
        {
            stem
        }
        _ => file_name,
    }
}
