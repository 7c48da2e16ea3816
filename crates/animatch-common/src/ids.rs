//! Typed ID wrappers for catalogue identifiers.
//!
//! Subjects and episodes share the same numeric id space on the remote
//! catalogue; the newtypes keep a subject id from being passed where an
//! episode id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! catalogue_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw catalogue id.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw numeric id.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// `true` for the zero id, which never names a catalogue entry.
            #[must_use]
            pub const fn is_unset(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }
    };
}

catalogue_id! {
    /// Identifier of a catalogue subject (a series, season or movie).
    SubjectId
}

catalogue_id! {
    /// Identifier of a catalogue episode. Zero marks a synthesized record.
    EpisodeId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_roundtrip() {
        let id = SubjectId::new(69496);
        assert_eq!(id.get(), 69496);
        assert_eq!(u64::from(id), 69496);
        assert_eq!(SubjectId::from(69496), id);
        assert_eq!(id.to_string(), "69496");
    }

    #[test]
    fn test_parse() {
        assert_eq!("259013".parse::<EpisodeId>().unwrap(), EpisodeId::new(259013));
        assert_eq!(" 42 ".parse::<SubjectId>().unwrap(), SubjectId::new(42));
        assert!("abc".parse::<EpisodeId>().is_err());
    }

    #[test]
    fn test_unset() {
        assert!(EpisodeId::default().is_unset());
        assert!(!EpisodeId::new(1).is_unset());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&SubjectId::new(975)).unwrap();
        assert_eq!(json, "975");
        let id: EpisodeId = serde_json::from_str("5168").unwrap();
        assert_eq!(id, EpisodeId::new(5168));
    }
}
