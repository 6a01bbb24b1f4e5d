//! # Path Codec
//!
//! Pages are addressed by hierarchical logical paths (`docs/setup/linux`), but every page
//! lives in a single flat directory below the pages root. The codec maps between the two:
//!
//! ```text
//! docs/setup/linux  <->  docs::setup::linux
//! ```
//!
//! Every `/` becomes the two-character escape `::`. Because `:` itself is reserved and
//! rejected in logical paths, the mapping is injective and `decode(encode(p)) == p` holds
//! for every accepted path. The codec does no I/O.

use crate::error::{PikiError, Result};
use std::fmt;

/// Character that may never appear in a logical path.
pub const RESERVED: char = ':';

/// Replacement for `/` inside a storage key.
pub const ESCAPE: &str = "::";

/// Flat on-disk directory name of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The logical path this key was encoded from.
    pub fn logical_path(&self) -> String {
        decode(self)
    }

    /// Accepts a directory name found on disk, if it is the encoding of a valid path.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let key = StorageKey(name.to_string());
        match encode(&decode(&key)) {
            Ok(roundtrip) if roundtrip == key => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checks that a logical path can be stored.
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PikiError::InvalidPath(path.to_string(), "path is empty"));
    }
    if path.contains(RESERVED) {
        return Err(PikiError::InvalidPath(
            path.to_string(),
            "the ':' character is reserved",
        ));
    }
    if path == "." || path == ".." {
        return Err(PikiError::InvalidPath(path.to_string(), "reserved name"));
    }
    if path.contains('\0') {
        return Err(PikiError::InvalidPath(path.to_string(), "contains NUL"));
    }
    Ok(())
}

pub fn encode(path: &str) -> Result<StorageKey> {
    validate(path)?;
    Ok(StorageKey(path.replace('/', ESCAPE)))
}

pub fn decode(key: &StorageKey) -> String {
    key.0.replace(ESCAPE, "/")
}

/// Cleans up user-typed paths: backslashes become slashes, runs of slashes collapse
/// to one, and leading/trailing slashes are dropped.
pub fn normalize(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last path segment, used as the page title.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_slashes() {
        let key = encode("docs/setup/linux").unwrap();
        assert_eq!(key.as_str(), "docs::setup::linux");
    }

    #[test]
    fn roundtrips_assorted_paths() {
        for path in [
            "index",
            "a/b/c",
            "a//b",
            "/leading",
            "trailing/",
            "with space/und ümlaut",
            "a/../b",
            "...",
        ] {
            let key = encode(path).unwrap();
            assert_eq!(decode(&key), path, "roundtrip of {path:?}");
        }
    }

    #[test]
    fn encoding_is_injective_on_near_collisions() {
        let paths = ["a/b", "a//b", "a/b/", "ab", "a b", "/a/b"];
        let keys: std::collections::HashSet<_> =
            paths.iter().map(|p| encode(p).unwrap()).collect();
        assert_eq!(keys.len(), paths.len());
    }

    #[test]
    fn rejects_reserved_separator() {
        assert!(matches!(
            encode("a:b"),
            Err(PikiError::InvalidPath(_, _))
        ));
        assert!(encode("a::b").is_err());
    }

    #[test]
    fn rejects_names_that_escape_the_root() {
        assert!(encode("").is_err());
        assert!(encode(".").is_err());
        assert!(encode("..").is_err());
        assert!(encode("a\0b").is_err());
    }

    #[test]
    fn from_dir_name_accepts_only_encodings() {
        assert_eq!(
            StorageKey::from_dir_name("a::b").unwrap().logical_path(),
            "a/b"
        );
        assert!(StorageKey::from_dir_name("a:b").is_none());
        assert!(StorageKey::from_dir_name("a:::b").is_none());
        assert!(StorageKey::from_dir_name("").is_none());
    }

    #[test]
    fn normalize_cleans_user_input() {
        assert_eq!(normalize("docs\\intro"), "docs/intro");
        assert_eq!(normalize("docs///intro//"), "docs/intro");
        assert_eq!(normalize("/docs/intro"), "docs/intro");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn basename_is_last_segment() {
        assert_eq!(basename("docs/setup/linux"), "linux");
        assert_eq!(basename("index"), "index");
    }
}
