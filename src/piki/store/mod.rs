//! # Storage Layer
//!
//! Pages are stored as plain files, one directory per page, named by the page's
//! [`StorageKey`](crate::codec::StorageKey):
//!
//! ```text
//! pages/
//! ├── index/
//! │   ├── page                  # Live content
//! │   ├── meta.json             # Live metadata sidecar
//! │   └── history/
//! │       ├── 00001_page        # Version 1 content
//! │       ├── 00001_meta.json   # Version 1 metadata
//! │       ├── 00002_page
//! │       └── 00002_meta.json
//! └── docs::setup/
//!     └── ...
//! ```
//!
//! ### Philosophy
//! - **Files are Truth**: a page is available iff its `page` file exists. Nothing else
//!   (metadata, search index) is consulted to decide availability.
//! - **History is append-only**: snapshot files are created once and only read afterwards.
//! - **Atomic replacement**: live files are written to a temp file in the page directory
//!   and renamed into place, so readers see either the old or the new bytes.
//!
//! ## Components
//!
//! - [`page::PageStore`]: content read/write, rename, delete, enumeration, consistency check.
//! - [`meta::MetadataStore`]: the JSON sidecar.
//! - [`history::HistoryManager`]: version numbering and snapshots.
//! - [`lock::KeyLocks`]: per-key mutual exclusion for multi-step write protocols.
//!
//! All three stores share a [`Layout`], which is the only place file names are spelled out.

use crate::codec::StorageKey;
use crate::error::{PikiError, Result};
use crate::model::Revision;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub mod history;
pub mod lock;
pub mod meta;
pub mod page;

pub const CONTENT_FILE: &str = "page";
pub const META_FILE: &str = "meta.json";
pub const HISTORY_DIR: &str = "history";

/// Digits of the zero-padded version prefix of history files.
pub const VERSION_WIDTH: usize = 5;

/// Maps storage keys and revisions to file paths below one root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn doc_dir(&self, key: &StorageKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn history_dir(&self, key: &StorageKey) -> PathBuf {
        self.doc_dir(key).join(HISTORY_DIR)
    }

    pub fn content_path(&self, key: &StorageKey, revision: Revision) -> PathBuf {
        match revision {
            Revision::Live => self.doc_dir(key).join(CONTENT_FILE),
            Revision::History(v) => self.history_dir(key).join(history_name(v, CONTENT_FILE)),
        }
    }

    pub fn meta_path(&self, key: &StorageKey, revision: Revision) -> PathBuf {
        match revision {
            Revision::Live => self.doc_dir(key).join(META_FILE),
            Revision::History(v) => self.history_dir(key).join(history_name(v, META_FILE)),
        }
    }
}

/// `00042_page`, `00042_meta.json`: one numeric prefix groups both files of a version.
pub fn history_name(version: u32, suffix: &str) -> String {
    format!("{:0width$}_{}", version, suffix, width = VERSION_WIDTH)
}

/// Result of [`page::PageStore::check`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Content exists but the sidecar is missing.
    pub missing_metadata: Vec<String>,
    /// Sidecar exists but the content is gone (interrupted delete or rename).
    pub orphaned_metadata: Vec<String>,
    /// Directories below the root that are not valid storage keys.
    pub foreign_entries: Vec<PathBuf>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_metadata.is_empty()
            && self.orphaned_metadata.is_empty()
            && self.foreign_entries.is_empty()
    }
}

pub(crate) fn reject_history(key: &StorageKey, revision: Revision) -> Result<()> {
    match revision {
        Revision::Live => Ok(()),
        Revision::History(version) => Err(PikiError::ImmutableVersion {
            path: key.logical_path(),
            version,
        }),
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `content` next to `target` under a unique temp name, then renames it into place.
pub(crate) fn atomic_write(target: &Path, content: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| PikiError::Io(std::io::Error::other("target has no parent directory")))?;
    ensure_dir(dir)?;

    let stem = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let tmp_path = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp_path, content) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PikiError::Io(e));
    }
    fs::rename(&tmp_path, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use tempfile::TempDir;

    #[test]
    fn layout_spells_out_file_names() {
        let layout = Layout::new("/data/pages");
        let key = encode("docs/intro").unwrap();
        assert_eq!(
            layout.content_path(&key, Revision::Live),
            PathBuf::from("/data/pages/docs::intro/page")
        );
        assert_eq!(
            layout.meta_path(&key, Revision::History(3)),
            PathBuf::from("/data/pages/docs::intro/history/00003_meta.json")
        );
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("page");
        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        for entry in fs::read_dir(target.parent().unwrap()).unwrap() {
            let name = entry.unwrap().file_name();
            let name = name.to_str().unwrap();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }
}
