//! # History
//!
//! Before a page is overwritten, renamed or deleted its live content and metadata are
//! copied into `history/` under the next version number. Version numbers are taken as
//! `max(existing) + 1`, not as a count, so pruning old snapshots by hand never makes a
//! new snapshot collide with a surviving one.
//!
//! The number is computed from the directory listing, so callers must hold the page's
//! [`KeyLocks`](super::lock::KeyLocks) slot while snapshotting.

use super::meta::MetadataStore;
use super::{atomic_write, ensure_dir, Layout, CONTENT_FILE, META_FILE};
use crate::codec::StorageKey;
use crate::error::Result;
use crate::model::{HistoryEntry, Revision};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct HistoryManager {
    layout: Layout,
    meta: MetadataStore,
}

impl HistoryManager {
    pub fn new(layout: Layout) -> Self {
        let meta = MetadataStore::new(layout.clone());
        Self { layout, meta }
    }

    /// Version numbers present on disk, parsed from the file name prefixes.
    pub fn list_versions(&self, key: &StorageKey) -> Result<BTreeSet<u32>> {
        let dir = self.layout.history_dir(key);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if let Some(version) = entry.file_name().to_str().and_then(parse_version) {
                versions.insert(version);
            }
        }
        Ok(versions)
    }

    pub fn next_version(&self, key: &StorageKey) -> Result<u32> {
        let versions = self.list_versions(key)?;
        Ok(versions.last().map_or(1, |max| max + 1))
    }

    /// Copies the live files into a new version. Returns `None` when there is no live
    /// content yet.
    #[instrument(skip(self), fields(key = %key))]
    pub fn snapshot(&self, key: &StorageKey) -> Result<Option<u32>> {
        let content = self.layout.content_path(key, Revision::Live);
        if !content.is_file() {
            debug!("No live content, nothing to snapshot");
            return Ok(None);
        }

        let version = self.next_version(key)?;
        ensure_dir(&self.layout.history_dir(key))?;

        let meta = self.layout.meta_path(key, Revision::Live);
        if meta.is_file() {
            copy_once(&meta, &self.layout.meta_path(key, Revision::History(version)))?;
        }
        // Content last: a version counts as present once its content file exists.
        copy_once(
            &content,
            &self.layout.content_path(key, Revision::History(version)),
        )?;

        info!(version, "Snapshot created");
        Ok(Some(version))
    }

    /// Stored versions with their metadata, oldest first.
    pub fn entries(&self, key: &StorageKey) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .list_versions(key)?
            .into_iter()
            .map(|version| HistoryEntry {
                version,
                metadata: self.meta.load(key, Revision::History(version)),
            })
            .collect())
    }
}

/// `00012_page` -> 12. Files without a known suffix are ignored.
fn parse_version(file_name: &str) -> Option<u32> {
    let (prefix, suffix) = file_name.split_once('_')?;
    if suffix != CONTENT_FILE && suffix != META_FILE {
        return None;
    }
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok().filter(|v| *v > 0)
}

fn copy_once(src: &Path, dst: &Path) -> Result<()> {
    let bytes = fs::read(src)?;
    atomic_write(dst, &bytes)?;
    debug!(from = %src.display(), to = %dst.display(), "Copied into history");
    Ok(())
}
