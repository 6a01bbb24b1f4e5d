use super::{atomic_write, reject_history, ConsistencyReport, Layout};
use crate::codec::{self, StorageKey};
use crate::error::{PikiError, Result};
use crate::model::Revision;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Content files of all pages below one root.
#[derive(Debug, Clone)]
pub struct PageStore {
    layout: Layout,
}

impl PageStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// A page is available iff its live content file exists.
    pub fn exists(&self, key: &StorageKey) -> bool {
        self.has_revision(key, Revision::Live)
    }

    pub fn has_revision(&self, key: &StorageKey, revision: Revision) -> bool {
        self.layout.content_path(key, revision).is_file()
    }

    /// Whether a page directory exists at all, even one holding only history.
    pub fn occupied(&self, key: &StorageKey) -> bool {
        self.layout.doc_dir(key).exists()
    }

    /// Reads content. A missing file means "not created yet" and reads as empty.
    pub fn read(&self, key: &StorageKey, revision: Revision) -> Result<String> {
        match fs::read_to_string(self.layout.content_path(key, revision)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, content), fields(key = %key, bytes = content.len()))]
    pub fn write(&self, key: &StorageKey, revision: Revision, content: &str) -> Result<()> {
        reject_history(key, revision)?;
        atomic_write(&self.layout.content_path(key, Revision::Live), content.as_bytes())?;
        debug!("Content written");
        Ok(())
    }

    /// Moves the whole page directory (content, metadata, history) to a new path.
    ///
    /// `new_path` is normalized first. Fails with [`PikiError::PathCollision`] when any
    /// page directory, live or history-only, already occupies the target.
    #[instrument(skip(self), fields(key = %key))]
    pub fn rename(&self, key: &StorageKey, new_path: &str) -> Result<StorageKey> {
        let normalized = codec::normalize(new_path);
        let new_key = codec::encode(&normalized)?;

        let src = self.layout.doc_dir(key);
        let dst = self.layout.doc_dir(&new_key);
        if dst.exists() {
            return Err(PikiError::PathCollision(normalized));
        }
        if !src.is_dir() {
            return Err(PikiError::NotFound(key.logical_path()));
        }

        fs::rename(&src, &dst)?;
        info!(to = %new_key, "Page directory moved");
        Ok(new_key)
    }

    /// Removes live content and metadata. History stays on disk.
    ///
    /// Metadata goes first: if the process dies in between, the page survives with
    /// content but no sidecar, which [`check`](Self::check) reports and repair fixes.
    #[instrument(skip(self), fields(key = %key))]
    pub fn delete(&self, key: &StorageKey) -> Result<()> {
        remove_if_present(&self.layout.meta_path(key, Revision::Live))?;
        remove_if_present(&self.layout.content_path(key, Revision::Live))?;
        info!("Live files removed");
        Ok(())
    }

    /// Keys of every page directory, including pages that only have history left.
    pub fn keys(&self) -> Result<Vec<StorageKey>> {
        let mut keys: Vec<StorageKey> = self
            .dir_names()?
            .into_iter()
            .filter_map(|name| StorageKey::from_dir_name(&name))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Keys of available pages.
    pub fn live_keys(&self) -> Result<Vec<StorageKey>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| self.exists(key))
            .collect())
    }

    /// Finds pages whose content and metadata presence disagree.
    pub fn check(&self) -> Result<ConsistencyReport> {
        let mut report = ConsistencyReport::default();
        for name in self.dir_names()? {
            let Some(key) = StorageKey::from_dir_name(&name) else {
                warn!(entry = %name, "Foreign directory below pages root");
                report.foreign_entries.push(self.layout.root().join(&name));
                continue;
            };
            let has_content = self.exists(&key);
            let has_meta = self.layout.meta_path(&key, Revision::Live).is_file();
            match (has_content, has_meta) {
                (true, false) => report.missing_metadata.push(key.logical_path()),
                (false, true) => report.orphaned_metadata.push(key.logical_path()),
                _ => {}
            }
        }
        report.missing_metadata.sort();
        report.orphaned_metadata.sort();
        Ok(report)
    }

    fn dir_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.layout.root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Already absent");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
