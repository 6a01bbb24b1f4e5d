//! # Document Facade
//!
//! The single entry point for reading and writing pages. It composes the stores below
//! `store/` with the [`SearchIndex`] and owns the per-page locks.
//!
//! ## Resolution on read
//!
//! [`DocumentFacade::get`] resolves a path in two explicit steps, reported as
//! [`Source`]:
//!
//! 1. the user page, if its content file exists;
//! 2. a system page with the same basename (read-only, e.g. `index` or `tree`);
//!
//! and finally the built-in welcome text for the configured start page. Anything else
//! is [`Source::Missing`].
//!
//! ## Write protocol
//!
//! Every mutation runs under the page's lock:
//!
//! ```text
//! read current state -> decide what changed -> snapshot -> write content
//!     -> write metadata -> reindex
//! ```
//!
//! Nothing is cached between calls; each call reads from disk.

use crate::codec::{self, StorageKey};
use crate::config::PikiConfig;
use crate::error::{PikiError, Result};
use crate::model::{
    content_equivalent, now_epoch, DocumentView, HistorySummary, MetadataRecord, Revision,
    Source,
};
use crate::search::{SearchDocument, SearchIndex};
use crate::store::history::HistoryManager;
use crate::store::lock::KeyLocks;
use crate::store::meta::MetadataStore;
use crate::store::page::PageStore;
use crate::store::{ConsistencyReport, Layout};
use similar::TextDiff;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Shown for the start page until someone writes it.
pub const STARTPAGE_TEXT: &str = "= Welcome to piki
**It works!**

You are looking at the built-in start page because no page has been written here yet.

Edit this page to create your own start page.
";

/// Pages written into the system root by [`DocumentFacade::install_system_pages`].
pub const SYSTEM_PAGES: [(&str, &str); 2] = [
    ("index", "= Index\n<<allpages>>"),
    ("tree", "= Tree\n<<allpagestree>>"),
];

/// What [`DocumentFacade::repair`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// Pages that got a fresh metadata sidecar.
    pub metadata_created: Vec<String>,
    /// Sidecars removed because their content was gone.
    pub metadata_removed: Vec<String>,
    /// Pages in the rebuilt index.
    pub indexed: usize,
}

struct Root {
    pages: PageStore,
    meta: MetadataStore,
}

impl Root {
    fn new(path: &Path) -> Self {
        let layout = Layout::new(path);
        Self {
            pages: PageStore::new(layout.clone()),
            meta: MetadataStore::new(layout),
        }
    }
}

pub struct DocumentFacade {
    user: Root,
    history: HistoryManager,
    system: Root,
    index: SearchIndex,
    locks: KeyLocks,
    startpage: String,
}

impl DocumentFacade {
    pub fn new(
        pages_root: &Path,
        system_pages_root: &Path,
        startpage: &str,
        index: SearchIndex,
    ) -> Self {
        Self {
            user: Root::new(pages_root),
            history: HistoryManager::new(Layout::new(pages_root)),
            system: Root::new(system_pages_root),
            index,
            locks: KeyLocks::new(),
            startpage: codec::normalize(startpage),
        }
    }

    /// Opens the stores and the on-disk index named by a resolved config.
    pub fn open(config: &PikiConfig) -> Result<Self> {
        let index = SearchIndex::open(&config.index_path, config.writer_heap_bytes)?;
        Ok(Self::new(
            &config.pages_root,
            &config.system_pages_root,
            &config.startpage,
            index,
        ))
    }

    pub fn startpage(&self) -> &str {
        &self.startpage
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn pages(&self) -> &PageStore {
        &self.user.pages
    }

    pub fn history_manager(&self) -> &HistoryManager {
        &self.history
    }

    #[instrument(skip(self))]
    pub fn get(&self, path: &str, version: Option<u32>) -> Result<DocumentView> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let now = now_epoch();
        let view = |content: String, metadata: MetadataRecord, source: Source| DocumentView {
            title: codec::basename(&path).to_string(),
            path: path.clone(),
            content,
            metadata: metadata.with_defaults(now),
            version,
            source,
        };

        if let Some(v) = version {
            let revision = Revision::from_version(version);
            if !self.user.pages.has_revision(&key, revision) {
                return Err(PikiError::NotFound(format!("{} (version {})", path, v)));
            }
            let content = self.user.pages.read(&key, revision)?;
            return Ok(view(content, self.user.meta.load(&key, revision), Source::User));
        }

        if self.user.pages.exists(&key) {
            let content = self.user.pages.read(&key, Revision::Live)?;
            return Ok(view(content, self.user.meta.load(&key, Revision::Live), Source::User));
        }

        let system_key = codec::encode(codec::basename(&path))?;
        if self.system.pages.exists(&system_key) {
            debug!(system = %system_key, "Falling back to system page");
            let content = self.system.pages.read(&system_key, Revision::Live)?;
            let metadata = self.system.meta.load(&system_key, Revision::Live);
            return Ok(view(content, metadata, Source::SystemDefault));
        }

        if path == self.startpage {
            return Ok(view(
                STARTPAGE_TEXT.to_string(),
                MetadataRecord::default(),
                Source::BuiltinStartpage,
            ));
        }

        Ok(view(String::new(), MetadataRecord::default(), Source::Missing))
    }

    /// Saves `content` and `tags`. Returns `false` when both are equivalent to what is
    /// stored, in which case nothing is written and no snapshot is taken.
    ///
    /// `tags: None` keeps whatever tags the page has at the time the lock is taken;
    /// `Some("")` clears them.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub fn update(
        &self,
        path: &str,
        content: &str,
        tags: Option<&str>,
        user: Option<&str>,
    ) -> Result<bool> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let slot = self.locks.slot(&key);
        let _guard = slot.lock();

        let exists = self.user.pages.exists(&key);
        let current = self.user.pages.read(&key, Revision::Live)?;
        let content_changed = !exists || !content_equivalent(&current, content);
        let tags_changed = tags.is_some_and(|tags| self.user.meta.update_required(&key, tags));
        if !content_changed && !tags_changed {
            debug!("Nothing changed");
            return Ok(false);
        }

        self.history.snapshot(&key)?;
        if content_changed {
            self.user.pages.write(&key, Revision::Live, content)?;
        }
        let tags = tags.filter(|_| tags_changed);
        let written = self.user.meta.update(&key, Revision::Live, user, tags)?;
        if !written {
            self.user.meta.touch(&key, user)?;
        }
        self.reindex(&path, &key)?;

        info!(content_changed, tags_changed, "Page saved");
        Ok(true)
    }

    /// Moves a page with its history. Returns the normalized new path.
    #[instrument(skip(self))]
    pub fn rename(&self, path: &str, new_path: &str, user: Option<&str>) -> Result<String> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let target = codec::normalize(new_path);
        let target_key = codec::encode(&target)?;
        if key == target_key {
            return Err(PikiError::Unchanged(path));
        }

        let [first, second] = self.locks.ordered(&key, &target_key);
        let _first = first.lock();
        let _second = second.lock();

        if !self.user.pages.exists(&key) {
            return Err(PikiError::NotFound(path));
        }
        if self.user.pages.occupied(&target_key) {
            return Err(PikiError::PathCollision(target));
        }

        self.history.snapshot(&key)?;
        self.index.remove(&path)?;
        let moved = match self.user.pages.rename(&key, &target) {
            Ok(moved) => moved,
            Err(e) => {
                if let Err(reindex) = self.reindex(&path, &key) {
                    warn!(error = %reindex, "Could not restore index entry after failed move");
                }
                return Err(e);
            }
        };
        // The files have moved; from here on the index follows the new key.
        let finished = self
            .user
            .meta
            .touch(&moved, user)
            .and_then(|()| self.reindex(&target, &moved));
        if let Err(e) = finished {
            if let Err(reindex) = self.reindex(&target, &moved) {
                warn!(error = %reindex, "Could not index moved page");
            }
            return Err(e);
        }

        info!(to = %target, "Page renamed");
        Ok(target)
    }

    /// Snapshots the page, then removes its live files and its index entry.
    #[instrument(skip(self))]
    pub fn delete(&self, path: &str) -> Result<()> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let slot = self.locks.slot(&key);
        let _guard = slot.lock();

        if !self.user.pages.exists(&key) {
            return Err(PikiError::NotFound(path));
        }
        self.history.snapshot(&key)?;
        self.user.pages.delete(&key)?;
        self.index.remove(&path)?;

        info!("Page deleted");
        Ok(())
    }

    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        self.index.search(query)
    }

    /// Stored versions, newest first, each compared with the state that followed it.
    pub fn history(&self, path: &str) -> Result<Vec<HistorySummary>> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let mut newer_content = self.user.pages.read(&key, Revision::Live)?;
        let mut newer_tags = self.user.meta.load(&key, Revision::Live).tags_or_empty();

        let mut summaries = Vec::new();
        for entry in self.history.entries(&key)?.into_iter().rev() {
            let revision = Revision::History(entry.version);
            let content = self.user.pages.read(&key, revision)?;
            let tags = entry.metadata.tags_or_empty();
            summaries.push(HistorySummary {
                version: entry.version,
                modified_time: entry.metadata.modified_time,
                modified_user: entry.metadata.modified_user.clone(),
                content_changed: !content_equivalent(&content, &newer_content),
                tags_changed: tags != newer_tags,
            });
            newer_content = content;
            newer_tags = tags;
        }
        Ok(summaries)
    }

    /// Unified line diff from history `version` to the live page. Empty when nothing
    /// differs; a deleted page diffs against empty content.
    #[instrument(skip(self))]
    pub fn diff(&self, path: &str, version: u32) -> Result<String> {
        let path = codec::normalize(path);
        let key = codec::encode(&path)?;
        let revision = Revision::History(version);
        let slot = self.locks.slot(&key);
        let _guard = slot.lock();

        if !self.user.pages.has_revision(&key, revision) {
            return Err(PikiError::NotFound(format!("{} (version {})", path, version)));
        }
        let old = self.user.pages.read(&key, revision)?.replace("\r\n", "\n");
        let new = self.user.pages.read(&key, Revision::Live)?.replace("\r\n", "\n");
        if content_equivalent(&old, &new) {
            return Ok(String::new());
        }

        let old_label = format!("{} (version {})", path, version);
        let new_label = format!("{} (current)", path);
        Ok(TextDiff::from_lines(&old, &new)
            .unified_diff()
            .context_radius(3)
            .header(&old_label, &new_label)
            .to_string())
    }

    /// Available pages strictly below `prefix` (all pages for an empty prefix), at most
    /// `depth` levels deep.
    pub fn list_pages(&self, prefix: &str, depth: Option<usize>) -> Result<Vec<String>> {
        let paths = self.live_paths()?;
        Ok(crate::tree::below(&paths, &codec::normalize(prefix), depth))
    }

    pub fn live_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .user
            .pages
            .live_keys()?
            .iter()
            .map(StorageKey::logical_path)
            .collect())
    }

    /// Reindexes every available page from disk.
    #[instrument(skip(self))]
    pub fn rebuild_index(&self) -> Result<usize> {
        let now = now_epoch();
        let mut docs = Vec::new();
        for key in self.user.pages.live_keys()? {
            let path = key.logical_path();
            let content = self.user.pages.read(&key, Revision::Live)?;
            let metadata = self.user.meta.load(&key, Revision::Live).with_defaults(now);
            docs.push(SearchDocument::new(
                &path,
                codec::basename(&path),
                &content,
                &metadata,
            ));
        }
        self.index.rebuild(docs)
    }

    pub fn check(&self) -> Result<ConsistencyReport> {
        self.user.pages.check()
    }

    /// Fixes what [`check`](Self::check) finds, then rebuilds the index.
    #[instrument(skip(self))]
    pub fn repair(&self) -> Result<RepairReport> {
        let report = self.user.pages.check()?;
        let mut repaired = RepairReport::default();

        for path in &report.missing_metadata {
            let key = codec::encode(path)?;
            let slot = self.locks.slot(&key);
            let _guard = slot.lock();
            self.user.meta.touch(&key, None)?;
            warn!(%path, "Created missing metadata");
            repaired.metadata_created.push(path.clone());
        }
        for path in &report.orphaned_metadata {
            let key = codec::encode(path)?;
            let slot = self.locks.slot(&key);
            let _guard = slot.lock();
            if !self.user.pages.exists(&key) {
                self.user.meta.delete(&key)?;
                warn!(%path, "Removed metadata without content");
                repaired.metadata_removed.push(path.clone());
            }
        }
        for entry in &report.foreign_entries {
            warn!(entry = %entry.display(), "Left foreign entry untouched");
        }

        repaired.indexed = self.rebuild_index()?;
        Ok(repaired)
    }

    /// Writes the bundled system pages. Returns how many were created or changed.
    #[instrument(skip(self))]
    pub fn install_system_pages(&self) -> Result<usize> {
        let mut written = 0;
        for (name, content) in SYSTEM_PAGES {
            let key = codec::encode(name)?;
            let current = self.system.pages.read(&key, Revision::Live)?;
            if self.system.pages.exists(&key) && content_equivalent(&current, content) {
                continue;
            }
            self.system.pages.write(&key, Revision::Live, content)?;
            self.system.meta.touch(&key, None)?;
            info!(page = name, "System page installed");
            written += 1;
        }
        Ok(written)
    }

    fn reindex(&self, path: &str, key: &StorageKey) -> Result<()> {
        let content = self.user.pages.read(key, Revision::Live)?;
        let metadata = self
            .user
            .meta
            .load(key, Revision::Live)
            .with_defaults(now_epoch());
        self.index.upsert(&SearchDocument::new(
            path,
            codec::basename(path),
            &content,
            &metadata,
        ))
    }
}
