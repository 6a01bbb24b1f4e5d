use super::{atomic_write, reject_history, Layout};
use crate::codec::StorageKey;
use crate::error::Result;
use crate::model::{normalize_tags, now_epoch, MetadataRecord, Revision};
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, instrument, warn};

/// Reads and writes the `meta.json` sidecar of a page.
///
/// Metadata problems never block access to content: a missing or unreadable sidecar
/// loads as an empty record.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    layout: Layout,
}

impl MetadataStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn exists(&self, key: &StorageKey) -> bool {
        self.layout.meta_path(key, Revision::Live).is_file()
    }

    pub fn load(&self, key: &StorageKey, revision: Revision) -> MetadataRecord {
        let path = self.layout.meta_path(key, revision);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No metadata sidecar");
                return MetadataRecord::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable metadata sidecar");
                return MetadataRecord::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Malformed metadata sidecar, using defaults");
            MetadataRecord::default()
        })
    }

    pub(crate) fn save(&self, key: &StorageKey, record: &MetadataRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record)?;
        atomic_write(
            &self.layout.meta_path(key, Revision::Live),
            content.as_bytes(),
        )
    }

    /// True iff `tags` differs from the stored tags, ignoring whitespace differences.
    pub fn update_required(&self, key: &StorageKey, tags: &str) -> bool {
        self.load(key, Revision::Live).tags_or_empty() != normalize_tags(tags)
    }

    /// Records a modification by `user` and/or new `tags`.
    ///
    /// `tags: Some("")` clears the tags, `None` leaves them alone. Returns `false`
    /// without touching the disk when there is neither a user nor tags.
    #[instrument(skip(self), fields(key = %key))]
    pub fn update(
        &self,
        key: &StorageKey,
        revision: Revision,
        user: Option<&str>,
        tags: Option<&str>,
    ) -> Result<bool> {
        reject_history(key, revision)?;
        let user = user.filter(|u| !u.is_empty());
        if user.is_none() && tags.is_none() {
            return Ok(false);
        }

        let mut record = self.load(key, Revision::Live);
        apply_modification(&mut record, user);
        if let Some(tags) = tags {
            let tags = normalize_tags(tags);
            record.tags = if tags.is_empty() { None } else { Some(tags) };
        }
        self.save(key, &record)?;
        debug!(tags = ?record.tags, "Metadata updated");
        Ok(true)
    }

    /// Refreshes the modification time unconditionally, e.g. after a content-only change.
    pub fn touch(&self, key: &StorageKey, user: Option<&str>) -> Result<()> {
        let mut record = self.load(key, Revision::Live);
        apply_modification(&mut record, user.filter(|u| !u.is_empty()));
        self.save(key, &record)
    }

    pub fn delete(&self, key: &StorageKey) -> Result<()> {
        fs::remove_file(self.layout.meta_path(key, Revision::Live))?;
        Ok(())
    }
}

fn apply_modification(record: &mut MetadataRecord, user: Option<&str>) {
    let now = now_epoch();
    record.fill_defaults(now);
    record.modified_time = Some(now);
    if let Some(user) = user {
        if record.creation_user.is_none() {
            record.creation_user = Some(user.to_string());
        }
        record.modified_user = Some(user.to_string());
    }
}
