//! # Search Index
//!
//! A tantivy index over all available pages, keyed by logical path (`id`).
//!
//! The index is derived data: it can always be rebuilt from the page store
//! (`piki reindex`), and a page's availability never depends on it.
//!
//! ## Writes
//!
//! There is at most one [`IndexWriter`] per index, guarded by a mutex. It is created on
//! the first write, so opening an index only to search never takes tantivy's writer
//! lockfile and any number of readers can run next to one writing process. Each upsert
//! or removal is delete-by-id, optional add, and one commit under that lock, so an entry
//! is never observed twice or half-replaced. After committing, the reader is reloaded
//! explicitly; searches see either the state before or after a commit.
//!
//! See [`query`] for the query language.

pub mod dates;
pub mod query;
pub mod schema;

use crate::error::Result;
use crate::model::MetadataRecord;
use chrono::Utc;
use parking_lot::Mutex;
use schema::IndexFields;
use std::fs;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, instrument};

/// Writer heap used when none is configured.
pub const DEFAULT_WRITER_HEAP: usize = 50_000_000;

/// Everything the index stores about one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    pub page_src: String,
    pub tags: String,
    pub modified_user: String,
    pub creation_time: i64,
    pub modified_time: i64,
}

impl SearchDocument {
    /// `metadata` should already have its defaults filled.
    pub fn new(path: &str, title: &str, content: &str, metadata: &MetadataRecord) -> Self {
        Self {
            id: path.to_string(),
            title: title.to_string(),
            page_src: content.to_string(),
            tags: metadata.tags_or_empty(),
            modified_user: metadata.modified_user.clone().unwrap_or_default(),
            creation_time: metadata.creation_time.unwrap_or_default(),
            modified_time: metadata.modified_time.unwrap_or_default(),
        }
    }
}

pub struct SearchIndex {
    index: Index,
    fields: IndexFields,
    reader: IndexReader,
    writer: Mutex<Option<IndexWriter>>,
    writer_heap: usize,
}

impl SearchIndex {
    /// Opens the index at `path`, creating it when the directory holds none yet.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path, writer_heap: usize) -> Result<Self> {
        let (schema, fields) = schema::build_schema();
        let index = if path.join("meta.json").exists() {
            Index::open_in_dir(path)?
        } else {
            fs::create_dir_all(path)?;
            info!("Creating search index");
            Index::create_in_dir(path, schema)?
        };
        Self::with_index(index, fields, writer_heap)
    }

    /// An index that lives only in memory.
    pub fn in_memory(writer_heap: usize) -> Result<Self> {
        let (schema, fields) = schema::build_schema();
        Self::with_index(Index::create_in_ram(schema), fields, writer_heap)
    }

    fn with_index(index: Index, fields: IndexFields, writer_heap: usize) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(Self {
            index,
            fields,
            reader,
            writer: Mutex::new(None),
            writer_heap,
        })
    }

    /// Runs `f` with the writer, acquiring it on first use, then reloads the reader.
    fn write<T>(&self, f: impl FnOnce(&mut IndexWriter) -> Result<T>) -> Result<T> {
        let out = {
            let mut slot = self.writer.lock();
            let writer = match &mut *slot {
                Some(writer) => writer,
                empty => {
                    debug!("Acquiring index writer");
                    empty.insert(self.index.writer(self.writer_heap)?)
                }
            };
            f(writer)?
        };
        self.reader.reload()?;
        Ok(out)
    }

    fn document(&self, doc: &SearchDocument) -> TantivyDocument {
        let f = &self.fields;
        doc!(
            f.id => doc.id.as_str(),
            f.title => doc.title.as_str(),
            f.page_src => doc.page_src.as_str(),
            f.tag => doc.tags.as_str(),
            f.modified_user => doc.modified_user.as_str(),
            f.creation_time => doc.creation_time,
            f.modified_time => doc.modified_time
        )
    }

    /// Replaces whatever is indexed under `doc.id`.
    #[instrument(skip(self, doc), fields(id = %doc.id))]
    pub fn upsert(&self, doc: &SearchDocument) -> Result<()> {
        self.write(|writer| {
            writer.delete_term(Term::from_field_text(self.fields.id, &doc.id));
            writer.add_document(self.document(doc))?;
            writer.commit()?;
            Ok(())
        })?;
        debug!("Index entry replaced");
        Ok(())
    }

    /// Drops the entry for `id`. Removing an id that was never indexed is fine.
    #[instrument(skip(self))]
    pub fn remove(&self, id: &str) -> Result<()> {
        self.write(|writer| {
            writer.delete_term(Term::from_field_text(self.fields.id, id));
            writer.commit()?;
            Ok(())
        })?;
        debug!("Index entry removed");
        Ok(())
    }

    /// Clears the index and adds `docs` in a single commit.
    #[instrument(skip(self, docs))]
    pub fn rebuild<I>(&self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = SearchDocument>,
    {
        let count = self.write(|writer| {
            writer.delete_all_documents()?;
            let mut count = 0;
            for doc in docs {
                writer.add_document(self.document(&doc))?;
                count += 1;
            }
            writer.commit()?;
            Ok(count)
        })?;
        info!(count, "Search index rebuilt");
        Ok(count)
    }

    /// Number of indexed pages.
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all matching pages, best match first.
    ///
    /// A blank query matches nothing. A query that does not parse is an
    /// [`InvalidQuery`](crate::error::PikiError::InvalidQuery) error, never an empty list.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        let Some(expr) = query::parse(query)? else {
            return Ok(Vec::new());
        };
        let compiled = query::Compiler {
            index: &self.index,
            fields: &self.fields,
            query,
            now: Utc::now(),
        }
        .compile(&expr)?;

        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);
        let hits = searcher.search(&compiled, &TopDocs::with_limit(limit))?;

        let mut ids = Vec::with_capacity(hits.len());
        for (_score, address) in hits {
            let doc = searcher.doc::<TantivyDocument>(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }
        debug!(hits = ids.len(), "Search finished");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PikiError;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const HEAP: usize = 20_000_000;

    fn page(id: &str, content: &str, tags: &str, modified: i64) -> SearchDocument {
        SearchDocument {
            id: id.to_string(),
            title: crate::codec::basename(id).to_string(),
            page_src: content.to_string(),
            tags: tags.to_string(),
            modified_user: "alice".to_string(),
            creation_time: modified,
            modified_time: modified,
        }
    }

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp()
    }

    fn sample() -> SearchIndex {
        let index = SearchIndex::in_memory(HEAP).unwrap();
        index
            .rebuild(vec![
                page("docs/intro", "Welcome to the wiki", "intro howto", ts(2023, 5, 1)),
                page("docs/setup", "Install on linux and windows", "howto", ts(2024, 1, 10)),
                page("notes/linux", "Kernel notes for linux", "", ts(2024, 3, 1)),
            ])
            .unwrap();
        index
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[test]
    fn blank_query_matches_nothing() {
        let index = sample();
        assert!(index.search("").unwrap().is_empty());
        assert!(index.search("   ").unwrap().is_empty());
    }

    #[test]
    fn invalid_query_is_an_error() {
        let index = sample();
        assert!(matches!(
            index.search("(linux"),
            Err(PikiError::InvalidQuery { .. })
        ));
        assert!(matches!(
            index.search("modified_time:soon"),
            Err(PikiError::InvalidQuery { .. })
        ));
        assert!(matches!(
            index.search("title:>abc"),
            Err(PikiError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn unqualified_terms_search_title_content_and_tags() {
        let index = sample();
        assert_eq!(
            sorted(index.search("linux").unwrap()),
            vec!["docs/setup", "notes/linux"]
        );
        assert_eq!(index.search("intro").unwrap(), vec!["docs/intro"]);
        assert_eq!(
            sorted(index.search("howto").unwrap()),
            vec!["docs/intro", "docs/setup"]
        );
    }

    #[test]
    fn boolean_operators() {
        let index = sample();
        assert_eq!(index.search("linux windows").unwrap(), vec!["docs/setup"]);
        assert_eq!(index.search("linux -windows").unwrap(), vec!["notes/linux"]);
        assert_eq!(index.search("linux NOT windows").unwrap(), vec!["notes/linux"]);
        assert_eq!(
            sorted(index.search("welcome OR kernel").unwrap()),
            vec!["docs/intro", "notes/linux"]
        );
        assert_eq!(
            sorted(index.search("-linux").unwrap()),
            vec!["docs/intro"]
        );
    }

    #[test]
    fn fields_phrases_and_wildcards() {
        let index = sample();
        assert_eq!(index.search("tag:intro").unwrap(), vec!["docs/intro"]);
        assert!(index.search("title:welcome").unwrap().is_empty());
        assert_eq!(index.search("\"kernel notes\"").unwrap(), vec!["notes/linux"]);
        assert!(index.search("\"notes kernel\"").unwrap().is_empty());
        assert_eq!(index.search("wel*").unwrap(), vec!["docs/intro"]);
        assert_eq!(index.search("se?up").unwrap(), vec!["docs/setup"]);
        assert_eq!(index.search("id:docs/*").unwrap().len(), 2);
        assert_eq!(index.search("modified_user:alice").unwrap().len(), 3);
    }

    #[test]
    fn unknown_field_prefix_is_text() {
        let index = sample();
        index
            .upsert(&page("todo", "note:buy milk", "", ts(2024, 1, 1)))
            .unwrap();
        assert_eq!(index.search("note:buy").unwrap(), vec!["todo"]);
    }

    #[test]
    fn date_clauses() {
        let index = sample();
        assert_eq!(
            sorted(index.search("modified_time:2024").unwrap()),
            vec!["docs/setup", "notes/linux"]
        );
        assert_eq!(index.search("modified_time:2024-03").unwrap(), vec!["notes/linux"]);
        assert_eq!(index.search("creation_time:2023-05-01").unwrap(), vec!["docs/intro"]);
        assert_eq!(
            index.search("modified_time:[2023-06 TO 2024-01-31]").unwrap(),
            vec!["docs/setup"]
        );
        assert_eq!(
            sorted(index.search("modified_time:[* TO 2024-01-10]").unwrap()),
            vec!["docs/intro", "docs/setup"]
        );
        assert_eq!(
            index.search("modified_time:{2023 TO *]").unwrap().len(),
            2
        );
        assert_eq!(index.search("modified_time:>2024-01-10").unwrap(), vec!["notes/linux"]);
        assert_eq!(
            index.search("modified_time:<=2023").unwrap(),
            vec!["docs/intro"]
        );
        assert!(index.search("modified_time:-7d").unwrap().is_empty());
    }

    #[test]
    fn relative_dates_are_measured_from_now() {
        let index = SearchIndex::in_memory(HEAP).unwrap();
        let now = Utc::now().timestamp();
        index.upsert(&page("fresh", "x", "", now - 3600)).unwrap();
        index.upsert(&page("stale", "x", "", now - 30 * 86_400)).unwrap();
        assert_eq!(index.search("modified_time:-1d").unwrap(), vec!["fresh"]);
        assert_eq!(
            sorted(index.search("modified_time:-2mo").unwrap()),
            vec!["fresh", "stale"]
        );
        assert_eq!(index.search("modified_time:<-7d").unwrap(), vec!["stale"]);
        assert!(index.search("modified_time:+1d").unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_and_remove_drops() {
        let index = sample();
        index
            .upsert(&page("docs/intro", "Completely different", "", ts(2024, 1, 1)))
            .unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.search("welcome").unwrap().is_empty());
        assert_eq!(index.search("different").unwrap(), vec!["docs/intro"]);

        index.remove("docs/intro").unwrap();
        index.remove("never/indexed").unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.search("different").unwrap().is_empty());
    }

    #[test]
    fn rebuild_replaces_everything() {
        let index = sample();
        let count = index
            .rebuild(vec![page("only", "single page", "", ts(2024, 1, 1))])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(index.len(), 1);
        assert!(index.search("linux").unwrap().is_empty());
    }

    #[test]
    fn reopens_from_disk() {
        let dir = TempDir::new().unwrap();
        {
            let index = SearchIndex::open(dir.path(), HEAP).unwrap();
            index.upsert(&page("kept", "persistent words", "", ts(2024, 1, 1))).unwrap();
        }
        let index = SearchIndex::open(dir.path(), HEAP).unwrap();
        assert_eq!(index.search("persistent").unwrap(), vec!["kept"]);
    }

    #[test]
    fn readers_open_next_to_a_writer() {
        let dir = TempDir::new().unwrap();
        let writing = SearchIndex::open(dir.path(), HEAP).unwrap();
        writing.upsert(&page("kept", "persistent words", "", ts(2024, 1, 1))).unwrap();

        let reading = SearchIndex::open(dir.path(), HEAP).unwrap();
        assert_eq!(reading.search("persistent").unwrap(), vec!["kept"]);
        assert_eq!(reading.len(), 1);

        // Only one process may write at a time.
        assert!(matches!(reading.remove("kept"), Err(PikiError::Index(_))));
        drop(writing);
        reading.remove("kept").unwrap();
        assert!(reading.is_empty());
    }

    #[test]
    fn deeply_nested_query_is_invalid() {
        let index = sample();
        assert!(matches!(
            index.search(&"(".repeat(10_000)),
            Err(PikiError::InvalidQuery { .. })
        ));
        let negations = format!("{}linux", "-".repeat(5_000));
        assert_eq!(index.search(&negations).unwrap().len(), 2);
    }

    #[test]
    fn document_from_metadata() {
        let meta = MetadataRecord {
            creation_time: Some(1),
            modified_time: Some(2),
            modified_user: Some("bob".into()),
            tags: Some(" a  b ".into()),
            ..Default::default()
        };
        let doc = SearchDocument::new("x/y", "y", "body", &meta);
        assert_eq!(doc.tags, "a b");
        assert_eq!(doc.modified_user, "bob");
        assert_eq!((doc.creation_time, doc.modified_time), (1, 2));
    }
}
