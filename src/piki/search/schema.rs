//! Tantivy schema of the page index.
//!
//! Only `id` is stored. Everything else is searchable but read back from the page store.

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED,
    STRING,
};

#[derive(Debug, Clone)]
pub struct IndexFields {
    pub id: Field,
    pub title: Field,
    pub page_src: Field,
    pub tag: Field,
    pub modified_user: Field,
    pub creation_time: Field,
    pub modified_time: Field,
}

/// How a query clause addresses a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Tokenized full text.
    Text(Field),
    /// Untokenized, matched verbatim.
    Exact(Field),
    /// Epoch seconds, queried with date values.
    Date(&'static str),
}

impl IndexFields {
    /// Resolves a `field:` prefix. Unknown names return `None` and the whole clause is
    /// then searched as text.
    pub fn resolve(&self, name: &str) -> Option<FieldKind> {
        match name {
            "id" => Some(FieldKind::Exact(self.id)),
            "title" => Some(FieldKind::Text(self.title)),
            "page_src" => Some(FieldKind::Text(self.page_src)),
            "tag" => Some(FieldKind::Text(self.tag)),
            "modified_user" => Some(FieldKind::Text(self.modified_user)),
            "creation_time" => Some(FieldKind::Date("creation_time")),
            "modified_time" => Some(FieldKind::Date("modified_time")),
            _ => None,
        }
    }

    /// Fields matched by a clause without a `field:` prefix.
    pub fn defaults(&self) -> [Field; 3] {
        [self.title, self.page_src, self.tag]
    }
}

pub fn build_schema() -> (Schema, IndexFields) {
    let mut builder = Schema::builder();

    // INDEXED is required for delete_term on upsert.
    let id = builder.add_text_field("id", STRING | STORED);

    // Positions are kept so quoted phrases work.
    let text = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    let title = builder.add_text_field("title", text.clone());
    let page_src = builder.add_text_field("page_src", text.clone());
    let tag = builder.add_text_field("tag", text.clone());
    let modified_user = builder.add_text_field("modified_user", text);

    let creation_time = builder.add_i64_field("creation_time", INDEXED | FAST);
    let modified_time = builder.add_i64_field("modified_time", INDEXED | FAST);

    let fields = IndexFields {
        id,
        title,
        page_src,
        tag,
        modified_user,
        creation_time,
        modified_time,
    };
    (builder.build(), fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fields_resolve_as_text() {
        let (_, fields) = build_schema();
        for name in ["title", "page_src", "tag"] {
            assert!(matches!(fields.resolve(name), Some(FieldKind::Text(_))));
        }
        assert_eq!(fields.defaults()[0], fields.title);
    }

    #[test]
    fn unknown_fields_do_not_resolve() {
        let (_, fields) = build_schema();
        assert!(fields.resolve("color").is_none());
        assert!(matches!(fields.resolve("id"), Some(FieldKind::Exact(_))));
        assert_eq!(
            fields.resolve("modified_time"),
            Some(FieldKind::Date("modified_time"))
        );
    }
}
