use crate::config::PikiConfig;
use crate::model::{DocumentView, HistorySummary};

pub mod config;
pub mod delete;
pub mod doctor;
pub mod get;
pub mod history;
pub mod init;
pub mod list;
pub mod reindex;
pub mod rename;
pub mod search;
pub mod update;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What a command produced. Front ends decide how to render it.
#[derive(Debug, Default)]
pub struct CmdResult {
    pub document: Option<DocumentView>,
    pub paths: Vec<String>,
    pub history: Vec<HistorySummary>,
    pub config: Option<PikiConfig>,
    /// Pre-rendered text, such as a page tree.
    pub text: Option<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_document(mut self, document: DocumentView) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_history(mut self, history: Vec<HistorySummary>) -> Self {
        self.history = history;
        self
    }

    pub fn with_config(mut self, config: PikiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::facade::DocumentFacade;
    use crate::search::SearchIndex;
    use tempfile::TempDir;

    pub struct Fixture {
        pub dir: TempDir,
        pub facade: DocumentFacade,
    }

    pub fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let index = SearchIndex::in_memory(20_000_000).unwrap();
        let facade = DocumentFacade::new(
            &dir.path().join("pages"),
            &dir.path().join("system-pages"),
            "startpage",
            index,
        );
        Fixture { dir, facade }
    }
}
