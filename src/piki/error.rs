use thiserror::Error;

#[derive(Error, Debug)]
pub enum PikiError {
    #[error("Invalid page path '{0}': {1}")]
    InvalidPath(String, &'static str),

    #[error("Cannot move page to '{0}': target already exists")]
    PathCollision(String),

    #[error("History version {version} of '{path}' is read-only")]
    ImmutableVersion { path: String, version: u32 },

    #[error("Invalid search pattern '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Nothing changed for '{0}'")]
    Unchanged(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Search index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("Config error: {0}")]
    Config(String),
}

impl PikiError {
    /// True for the signal a caller should render as "no change" rather than a failure.
    pub fn is_no_change(&self) -> bool {
        matches!(self, PikiError::Unchanged(_))
    }
}

pub type Result<T> = std::result::Result<T, PikiError>;
