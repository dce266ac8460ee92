use thiserror::Error;

/// Failure of a nested edit made through a [`Draft`](crate::Draft).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("path is empty")]
    EmptyPath,
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("path does not point into an object or array: {0}")]
    NotAContainer(String),
    #[error("invalid array index in path: {0}")]
    InvalidIndex(String),
}

/// Failure to read model props from serialized configuration.
#[derive(Debug, Error)]
pub enum PropsError {
    #[error("props are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("props must be a JSON object")]
    NotAnObject,
}
