use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("invalid assignment feed: {0}")]
    Format(String),
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record {index} is missing identifying field {field}")]
    MalformedRecord { index: usize, field: String },
    #[error("store error: {0}")]
    Store(String),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl From<serde_json::Error> for ViewerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Format(value.to_string())
    }
}

impl ViewerError {
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}
