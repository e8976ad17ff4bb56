use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A retrieved record cannot be rendered because a templated field is absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record #{record} ({recipe}) is missing field `{field}`")]
pub struct MissingFieldError {
    pub record: usize,
    pub recipe: String,
    pub field: &'static str,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("cannot set up language model client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("language model at {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed language model response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    MissingField(#[from] MissingFieldError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported dataset format {0:?} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },

    #[error("{0}")]
    Rejected(String),
}
