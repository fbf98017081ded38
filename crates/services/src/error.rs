//! Shared error types for the services crate.

use thiserror::Error;

use trivia_core::model::FiltersError;

/// Errors emitted while talking to the question service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("question service returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question service returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no questions match the current filters")]
    NoQuestions,
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while reading client configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url {raw}: {source}")]
    InvalidBaseUrl {
        raw: String,
        source: url::ParseError,
    },
    #[error("base url must be http or https: {0}")]
    UnsupportedScheme(String),
    #[error("invalid batch size: {0}")]
    InvalidBatchSize(String),
    #[error("invalid timeout seconds: {0}")]
    InvalidTimeout(String),
    #[error(transparent)]
    Filters(#[from] FiltersError),
}
