//! Error types for leadflow-adapters

use leadflow_core::{ResearchError, TransformError};
use thiserror::Error;

/// Errors raised by the HTTP adapters.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A required environment variable is unset or blank
    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    /// Endpoint is not a valid URL
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response decoded but carried no text
    #[error("response contained no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        AdapterError::Http(err.to_string())
    }
}

impl From<AdapterError> for TransformError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Status { status, body } => TransformError::Rejected { status, body },
            AdapterError::EmptyResponse => TransformError::EmptyOutput,
            other => TransformError::Unavailable(other.to_string()),
        }
    }
}

/// Maps an enrichment failure for `company` onto the research taxonomy.
pub(crate) fn research_error(company: &str, err: AdapterError) -> ResearchError {
    match err {
        AdapterError::Status { status: 404, .. } => {
            ResearchError::UnknownCompany(company.to_string())
        }
        AdapterError::Json(e) => ResearchError::InvalidRecord(e.to_string()),
        other => ResearchError::Unavailable(other.to_string()),
    }
}
