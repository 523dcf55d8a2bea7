use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the API adapters.
///
/// The POI normalizer and diet aggregator never fail; everything here comes
/// from talking to an upstream service or from rejecting caller input before
/// a request is made.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send request to {service}: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned error status: {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },

    #[error("Failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} reported an error: {code}: {info}")]
    Upstream {
        service: &'static str,
        code: String,
        info: String,
    },

    #[error("{service}: {what} not found")]
    NotFound { service: &'static str, what: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
