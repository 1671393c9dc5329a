use model::config::error::ConfigError;
use planner::PlanError;
use thiserror::Error;

/// Errors raised by the API read path.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A request failed; the whole read is abandoned.
    #[error("Failed to call {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The response body is not one of the accepted shapes.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("No bearer token available for the request")]
    MissingToken,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Query planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {code}")]
    Status { code: u16 },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
