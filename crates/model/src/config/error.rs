use thiserror::Error;

/// Problems with an API connection configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `default_params` has no `per_page` entry.
    #[error("default_params must contain 'per_page'")]
    MissingPerPage,

    #[error("default_params.per_page must be a positive integer, got {0}")]
    InvalidPerPage(String),

    /// A static header is not of the form `Name: value`.
    #[error("Invalid header '{0}': expected 'Name: value'")]
    InvalidHeader(String),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}
