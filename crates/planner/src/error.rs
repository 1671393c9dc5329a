use model::config::error::ConfigError;
use thiserror::Error;

/// Errors raised while turning a query into request URLs.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unsupported query where operator {0}")]
    UnsupportedWhereOperator(String),

    #[error("Unsupported query where type {kind} on column '{column}'")]
    UnsupportedWhereType { kind: &'static str, column: String },

    #[error("API query does not support multiple orders")]
    MultipleOrdersUnsupported,

    #[error("Query limit {limit} should be less than {per_page}")]
    LimitExceedsPageSize { limit: u64, per_page: u64 },

    /// The URL is over the length limit and there is nothing to split.
    #[error("URL is {length} bytes (max {max}) and has no query string")]
    UrlTooLongWithoutQueryString { length: usize, max: usize },

    #[error("URL is {length} bytes (max {max}) and has no array parameter to split")]
    UrlTooLongWithoutArrayParam { length: usize, max: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
