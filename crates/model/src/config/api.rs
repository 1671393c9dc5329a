//! Configuration of one REST-backed connection.

use crate::{
    config::error::ConfigError,
    core::value::Value,
    query::params::ParamValue,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

pub const DEFAULT_MAX_URL_LENGTH: usize = 4000;

/// What the compiler does with `IS NULL` / `IS NOT NULL` filters, which the
/// remote API has no parameter for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullHandling {
    /// Drop the filter and log a warning.
    #[default]
    Ignore,
    /// Fail the query with `UnsupportedWhereType`.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the remote API; compiled paths are appended to it verbatim.
    pub base_url: String,

    /// Parameters every request starts from. Must contain `per_page`.
    /// Values may be scalars or lists.
    pub default_params: IndexMap<String, ParamValue>,

    /// Longest URL sent in one request. `0` falls back to the default.
    pub max_url_length: usize,

    /// Static headers, each formatted as `Name: value`.
    pub headers: Vec<String>,

    /// Timezone the remote API stores datetimes in.
    pub timezone: Option<String>,

    /// Row fields eligible for timezone conversion.
    pub datetime_keys: Vec<String>,

    pub pluralize_array_query_params: bool,
    pub pluralize_except: Vec<String>,

    /// Singular to plural parameter names used when pluralizing list
    /// parameters. Names missing from the table are sent unchanged.
    pub plural_keys: HashMap<String, String>,

    pub null_filters: NullHandling,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: String::new(),
            default_params: IndexMap::new(),
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            headers: Vec::new(),
            timezone: None,
            datetime_keys: Vec::new(),
            pluralize_array_query_params: false,
            pluralize_except: Vec::new(),
            plural_keys: HashMap::new(),
            null_filters: NullHandling::Ignore,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str, per_page: u64) -> Self {
        let mut default_params = IndexMap::new();
        default_params.insert("per_page".to_string(), ParamValue::Scalar(Value::Uint(per_page)));
        ApiConfig {
            base_url: base_url.to_string(),
            default_params,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks the invariants the read path relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.per_page()?;
        self.parsed_headers()?;
        Ok(())
    }

    /// The configured page size, which is also the largest page the
    /// server is expected to return.
    pub fn per_page(&self) -> Result<u64, ConfigError> {
        let value = self
            .default_params
            .get("per_page")
            .ok_or(ConfigError::MissingPerPage)?;

        match value.as_scalar().and_then(Value::as_u64) {
            Some(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidPerPage(value.to_string())),
        }
    }

    pub fn effective_max_url_length(&self) -> usize {
        if self.max_url_length == 0 {
            DEFAULT_MAX_URL_LENGTH
        } else {
            self.max_url_length
        }
    }

    /// Splits the static headers into `(name, value)` pairs.
    pub fn parsed_headers(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.headers
            .iter()
            .map(|raw| {
                let (name, value) = raw
                    .split_once(':')
                    .ok_or_else(|| ConfigError::InvalidHeader(raw.clone()))?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::InvalidHeader(raw.clone()));
                }
                Ok((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = Some(timezone.to_string());
        self
    }

    pub fn with_datetime_keys(mut self, keys: &[&str]) -> Self {
        self.datetime_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_default_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.default_params
            .insert(key.to_string(), ParamValue::Scalar(value.into()));
        self
    }

    pub fn with_default_list<V: Into<Value>>(
        mut self,
        key: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.default_params
            .insert(key.to_string(), ParamValue::List(values));
        self
    }

    pub fn with_max_url_length(mut self, max_url_length: usize) -> Self {
        self.max_url_length = max_url_length;
        self
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.headers.push(header.to_string());
        self
    }
}
