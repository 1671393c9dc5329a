use crate::{
    api::{
        auth::TokenProvider,
        fetcher::PaginatedFetcher,
        timezone::normalize_timezones,
        transport::{HttpTransport, ReqwestTransport},
    },
    error::ConnectorError,
};
use model::{config::api::ApiConfig, query::descriptor::QueryDescriptor, records::row::Row};
use planner::query::{
    compiler::QueryCompiler,
    dialect::{Pluralize, QueryDialect},
    splitter::RequestSplitter,
};
use std::sync::Arc;
use tracing::info;

/// A read-only connection to a paginated REST API that answers relational
/// queries.
///
/// The connection owns its transport, so one connection serves one read at
/// a time; `select` takes `&mut self`.
pub struct ApiConnection<T: HttpTransport, P: TokenProvider> {
    config: ApiConfig,
    app_timezone: String,
    dialect: QueryDialect,
    headers: Vec<(String, String)>,
    per_page: u64,
    transport: T,
    tokens: P,
}

impl<P: TokenProvider> ApiConnection<ReqwestTransport, P> {
    /// Opens a connection over a default `reqwest` transport.
    pub fn connect(config: ApiConfig, app_timezone: &str, tokens: P) -> Result<Self, ConnectorError> {
        let transport = ReqwestTransport::new()?;
        Self::new(config, app_timezone, transport, tokens)
    }
}

impl<T: HttpTransport, P: TokenProvider> ApiConnection<T, P> {
    pub fn new(
        config: ApiConfig,
        app_timezone: &str,
        transport: T,
        tokens: P,
    ) -> Result<Self, ConnectorError> {
        config.validate()?;
        let per_page = config.per_page()?;
        let headers = config.parsed_headers()?;
        let dialect = QueryDialect::from_config(&config);

        Ok(ApiConnection {
            config,
            app_timezone: app_timezone.to_string(),
            dialect,
            headers,
            per_page,
            transport,
            tokens,
        })
    }

    /// Replaces the singular-to-plural lookup used for list parameters.
    pub fn with_pluralizer(mut self, plurals: Arc<dyn Pluralize>) -> Self {
        self.dialect = self.dialect.with_pluralizer(plurals);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Compiles `query` into a path relative to the API root.
    pub fn compile(&self, query: &QueryDescriptor) -> Result<String, ConnectorError> {
        let path = QueryCompiler::new(&self.config, &self.dialect).compile(query)?;
        Ok(path)
    }

    /// Turns a compiled path into the absolute URLs to request, splitting
    /// when the full URL is over the configured length.
    pub fn request_urls(&self, path: &str) -> Result<Vec<String>, ConnectorError> {
        let full_url = format!("{}{}", self.config.base_url, path);
        let splitter = RequestSplitter::new(self.config.effective_max_url_length());
        Ok(splitter.split(&full_url)?)
    }

    pub fn select(&mut self, query: &QueryDescriptor) -> Result<Vec<Row>, ConnectorError> {
        let path = self.compile(query)?;
        self.select_path(&path)
    }

    /// Runs an already compiled path. An empty path yields no rows and
    /// sends no request.
    pub fn select_path(&mut self, path: &str) -> Result<Vec<Row>, ConnectorError> {
        if path.is_empty() {
            return Ok(Vec::new());
        }

        let urls = self.request_urls(path)?;

        let mut fetcher =
            PaginatedFetcher::new(&mut self.transport, &self.tokens, self.per_page as usize)
                .with_headers(&self.headers);
        let mut rows = fetcher.fetch(&urls)?;
        let requests = fetcher.requests();

        let converted = normalize_timezones(
            &mut rows,
            self.config.timezone.as_deref(),
            &self.app_timezone,
            &self.config.datetime_keys,
        )?;

        info!(
            path,
            urls = urls.len(),
            requests,
            rows = rows.len(),
            converted,
            "Query completed"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::auth::StaticToken, error::TransportError};
    use model::{config::error::ConfigError, query::descriptor::OrderDir};
    use serde_json::json;
    use std::collections::HashMap;

    type Handler = fn(&str, &[(String, String)]) -> Result<String, TransportError>;

    fn no_requests(url: &str, _: &[(String, String)]) -> Result<String, TransportError> {
        Err(TransportError::Other(format!("unexpected request to {url}")))
    }

    fn one_row(_: &str, _: &[(String, String)]) -> Result<String, TransportError> {
        Ok(json!({ "current_page": 1, "data": [{ "id": 1, "created_at": "2023-01-01 00:00:00" }] })
            .to_string())
    }

    fn config() -> ApiConfig {
        ApiConfig::new("https://api.example.com/v1", 100)
            .with_timezone("UTC")
            .with_datetime_keys(&["created_at"])
    }

    #[test]
    fn test_new_validates_config() {
        let err = ApiConnection::new(
            ApiConfig::default(),
            "UTC",
            no_requests as Handler,
            StaticToken::new("t"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConnectorError::Config(ConfigError::MissingPerPage)));
    }

    #[test]
    fn test_empty_path_sends_nothing() {
        let mut conn =
            ApiConnection::new(config(), "UTC", no_requests as Handler, StaticToken::new("t")).unwrap();
        assert!(conn.select_path("").unwrap().is_empty());
    }

    #[test]
    fn test_request_urls_prefix_base_url() {
        let conn =
            ApiConnection::new(config(), "UTC", no_requests as Handler, StaticToken::new("t")).unwrap();
        let query = QueryDescriptor::builder("posts")
            .where_eq("author_id", 3)
            .order_by("id", OrderDir::Desc)
            .build();

        let path = conn.compile(&query).unwrap();
        assert_eq!(path, "/posts?per_page=100&author_id=3&order_by=id&sort=desc");
        assert_eq!(
            conn.request_urls(&path).unwrap(),
            vec!["https://api.example.com/v1/posts?per_page=100&author_id=3&order_by=id&sort=desc"]
        );
    }

    #[test]
    fn test_select_normalizes_timezones() {
        let mut conn =
            ApiConnection::new(config(), "+02:00", one_row as Handler, StaticToken::new("t")).unwrap();
        let rows = conn.select(&QueryDescriptor::builder("posts").build()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["created_at"], "2023-01-01 02:00:00");
    }

    #[test]
    fn test_custom_pluralizer_applies_to_compile() {
        struct Upper;
        impl Pluralize for Upper {
            fn plural<'a>(&'a self, key: &'a str) -> std::borrow::Cow<'a, str> {
                std::borrow::Cow::Owned(key.to_uppercase())
            }
        }

        let mut config = config();
        config.pluralize_array_query_params = true;
        config.plural_keys = HashMap::new();

        let conn = ApiConnection::new(config, "UTC", no_requests as Handler, StaticToken::new("t"))
            .unwrap()
            .with_pluralizer(Arc::new(Upper));
        let path = conn
            .compile(&QueryDescriptor::builder("posts").where_in("id", [1, 2]).build())
            .unwrap();
        assert_eq!(path, "/posts?per_page=100&ID=1,2");
    }
}
