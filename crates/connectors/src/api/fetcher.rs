use crate::{
    api::{auth::TokenProvider, transport::HttpTransport},
    error::ConnectorError,
};
use model::records::row::Row;
use planner::query::parsed::{ParsedParam, ParsedQuery};
use serde::Deserialize;
use tracing::{debug, info};

/// The two body shapes the API answers with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiResponse {
    Paginated { current_page: u64, data: Vec<Row> },
    Plain(Vec<Row>),
}

/// Fetches rows for a list of URLs, following server-side pagination.
///
/// Requests are issued strictly in sequence. Any failure aborts the whole
/// fetch; rows gathered before the failure are dropped.
pub struct PaginatedFetcher<'a> {
    transport: &'a mut dyn HttpTransport,
    tokens: &'a dyn TokenProvider,
    headers: &'a [(String, String)],
    max_per_page: usize,
    requests: usize,
}

impl<'a> PaginatedFetcher<'a> {
    pub fn new(
        transport: &'a mut dyn HttpTransport,
        tokens: &'a dyn TokenProvider,
        max_per_page: usize,
    ) -> Self {
        Self {
            transport,
            tokens,
            headers: &[],
            max_per_page: max_per_page.max(1),
            requests: 0,
        }
    }

    /// Static headers sent with every request, before `Authorization`.
    pub fn with_headers(mut self, headers: &'a [(String, String)]) -> Self {
        self.headers = headers;
        self
    }

    /// Number of HTTP requests issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn fetch(&mut self, urls: &[String]) -> Result<Vec<Row>, ConnectorError> {
        let mut rows = Vec::new();
        for url in urls {
            self.fetch_url(url, &mut rows)?;
        }

        info!(
            urls = urls.len(),
            requests = self.requests,
            rows = rows.len(),
            "Fetched rows"
        );
        Ok(rows)
    }

    fn fetch_url(&mut self, url: &str, rows: &mut Vec<Row>) -> Result<(), ConnectorError> {
        let (mut page, data) = match self.get_page(url)? {
            ApiResponse::Plain(data) => {
                rows.extend(data);
                return Ok(());
            }
            ApiResponse::Paginated { current_page, data } => (current_page, data),
        };

        let mut last_len = data.len();
        rows.extend(data);

        // An explicit page in the URL is the caller's choice; don't walk.
        if last_len < self.max_per_page || has_explicit_page(url) {
            return Ok(());
        }

        let separator = if url.contains('?') { '&' } else { '?' };
        while last_len >= self.max_per_page {
            page += 1;
            let next_url = format!("{url}{separator}page={page}");
            debug!(url = %next_url, page, "Fetching next page");

            match self.get_page(&next_url)? {
                ApiResponse::Paginated { data, .. } => {
                    last_len = data.len();
                    rows.extend(data);
                }
                ApiResponse::Plain(_) => {
                    return Err(ConnectorError::MalformedResponse {
                        url: next_url,
                        reason: "expected a paginated body for a follow-up page".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn get_page(&mut self, url: &str) -> Result<ApiResponse, ConnectorError> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or(ConnectorError::MissingToken)?;

        let mut headers = self.headers.to_vec();
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));

        self.requests += 1;
        let body = self
            .transport
            .get(url, &headers)
            .map_err(|source| ConnectorError::FetchFailed {
                url: url.to_string(),
                source,
            })?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ConnectorError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        ApiResponse::deserialize(json).map_err(|_| ConnectorError::MalformedResponse {
            url: url.to_string(),
            reason: "expected {\"current_page\", \"data\": [rows]} or a list of rows".to_string(),
        })
    }
}

/// Fetches every row reachable from `urls`.
pub fn fetch(
    urls: &[String],
    max_per_page: usize,
    transport: &mut dyn HttpTransport,
    tokens: &dyn TokenProvider,
) -> Result<Vec<Row>, ConnectorError> {
    PaginatedFetcher::new(transport, tokens, max_per_page).fetch(urls)
}

/// True when the URL already asks for a specific page (`page=<digits>`).
fn has_explicit_page(url: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    matches!(
        ParsedQuery::parse(query).get("page"),
        Some(ParsedParam::Scalar(v)) if v.starts_with(|c: char| c.is_ascii_digit())
    )
}
