use connectors::{ApiConnection, HttpTransport, StaticToken, TransportError};
use model::{config::api::ApiConfig, records::row::Row};
use planner::query::parsed::{ParsedParam, ParsedQuery};
use serde_json::{Value as JsonValue, json};
use std::{cmp::Ordering, collections::HashMap};

/// Root every test connection points at.
pub const BASE_URL: &str = "https://api.test/v1";

pub const TEST_TOKEN: &str = "test-token";

/// Parameters the fake API treats as paging or sorting controls rather than
/// row filters.
const CONTROL_PARAMS: [&str; 4] = ["per_page", "page", "order_by", "sort"];

/// In-memory stand-in for a paginated REST API.
///
/// Filters its rows by the query string the same way the real API would:
/// scalars are equality filters, lists are membership filters and
/// `min_`/`max_` prefixes are inclusive numeric bounds.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub rows: Vec<Row>,
    /// Every URL requested, in order.
    pub calls: Vec<String>,
    pub last_headers: Vec<(String, String)>,
    /// 1-based request number that answers `503`.
    pub fail_on_call: Option<usize>,
    /// Parameter name to row field, for pluralized list parameters.
    pub aliases: HashMap<String, String>,
}

impl FakeApi {
    pub fn new(rows: Vec<Row>) -> Self {
        FakeApi {
            rows,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn with_alias(mut self, param: &str, field: &str) -> Self {
        self.aliases.insert(param.to_string(), field.to_string());
        self
    }

    fn field<'a>(&'a self, param: &'a str) -> &'a str {
        self.aliases.get(param).map_or(param, String::as_str)
    }

    fn matches(&self, row: &Row, query: &ParsedQuery) -> bool {
        query.iter().all(|(key, param)| {
            if CONTROL_PARAMS.contains(&key) {
                return true;
            }

            if let Some(field) = key.strip_prefix("min_") {
                return compare(row.get(field), param) != Some(Ordering::Less);
            }
            if let Some(field) = key.strip_prefix("max_") {
                return compare(row.get(field), param) != Some(Ordering::Greater);
            }

            let Some(actual) = row.get(self.field(key)).map(as_param) else {
                return false;
            };
            match param {
                ParsedParam::Scalar(expected) => &actual == expected,
                ParsedParam::List { values, .. } => values.contains(&actual),
            }
        })
    }
}

impl HttpTransport for FakeApi {
    fn get(&mut self, url: &str, headers: &[(String, String)]) -> Result<String, TransportError> {
        self.calls.push(url.to_string());
        self.last_headers = headers.to_vec();

        if self.fail_on_call == Some(self.calls.len()) {
            return Err(TransportError::Status { code: 503 });
        }

        let query = ParsedQuery::parse(url.split_once('?').map_or("", |(_, q)| q));
        let per_page = scalar_u64(&query, "per_page").unwrap_or(100).max(1) as usize;
        let page = scalar_u64(&query, "page").unwrap_or(1).max(1) as usize;

        let mut matching: Vec<&Row> = self.rows.iter().filter(|row| self.matches(row, &query)).collect();

        if let Some(ParsedParam::Scalar(field)) = query.get("order_by") {
            matching.sort_by(|a, b| compare_json(a.get(field), b.get(field)));
            if matches!(query.get("sort"), Some(ParsedParam::Scalar(dir)) if dir == "desc") {
                matching.reverse();
            }
        }

        let data: Vec<&Row> = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Ok(json!({ "current_page": page, "data": data }).to_string())
    }
}

fn scalar_u64(query: &ParsedQuery, key: &str) -> Option<u64> {
    match query.get(key) {
        Some(ParsedParam::Scalar(v)) => v.parse().ok(),
        _ => None,
    }
}

/// Spells a row value the way it would appear in a query string.
fn as_param(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}

fn compare(actual: Option<&JsonValue>, bound: &ParsedParam) -> Option<Ordering> {
    let ParsedParam::Scalar(bound) = bound else {
        return None;
    };
    let actual = actual?.as_f64()?;
    actual.partial_cmp(&bound.parse::<f64>().ok()?)
}

fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a.and_then(JsonValue::as_f64), b.and_then(JsonValue::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.map(as_param).cmp(&b.map(as_param)),
    }
}

/// `count` posts with ids starting at `first_id`. Even ids are published.
pub fn posts(first_id: u64, count: u64) -> Vec<Row> {
    (first_id..first_id + count)
        .map(|id| {
            let status = if id % 2 == 0 { "published" } else { "draft" };
            row(json!({
                "id": id,
                "author_id": id % 5,
                "title": format!("Post {id}"),
                "status": status,
                "created_at": "2023-01-01 00:00:00",
            }))
        })
        .collect()
}

pub fn row(value: JsonValue) -> Row {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("row must be a JSON object, got {other}"),
    }
}

pub fn ids(rows: &[Row]) -> Vec<u64> {
    rows.iter()
        .map(|r| r["id"].as_u64().expect("row without numeric id"))
        .collect()
}

pub fn api_config(per_page: u64) -> ApiConfig {
    ApiConfig::new(BASE_URL, per_page)
}

pub fn connect(config: ApiConfig, api: FakeApi) -> ApiConnection<FakeApi, StaticToken> {
    ApiConnection::new(config, "UTC", api, StaticToken::new(TEST_TOKEN))
        .expect("test config should be valid")
}
