use crate::{
    error::PlanError,
    query::{
        dialect::QueryDialect,
        parsed::ParsedQuery,
        renderer::{Render, Renderer},
    },
};
use tracing::{debug, warn};

/// Number of array elements carried by each split request.
pub const SPLIT_CHUNK_SIZE: usize = 200;

/// Splits over-long URLs into several requests that together cover the
/// same query.
///
/// Only the largest array parameter is partitioned; every other parameter
/// is repeated unchanged in each request.
#[derive(Debug, Clone, Copy)]
pub struct RequestSplitter {
    max_length: usize,
}

impl RequestSplitter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn split(&self, url: &str) -> Result<Vec<String>, PlanError> {
        let length = url.len();
        if length <= self.max_length {
            return Ok(vec![url.to_string()]);
        }

        let max = self.max_length;
        let question_ix = url
            .find('?')
            .ok_or(PlanError::UrlTooLongWithoutQueryString { length, max })?;
        let (prefix, query) = (&url[..=question_ix], &url[question_ix + 1..]);

        let mut parsed = ParsedQuery::parse(query);
        let (key, values) = match parsed.largest_list() {
            Some((key, values)) => (key.to_string(), values.to_vec()),
            None => return Err(PlanError::UrlTooLongWithoutArrayParam { length, max }),
        };

        let dialect = QueryDialect::default();
        let mut urls = Vec::with_capacity(values.len().div_ceil(SPLIT_CHUNK_SIZE));
        for chunk in values.chunks(SPLIT_CHUNK_SIZE) {
            parsed.replace_list(&key, chunk.to_vec());

            let mut renderer = Renderer::new(&dialect);
            parsed.render(&mut renderer);
            let part = format!("{prefix}{}", renderer.finish());

            if part.len() > max {
                warn!(
                    length = part.len(),
                    max, "Split request is still longer than the URL limit"
                );
            }
            urls.push(part);
        }

        debug!(
            param = %key,
            values = values.len(),
            requests = urls.len(),
            "Split long URL"
        );
        Ok(urls)
    }
}

/// Splits `url` so that each request stays within `max_length` where the
/// dominant array parameter allows it.
pub fn split(url: &str, max_length: usize) -> Result<Vec<String>, PlanError> {
    RequestSplitter::new(max_length).split(url)
}
