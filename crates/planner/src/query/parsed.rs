//! A query string parsed back into ordered parameters.

use crate::query::dialect::ListStyle;
use indexmap::{IndexMap, map::Entry};
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedParam {
    Scalar(String),
    List { values: Vec<String>, style: ListStyle },
}

/// Decoded parameters of a query string, in first-seen order.
///
/// `k[]=a&k[]=b` (or `k[0]=a`) parses as a bracket list and a raw value
/// holding a literal `,` parses as a joined list. Each list remembers its
/// spelling so it renders back the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    params: IndexMap<String, ParsedParam>,
}

impl ParsedQuery {
    pub fn parse(query: &str) -> Self {
        let mut params: IndexMap<String, ParsedParam> = IndexMap::new();

        for raw_pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = raw_pair.split_once('=').unwrap_or((raw_pair, ""));
            let key = decode(raw_key);

            if let Some(base) = list_base(&key) {
                let value = decode(raw_value);
                match params.entry(base.to_string()) {
                    Entry::Occupied(mut e) => match e.get_mut() {
                        ParsedParam::List { values, .. } => values.push(value),
                        scalar => {
                            *scalar = ParsedParam::List {
                                values: vec![value],
                                style: ListStyle::Brackets,
                            }
                        }
                    },
                    Entry::Vacant(e) => {
                        e.insert(ParsedParam::List {
                            values: vec![value],
                            style: ListStyle::Brackets,
                        });
                    }
                }
            } else if raw_value.contains(',') {
                let values = raw_value.split(',').map(decode).collect();
                params.insert(
                    key,
                    ParsedParam::List {
                        values,
                        style: ListStyle::Joined,
                    },
                );
            } else {
                params.insert(key, ParsedParam::Scalar(decode(raw_value)));
            }
        }

        ParsedQuery { params }
    }

    pub fn get(&self, key: &str) -> Option<&ParsedParam> {
        self.params.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedParam)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The list parameter with the most elements. Ties go to the one seen
    /// first; empty lists are never chosen.
    pub fn largest_list(&self) -> Option<(&str, &[String])> {
        let mut best: Option<(&str, &[String])> = None;
        for (key, param) in &self.params {
            if let ParsedParam::List { values, .. } = param {
                let current = best.map_or(0, |(_, v)| v.len());
                if values.len() > current {
                    best = Some((key.as_str(), values.as_slice()));
                }
            }
        }
        best
    }

    /// Replaces the elements of an existing list parameter, keeping its
    /// position and spelling. Returns `false` if `key` is not a list.
    pub fn replace_list(&mut self, key: &str, new_values: Vec<String>) -> bool {
        match self.params.get_mut(key) {
            Some(ParsedParam::List { values, .. }) => {
                *values = new_values;
                true
            }
            _ => false,
        }
    }
}

/// Returns the base name of a bracket-list key: `k[]` or `k[<digits>]`.
fn list_base(key: &str) -> Option<&str> {
    let inner = key.strip_suffix(']')?;
    let (base, index) = inner.rsplit_once('[')?;
    if base.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(base)
}

/// Percent-decodes one query-string component (`+` is a space).
fn decode(raw: &str) -> String {
    form_urlencoded::parse(format!("={raw}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
