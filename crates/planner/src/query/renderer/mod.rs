//! Defines the rendering trait and context for converting parameters into
//! a query string.

use crate::query::dialect::{ListStyle, QueryDialect};
use url::form_urlencoded::byte_serialize;

pub mod params;
pub mod parsed;

/// Anything that can be written out as `key=value` pairs.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// Accumulates the query string while rendering, and gives access to the
/// dialect for list spelling.
pub struct Renderer<'a> {
    pub query: String,
    pub dialect: &'a QueryDialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a QueryDialect) -> Self {
        Self {
            query: String::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the query string, without a
    /// leading `?`.
    pub fn finish(self) -> String {
        self.query
    }

    pub fn push_scalar(&mut self, key: &str, value: &str) {
        self.separator();
        self.push_encoded(key);
        self.query.push('=');
        self.push_encoded(value);
    }

    /// Writes a list parameter. Empty lists produce nothing.
    pub fn push_list<'v, I>(&mut self, key: &str, values: I, style: ListStyle)
    where
        I: IntoIterator<Item = &'v str>,
    {
        match style {
            ListStyle::Brackets => {
                for value in values {
                    self.separator();
                    self.push_encoded(key);
                    self.query.push_str("[]=");
                    self.push_encoded(value);
                }
            }
            ListStyle::Joined => {
                let mut values = values.into_iter().peekable();
                if values.peek().is_none() {
                    return;
                }
                self.separator();
                self.push_encoded(key);
                self.query.push('=');
                for (i, value) in values.enumerate() {
                    if i > 0 {
                        self.query.push(',');
                    }
                    self.push_encoded(value);
                }
            }
        }
    }

    fn separator(&mut self) {
        if !self.query.is_empty() {
            self.query.push('&');
        }
    }

    fn push_encoded(&mut self, raw: &str) {
        self.query.extend(byte_serialize(raw.as_bytes()));
    }
}
