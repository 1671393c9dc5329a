//! Defines how list-valued parameters are spelled in a query string.

use model::config::api::ApiConfig;
use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Maps a singular parameter name to the plural name used when a list is
/// sent as one comma-joined value.
pub trait Pluralize: Send + Sync {
    fn plural<'a>(&'a self, key: &'a str) -> Cow<'a, str>;
}

/// Lookup-table pluralizer. Names missing from the table are returned
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct PluralTable {
    names: HashMap<String, String>,
}

impl PluralTable {
    pub fn new(names: HashMap<String, String>) -> Self {
        PluralTable { names }
    }
}

impl Pluralize for PluralTable {
    fn plural<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        match self.names.get(key) {
            Some(plural) => Cow::Borrowed(plural.as_str()),
            None => Cow::Borrowed(key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// `k[]=a&k[]=b`
    Brackets,
    /// `ks=a,b`
    Joined,
}

#[derive(Clone)]
pub struct QueryDialect {
    pluralize: bool,
    except: HashSet<String>,
    plurals: Arc<dyn Pluralize>,
}

impl Default for QueryDialect {
    fn default() -> Self {
        QueryDialect {
            pluralize: false,
            except: HashSet::new(),
            plurals: Arc::new(PluralTable::default()),
        }
    }
}

impl QueryDialect {
    pub fn from_config(config: &ApiConfig) -> Self {
        QueryDialect {
            pluralize: config.pluralize_array_query_params,
            except: config.pluralize_except.iter().cloned().collect(),
            plurals: Arc::new(PluralTable::new(config.plural_keys.clone())),
        }
    }

    /// Replaces the lookup used for plural names.
    pub fn with_pluralizer(mut self, plurals: Arc<dyn Pluralize>) -> Self {
        self.plurals = plurals;
        self
    }

    /// Returns the wire name and spelling for the list parameter `key`.
    pub fn list_key<'a>(&'a self, key: &'a str) -> (Cow<'a, str>, ListStyle) {
        if self.pluralize && !self.except.contains(key) {
            (self.plurals.plural(key), ListStyle::Joined)
        } else {
            (Cow::Borrowed(key), ListStyle::Brackets)
        }
    }
}
