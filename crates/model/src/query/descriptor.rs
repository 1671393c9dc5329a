//! Structured description of a read query, independent of any query syntax.

use crate::core::value::Value;
use std::fmt;

/// One filter predicate of a [`QueryDescriptor`].
///
/// `column` may be qualified (`"posts.author_id"`); the compiler only ever
/// sends the part after the last `.` over the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Basic {
        column: String,
        operator: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    InRaw {
        column: String,
        values: Vec<Value>,
    },
    Between {
        column: String,
        min: Value,
        max: Value,
    },
    Null {
        column: String,
    },
    NotNull {
        column: String,
    },
}

impl WhereClause {
    pub fn column(&self) -> &str {
        match self {
            WhereClause::Basic { column, .. }
            | WhereClause::In { column, .. }
            | WhereClause::InRaw { column, .. }
            | WhereClause::Between { column, .. }
            | WhereClause::Null { column }
            | WhereClause::NotNull { column } => column,
        }
    }

    /// Name of the clause kind, used in error and log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            WhereClause::Basic { .. } => "Basic",
            WhereClause::In { .. } => "In",
            WhereClause::InRaw { .. } => "InRaw",
            WhereClause::Between { .. } => "Between",
            WhereClause::Null { .. } => "Null",
            WhereClause::NotNull { .. } => "NotNull",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDir {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for OrderDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDir::Asc => f.write_str("asc"),
            OrderDir::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: OrderDir,
}

/// A read query against one remote collection.
///
/// `orders` is a list so that callers can describe what their query builder
/// produced; the compiler rejects more than one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    pub from: String,
    pub wheres: Vec<WhereClause>,
    pub orders: Vec<OrderClause>,
    pub limit: Option<u64>,
}

impl QueryDescriptor {
    pub fn builder(from: &str) -> QueryDescriptorBuilder {
        QueryDescriptorBuilder::new(from)
    }
}

pub struct QueryDescriptorBuilder {
    ast: QueryDescriptor,
}

impl QueryDescriptorBuilder {
    pub fn new(from: &str) -> Self {
        QueryDescriptorBuilder {
            ast: QueryDescriptor {
                from: from.to_string(),
                ..Default::default()
            },
        }
    }

    /// Adds a `column = value` filter.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, "=", value)
    }

    /// Adds a `column <operator> value` filter. Operators other than `=`,
    /// `>=` and `<=` are accepted here and rejected at compile time.
    pub fn where_op(mut self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.ast.wheres.push(WhereClause::Basic {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn where_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.ast.wheres.push(WhereClause::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn where_in_raw<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.ast.wheres.push(WhereClause::InRaw {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn where_between(
        mut self,
        column: &str,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        self.ast.wheres.push(WhereClause::Between {
            column: column.to_string(),
            min: min.into(),
            max: max.into(),
        });
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.ast.wheres.push(WhereClause::Null {
            column: column.to_string(),
        });
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.ast.wheres.push(WhereClause::NotNull {
            column: column.to_string(),
        });
        self
    }

    pub fn order_by(mut self, column: &str, direction: OrderDir) -> Self {
        self.ast.orders.push(OrderClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn build(self) -> QueryDescriptor {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_clause_order() {
        let query = QueryDescriptor::builder("posts")
            .where_eq("status", "published")
            .where_in("id", [1, 2, 3])
            .where_null("deleted_at")
            .order_by("created_at", OrderDir::Desc)
            .limit(10)
            .build();

        assert_eq!(query.from, "posts");
        let kinds: Vec<_> = query.wheres.iter().map(WhereClause::kind).collect();
        assert_eq!(kinds, vec!["Basic", "In", "Null"]);
        assert_eq!(query.wheres[2].column(), "deleted_at");
        assert_eq!(query.orders[0].direction, OrderDir::Desc);
        assert_eq!(query.limit, Some(10));
    }
}
