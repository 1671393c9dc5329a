use crate::{
    error::PlanError,
    query::{
        dialect::QueryDialect,
        leaf_key,
        renderer::{Render, Renderer},
    },
};
use model::{
    config::api::{ApiConfig, NullHandling},
    core::value::Value,
    query::{
        descriptor::{OrderClause, OrderDir, QueryDescriptor, WhereClause},
        params::QueryParams,
    },
};
use tracing::{debug, warn};

/// Compiles query descriptors into API paths for one connection.
pub struct QueryCompiler<'a> {
    config: &'a ApiConfig,
    dialect: &'a QueryDialect,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(config: &'a ApiConfig, dialect: &'a QueryDialect) -> Self {
        Self { config, dialect }
    }

    /// Compiles `query` into `/<collection>[?<query string>]`.
    pub fn compile(&self, query: &QueryDescriptor) -> Result<String, PlanError> {
        let params = self.compile_params(query)?;

        let mut url = format!("/{}", query.from);
        if !params.is_empty() {
            let mut renderer = Renderer::new(self.dialect);
            params.render(&mut renderer);
            url.push('?');
            url.push_str(&renderer.finish());
        }

        debug!(collection = %query.from, url = %url, "Compiled query");
        Ok(url)
    }

    /// Builds the ordered parameters for `query`: defaults first, then the
    /// where-derived keys, then ordering, with `per_page` overwritten in
    /// place when a limit is set.
    pub fn compile_params(&self, query: &QueryDescriptor) -> Result<QueryParams, PlanError> {
        let mut params = QueryParams::from_defaults(&self.config.default_params);

        for clause in &query.wheres {
            self.apply_where(&mut params, clause)?;
        }

        apply_order(&mut params, &query.orders)?;

        // A zero limit means "no limit".
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            let per_page = match params.per_page() {
                Some(n) => n,
                None => self.config.per_page()?,
            };
            if limit >= per_page {
                return Err(PlanError::LimitExceedsPageSize { limit, per_page });
            }
            params.set("per_page", Value::Uint(limit));
        }

        Ok(params)
    }

    fn apply_where(&self, params: &mut QueryParams, clause: &WhereClause) -> Result<(), PlanError> {
        let (key, qualified) = leaf_key(clause.column());

        match clause {
            // A qualified equality is a membership filter on the bare field.
            WhereClause::Basic { value, .. } if qualified => {
                params.set(key, vec![value.clone()]);
            }
            WhereClause::Basic {
                operator, value, ..
            } => {
                let param = match operator.as_str() {
                    "=" => key.to_string(),
                    ">=" => format!("min_{key}"),
                    "<=" => format!("max_{key}"),
                    other => return Err(PlanError::UnsupportedWhereOperator(other.to_string())),
                };
                params.set(param, value.clone());
            }
            WhereClause::In { values, .. } | WhereClause::InRaw { values, .. } => {
                params.set(key, values.clone());
            }
            WhereClause::Between { min, max, .. } => {
                params.set(format!("min_{key}"), min.clone());
                params.set(format!("max_{key}"), max.clone());
            }
            WhereClause::Null { .. } | WhereClause::NotNull { .. } => match self.config.null_filters {
                NullHandling::Ignore => {
                    warn!(
                        column = clause.column(),
                        kind = clause.kind(),
                        "API has no parameter for null filters; filter ignored"
                    );
                }
                NullHandling::Reject => {
                    return Err(PlanError::UnsupportedWhereType {
                        kind: clause.kind(),
                        column: clause.column().to_string(),
                    });
                }
            },
        }

        Ok(())
    }
}

fn apply_order(params: &mut QueryParams, orders: &[OrderClause]) -> Result<(), PlanError> {
    match orders {
        [] => Ok(()),
        [order] => {
            params.set("order_by", Value::from(order.column.as_str()));
            match order.direction {
                OrderDir::Desc => params.set("sort", Value::from("desc")),
                // Ascending is the API default and has no marker.
                OrderDir::Asc => {
                    params.remove("sort");
                }
            }
            Ok(())
        }
        _ => Err(PlanError::MultipleOrdersUnsupported),
    }
}

/// Compiles `query` with the list spelling configured in `config`.
pub fn compile(query: &QueryDescriptor, config: &ApiConfig) -> Result<String, PlanError> {
    let dialect = QueryDialect::from_config(config);
    QueryCompiler::new(config, &dialect).compile(query)
}
