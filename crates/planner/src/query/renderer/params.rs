use crate::query::renderer::{Render, Renderer};
use model::query::params::{ParamValue, QueryParams};

impl Render for QueryParams {
    fn render(&self, r: &mut Renderer) {
        for (key, value) in self.iter() {
            match value {
                ParamValue::Scalar(v) => {
                    // Null has no wire form; the parameter is left out.
                    if let Some(s) = v.as_query_str() {
                        r.push_scalar(key, &s);
                    }
                }
                ParamValue::List(values) => {
                    let rendered: Vec<_> = values.iter().filter_map(|v| v.as_query_str()).collect();
                    let dialect = r.dialect;
                    let (wire_key, style) = dialect.list_key(key);
                    r.push_list(&wire_key, rendered.iter().map(|s| s.as_ref()), style);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        dialect::QueryDialect,
        renderer::{Render, Renderer},
    };
    use model::{
        config::api::ApiConfig,
        core::value::Value,
        query::params::QueryParams,
    };
    use std::collections::HashMap;

    fn sample_params() -> QueryParams {
        let mut params = QueryParams::new();
        params.set("per_page", Value::from(100));
        params.set("id", vec![Value::from(1), Value::from(2)]);
        params.set("deleted", Value::Null);
        params.set("active", Value::from(true));
        params
    }

    #[test]
    fn test_render_params_with_brackets() {
        let dialect = QueryDialect::default();
        let mut r = Renderer::new(&dialect);
        sample_params().render(&mut r);
        assert_eq!(r.finish(), "per_page=100&id[]=1&id[]=2&active=1");
    }

    #[test]
    fn test_render_params_pluralized() {
        let mut config = ApiConfig::new("", 100);
        config.pluralize_array_query_params = true;
        config.plural_keys = HashMap::from([("id".to_string(), "ids".to_string())]);
        let dialect = QueryDialect::from_config(&config);

        let mut r = Renderer::new(&dialect);
        sample_params().render(&mut r);
        assert_eq!(r.finish(), "per_page=100&ids=1,2&active=1");
    }
}
