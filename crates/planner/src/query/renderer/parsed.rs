use crate::query::{
    parsed::{ParsedParam, ParsedQuery},
    renderer::{Render, Renderer},
};

impl Render for ParsedQuery {
    fn render(&self, r: &mut Renderer) {
        for (key, param) in self.iter() {
            match param {
                ParsedParam::Scalar(value) => r.push_scalar(key, value),
                ParsedParam::List { values, style } => {
                    r.push_list(key, values.iter().map(String::as_str), *style)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        dialect::QueryDialect,
        parsed::ParsedQuery,
        renderer::{Render, Renderer},
    };

    fn rerender(query: &str) -> String {
        let dialect = QueryDialect::default();
        let mut r = Renderer::new(&dialect);
        ParsedQuery::parse(query).render(&mut r);
        r.finish()
    }

    #[test]
    fn test_rerender_keeps_list_spelling() {
        assert_eq!(rerender("per_page=50&id[]=1&id[]=2"), "per_page=50&id[]=1&id[]=2");
        assert_eq!(rerender("ids=1,2,3&sort=desc"), "ids=1,2,3&sort=desc");
    }

    #[test]
    fn test_rerender_normalizes_encoding() {
        assert_eq!(rerender("id%5B%5D=1&q=a%20b"), "id[]=1&q=a+b");
    }
}
