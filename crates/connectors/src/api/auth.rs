/// Supplies the bearer token attached to every request.
///
/// The token is asked for once per request, so providers backed by a
/// session may rotate it between pages.
pub trait TokenProvider {
    fn bearer_token(&self) -> Option<String>;
}

/// A token fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String>,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}
