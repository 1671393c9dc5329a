pub mod api;
pub mod error;

pub use api::{
    auth::{StaticToken, TokenProvider},
    connection::ApiConnection,
    fetcher::PaginatedFetcher,
    timezone::{Timezone, normalize_timezones},
    transport::{HttpTransport, ReqwestTransport},
};
pub use error::{ConnectorError, TransportError};
