pub mod error;
pub mod query;

pub use error::PlanError;
pub use query::compiler::{QueryCompiler, compile};
pub use query::splitter::{RequestSplitter, split};
