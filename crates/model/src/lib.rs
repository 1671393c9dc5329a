pub mod config;
pub mod core;
pub mod query;
pub mod records;
