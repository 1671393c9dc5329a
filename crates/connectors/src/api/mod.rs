pub mod auth;
pub mod connection;
pub mod fetcher;
pub mod timezone;
pub mod transport;
