pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod http;
pub mod message;
pub mod router;
pub mod server;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
