pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod log;
pub mod prometheus;
pub mod seed;
pub mod store;
pub mod tls;

pub use crate::api::{router, AppState};
pub use crate::cli::Args;
pub use crate::config::{AuthConfig, DatabaseConfig, HospitalConfig, ServerConfig};
pub use crate::log::init;
pub use crate::store::{DocumentStore, MemoryStore, SharedStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub mod test_helpers;
