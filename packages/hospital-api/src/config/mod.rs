mod auth;
mod database;
mod hospital;
mod log;
mod server;

pub use auth::AuthConfig;
pub use database::{DatabaseConfig, StoreBackend};
pub use hospital::{HospitalConfig, PrometheusConfig};
pub use log::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use server::ServerConfig;

pub const ENV_PREFIX: &str = "HOSPITAL";
pub const DEFAULT_CONFIG_FILE_PATH: &str = "hospital-api.toml";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";
pub const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 2000;
pub const DEFAULT_WORKER_THREADS: usize = 4;

// Plain variables read by earlier deployments of the service
pub const PORT_ENV: &str = "PORT";
pub const CLIENT_URL_ENV: &str = "CLIENT_URL";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
