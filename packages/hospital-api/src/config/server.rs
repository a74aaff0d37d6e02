use super::{DEFAULT_CLIENT_URL, DEFAULT_PORT, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_THREADS};
use serde::Deserialize;
use std::thread;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,

    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,

    /// Origin allowed by CORS, the address the dashboard is served from
    #[serde(default = "ServerConfig::default_client_url")]
    pub client_url: String,

    #[serde(default = "ServerConfig::default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    #[serde(default = "ServerConfig::default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: ServerConfig::default_host(),
            port: ServerConfig::default_port(),
            client_url: ServerConfig::default_client_url(),
            shutdown_timeout: ServerConfig::default_shutdown_timeout(),
            worker_threads: ServerConfig::default_worker_threads(),
        }
    }
}

impl ServerConfig {
    pub fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    pub fn default_port() -> u16 {
        DEFAULT_PORT
    }

    pub fn default_client_url() -> String {
        DEFAULT_CLIENT_URL.to_string()
    }

    pub fn default_shutdown_timeout() -> u64 {
        DEFAULT_SHUTDOWN_TIMEOUT
    }

    ///
    /// Default number of worker threads
    /// This is half the number of available cores or DEFAULT_WORKER_THREADS, whichever is greater
    pub fn default_worker_threads() -> usize {
        match thread::available_parallelism() {
            Ok(p) => {
                let count = p.get();
                let threads = count / 2;
                threads.max(DEFAULT_WORKER_THREADS)
            }
            Err(_) => DEFAULT_WORKER_THREADS,
        }
    }

    pub fn to_socket_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.to_socket_address(), "0.0.0.0:5000");
        assert_eq!(config.client_url, "http://localhost:5173");
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(2000));
        assert!(config.worker_threads >= DEFAULT_WORKER_THREADS);
    }
}
