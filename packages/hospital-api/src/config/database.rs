use std::{fmt::Display, sync::LazyLock, time::Duration};

use regex::Regex;
use rustls_pki_types::ServerName;
use serde::Deserialize;

use crate::error::{ConfigError, Error};

static URL_PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"://([^:/@]+):([^/]*)@").expect("password pattern is valid"));

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    #[serde(alias = "Postgres", alias = "postgres", alias = "POSTGRES")]
    Postgres,
    #[serde(alias = "Memory", alias = "memory", alias = "MEMORY")]
    Memory,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Full connection url, takes precedence over the individual fields
    pub url: Option<String>,

    #[serde(default = "DatabaseConfig::default_host")]
    pub host: String,

    #[serde(default = "DatabaseConfig::default_port")]
    pub port: u16,

    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "DatabaseConfig::default_connection_timeout")]
    pub connection_timeout: u64,

    #[serde(default)]
    pub with_tls: bool,

    #[serde(default = "DatabaseConfig::default_with_tls_verification")]
    pub with_tls_verification: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            backend: StoreBackend::default(),
            url: None,
            host: DatabaseConfig::default_host(),
            port: DatabaseConfig::default_port(),
            name: None,
            username: None,
            password: None,
            connection_timeout: DatabaseConfig::default_connection_timeout(),
            with_tls: false,
            with_tls_verification: DatabaseConfig::default_with_tls_verification(),
        }
    }
}

impl DatabaseConfig {
    pub fn memory() -> Self {
        DatabaseConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    pub fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    pub const fn default_port() -> u16 {
        5432
    }

    // Initial connection gives up after 5 seconds
    pub const fn default_connection_timeout() -> u64 {
        5000
    }

    pub const fn default_with_tls_verification() -> bool {
        true
    }

    pub fn is_memory(&self) -> bool {
        self.backend == StoreBackend::Memory
    }

    ///
    /// Connection string for tokio-postgres
    /// Uses `url` if present, otherwise requires `name` and `username`
    ///
    pub fn to_connection_string(&self) -> Result<String, Error> {
        if let Some(url) = &self.url {
            return Ok(url.to_owned());
        }

        let name = self.name.as_ref().ok_or_else(|| ConfigError::MissingParameter {
            name: "database.name".to_string(),
        })?;

        let username = self
            .username
            .as_ref()
            .ok_or_else(|| ConfigError::MissingParameter {
                name: "database.username".to_string(),
            })?;

        let credentials = match &self.password {
            Some(password) => format!("{username}:{password}"),
            None => username.to_owned(),
        };

        Ok(format!(
            "postgres://{}@{}:{}/{}",
            credentials, self.host, self.port, name
        ))
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout)
    }

    pub fn server_name(&self) -> Result<ServerName<'static>, Error> {
        let name = ServerName::try_from(self.host.to_owned()).map_err(|_| {
            ConfigError::InvalidParameter {
                name: "database.host".to_string(),
                value: self.host.to_owned(),
            }
        })?;
        Ok(name)
    }
}

///
/// Password is NEVER EVER displayed
///
impl Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_memory() {
            return write!(f, "memory");
        }

        match &self.url {
            Some(url) => write!(f, "{}", URL_PASSWORD.replace(url, "://$1:***@")),
            None => write!(
                f,
                "{}@{}:{}/{}",
                self.username.as_deref().unwrap_or_default(),
                self.host,
                self.port,
                self.name.as_deref().unwrap_or_default(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_string_from_parts() {
        let config = DatabaseConfig {
            name: Some("hospital".to_string()),
            username: Some("admin".to_string()),
            password: Some("p@ssword".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.to_connection_string().unwrap(),
            "postgres://admin:p@ssword@127.0.0.1:5432/hospital"
        );
    }

    #[test]
    fn url_takes_precedence() {
        let config = DatabaseConfig {
            url: Some("postgres://u:secret@db:5433/h".to_string()),
            name: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.to_connection_string().unwrap(),
            "postgres://u:secret@db:5433/h"
        );
    }

    #[test]
    fn missing_name_is_reported() {
        let err = DatabaseConfig::default().to_connection_string().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing field database.name from configuration file or environment"
        );
    }

    #[test]
    fn display_never_shows_password() {
        let config = DatabaseConfig {
            url: Some("postgres://u:secret@db:5433/h".to_string()),
            ..Default::default()
        };
        let s = config.to_string();
        assert!(!s.contains("secret"));
        assert_eq!(s, "postgres://u:***@db:5433/h");

        let config = DatabaseConfig {
            name: Some("hospital".to_string()),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        assert_eq!(config.to_string(), "admin@127.0.0.1:5432/hospital");

        assert_eq!(DatabaseConfig::memory().to_string(), "memory");
    }
}
