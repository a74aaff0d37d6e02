use super::{
    AuthConfig, DatabaseConfig, LogConfig, ServerConfig, CLIENT_URL_ENV, DATABASE_URL_ENV,
    DEFAULT_CONFIG_FILE_PATH, ENV_PREFIX, PORT_ENV,
};
use crate::error::{ConfigError, Error};
use crate::log::CONFIG;
use crate::Args;
use config::{Config, Environment};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::debug;

#[derive(Clone, Debug, Deserialize)]
pub struct HospitalConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "PrometheusConfig::default_port")]
    pub port: u16,
}

/// Config defaults to a file called `hospital-api.toml` in the current directory.
/// Supports TOML, JSON
/// Variable names should match the struct field names.
///
/// ENV vars can be used to override file settings.
///
/// ENV vars must be prefixed with `HOSPITAL_`, nested values use `__`
/// (`HOSPITAL_SERVER__PORT`).
///
/// `PORT`, `CLIENT_URL` and `DATABASE_URL` are honoured last so existing
/// deployments keep working.
///
impl HospitalConfig {
    pub fn default_path() -> String {
        DEFAULT_CONFIG_FILE_PATH.to_string()
    }

    pub fn load(args: &Args) -> Result<HospitalConfig, Error> {
        // Log a warning to user that config file is missing
        if !PathBuf::from(&args.config_file_path).exists() {
            println!(
                "Configuration file was not found: {}",
                args.config_file_path
            );
            println!("Loading config values from environment variables.");
        }
        let mut config = HospitalConfig::build(&args.config_file_path)?;

        // If log level is default, it has not been set by the user in config
        if config.log.level == LogConfig::default_log_level() {
            config.log = LogConfig {
                format: config.log.format,
                output: config.log.output,
                ansi_enabled: config.log.ansi_enabled,
                ..LogConfig::with_level(args.log_level)
            };
        }

        // If log format is default, it has not been set by the user in config
        if config.log.format == LogConfig::default_log_format() {
            config.log.format = args.log_format;
        }

        Ok(config)
    }

    pub fn build(path: &str) -> Result<Self, Error> {
        // For parsing top-level values such as HOSPITAL_LOG__LEVEL
        // and for parsing nested env values such as HOSPITAL_DATABASE__HOST, HOSPITAL_DATABASE__PORT
        let env_source = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .prefix_separator("_");

        let mut config: Self = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(env_source)
            .build()?
            .try_deserialize()
            .map_err(|err| match err {
                config::ConfigError::Message(ref s) => match s {
                    s if s.contains("missing field") => {
                        let name = extract_field_name(s).map_or("unknown".to_string(), |s| s);
                        ConfigError::MissingParameter { name }
                    }
                    s if s.contains("unknown variant") => {
                        let (name, value) = extract_invalid_field(s);
                        ConfigError::InvalidParameter { name, value }
                    }
                    _ => err.into(),
                },
                _ => err.into(),
            })?;

        config.apply_plain_env()?;

        if !config.database.is_memory() {
            config.database.to_connection_string()?;
        }

        Ok(config)
    }

    ///
    /// Apply `PORT`, `CLIENT_URL` and `DATABASE_URL`
    ///
    fn apply_plain_env(&mut self) -> Result<(), Error> {
        if let Ok(port) = env::var(PORT_ENV) {
            debug!(target: CONFIG, msg = "Using PORT from environment", port);
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidParameter {
                name: PORT_ENV.to_string(),
                value: port.to_owned(),
            })?;
        }

        if let Ok(client_url) = env::var(CLIENT_URL_ENV) {
            debug!(target: CONFIG, msg = "Using CLIENT_URL from environment", client_url);
            self.server.client_url = client_url;
        }

        if let Ok(url) = env::var(DATABASE_URL_ENV) {
            debug!(target: CONFIG, msg = "Using DATABASE_URL from environment");
            self.database.url = Some(url);
        }

        Ok(())
    }

    ///
    /// Returns true if Prometheus export is enabled
    ///
    pub fn prometheus_enabled(&self) -> bool {
        self.prometheus.enabled
    }

    pub fn session_required(&self) -> bool {
        self.auth.require_session
    }
}

impl PrometheusConfig {
    pub fn default_port() -> u16 {
        9930
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        PrometheusConfig {
            enabled: false,
            port: PrometheusConfig::default_port(),
        }
    }
}

///
/// Extracts a field name (if present) from a config::ConfigError::Message
/// This is called in `build` if a ConfigError message contains the string `missing field`
///
fn extract_field_name(input: &str) -> Option<String> {
    let re = Regex::new(r"`(\w+)`").ok()?;
    re.captures(input)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
}

///
/// Extracts the rejected value and the expected variants from a config::ConfigError::Message
/// This is called in `build` if a ConfigError message contains the string `unknown variant`
///
/// Error string is "unknown variant `{value}`, expected one of `a`, `b` for key `{name}`"
///
fn extract_invalid_field(input: &str) -> (String, String) {
    let default_name = "unknown".to_string();

    let value = extract_field_name(input).unwrap_or_default();

    let name = input
        .rsplit_once("for key ")
        .map(|(_, key)| key.trim_matches(|c| c == '`' || c == '"').to_string())
        .unwrap_or(default_name);

    (name, value)
}
