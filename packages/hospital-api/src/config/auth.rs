use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    /// Require a bearer session token on every `/api` route except login, register and seed
    #[serde(default)]
    pub require_session: bool,

    /// Idle lifetime of a session in seconds
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl: u64,

    #[serde(default = "AuthConfig::default_hash_iterations")]
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            require_session: false,
            session_ttl: AuthConfig::default_session_ttl(),
            hash_iterations: AuthConfig::default_hash_iterations(),
        }
    }
}

impl AuthConfig {
    // 8 hours
    pub const fn default_session_ttl() -> u64 {
        60 * 60 * 8
    }

    pub const fn default_hash_iterations() -> u32 {
        100_000
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}
