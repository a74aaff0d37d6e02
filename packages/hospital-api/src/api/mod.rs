mod appointments;
mod emergencies;
mod error;
mod extract;
mod hospital_data;
mod middleware;
mod notifications;
mod patients;
mod users;

pub use extract::bearer_token;
pub use hospital_data::load_or_seed;
pub use users::{create_account, LoginRequest, LoginResponse, RegisterRequest};

use crate::auth::SessionManager;
use crate::config::{AuthConfig, ServerConfig};
use crate::error::{ConfigError, Error};
use crate::store::{Repository, SharedStore};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use hospital_model::{Appointment, EmergencyAlert, HospitalData, Notification, Patient, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

pub const LIVENESS_BANNER: &str = "Hospital Management System API is running...";

///
/// Shared by every request handler
///
#[derive(Clone)]
pub struct AppState {
    pub patients: Repository<Patient>,
    pub appointments: Repository<Appointment>,
    pub users: Repository<User>,
    pub notifications: Repository<Notification>,
    pub emergencies: Repository<EmergencyAlert>,
    pub hospital_data: Repository<HospitalData>,
    pub sessions: Arc<SessionManager>,
    pub auth: AuthConfig,

    // Serialises the first read of hospital data so the singleton is seeded once
    hospital_data_seed: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: SharedStore, auth: AuthConfig) -> Self {
        AppState {
            patients: Repository::new(store.clone()),
            appointments: Repository::new(store.clone()),
            users: Repository::new(store.clone()),
            notifications: Repository::new(store.clone()),
            emergencies: Repository::new(store.clone()),
            hospital_data: Repository::new(store),
            sessions: Arc::new(SessionManager::new(auth.session_ttl())),
            auth,
            hospital_data_seed: Arc::new(Mutex::new(())),
        }
    }
}

///
/// Body of delete and bulk responses
///
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Message {
            message: message.to_string(),
            created: None,
            deleted: None,
        }
    }
}

///
/// The complete HTTP surface
///
/// ```text
/// GET  /                     liveness banner
/// /api/patients              patients
/// /api/appointments          appointments
/// /api/users                 accounts and sessions
/// /api/notifications         notifications
/// /api/emergencies           emergency alerts
/// /api/hospital-data         blood bank, stats and analytics
/// ```
///
pub fn router(state: AppState, server: &ServerConfig) -> Result<Router, Error> {
    let api = Router::new()
        .nest("/patients", patients::router())
        .nest("/appointments", appointments::router())
        .nest("/users", users::router())
        .nest("/notifications", notifications::router())
        .nest("/emergencies", emergencies::router())
        .nest("/hospital-data", hospital_data::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    let router = Router::new()
        .route("/", get(|| async { LIVENESS_BANNER }))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::track_request))
        .layer(cors(server)?)
        .with_state(state);

    Ok(router)
}

///
/// Only the dashboard origin may call the API, with credentials
///
fn cors(server: &ServerConfig) -> Result<CorsLayer, Error> {
    let origin = HeaderValue::from_str(&server.client_url).map_err(|_| {
        ConfigError::InvalidParameter {
            name: "server.client_url".to_string(),
            value: server.client_url.to_owned(),
        }
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_omits_empty_counts() {
        let value = serde_json::to_value(Message::new("User deleted")).unwrap();
        assert_eq!(value, serde_json::json!({"message": "User deleted"}));
    }

    #[test]
    fn invalid_client_url_is_a_config_error() {
        let server = ServerConfig {
            client_url: "http://bad\norigin".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            cors(&server),
            Err(Error::Config(ConfigError::InvalidParameter { .. }))
        ));
    }
}
