use crate::error::ApiError;
use crate::log::TRANSPORT;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use hospital_model::{
    Appointment, AppointmentStatus, EmergencyAlert, HospitalData, Notification, Patient, Role,
    User,
};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const API_URL_ENV: &str = "HOSPITAL_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Partial update body, a JSON object of changed fields
pub type Patch = Map<String, Value>;

const REDACTED: &str = "[REDACTED]";

#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Registration { name, email, role, .. } = self;
        f.debug_struct("Registration")
            .field("name", name)
            .field("email", email)
            .field("password", &REDACTED)
            .field("role", role)
            .finish()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &REDACTED)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Message {
    message: String,
    #[serde(default)]
    deleted: Option<u64>,
}

///
/// One method per REST call of the hospital API
///
#[async_trait]
pub trait HospitalApi: Send + Sync + 'static {
    async fn patients(&self) -> Result<Vec<Patient>, ApiError>;
    async fn create_patient(&self, patient: &Patient) -> Result<Patient, ApiError>;
    async fn update_patient(&self, id: Uuid, patch: &Patch) -> Result<Patient, ApiError>;
    async fn delete_patient(&self, id: Uuid) -> Result<(), ApiError>;

    async fn appointments(&self) -> Result<Vec<Appointment>, ApiError>;
    async fn create_appointment(&self, appointment: &Appointment)
        -> Result<Appointment, ApiError>;
    async fn update_appointment(&self, id: Uuid, patch: &Patch) -> Result<Appointment, ApiError>;
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<(), ApiError>;

    async fn users(&self) -> Result<Vec<User>, ApiError>;
    async fn register(&self, registration: &Registration) -> Result<User, ApiError>;
    async fn update_user(&self, id: Uuid, patch: &Patch) -> Result<User, ApiError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError>;
    async fn approve_user(&self, id: Uuid) -> Result<User, ApiError>;
    async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError>;
    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, ApiError>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, ApiError>;
    /// Returns the number of notifications removed
    async fn clear_notifications(&self) -> Result<u64, ApiError>;

    async fn emergencies(&self) -> Result<Vec<EmergencyAlert>, ApiError>;
    async fn create_emergency(&self, alert: &EmergencyAlert) -> Result<EmergencyAlert, ApiError>;
    async fn resolve_emergency(&self, id: Uuid) -> Result<(), ApiError>;

    async fn hospital_data(&self) -> Result<HospitalData, ApiError>;
}

///
/// `HospitalApi` over HTTP.
///
/// A successful `login` keeps the session token and sends it as a bearer
/// token on every later request, `logout` drops it.
///
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: ArcSwapOption<String>,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidUrl { url: base_url });
        }

        Ok(HttpApi {
            client: reqwest::Client::new(),
            base_url,
            token: ArcSwapOption::empty(),
        })
    }

    ///
    /// Base url from `HOSPITAL_API_URL`, falling back to the local default
    ///
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        HttpApi::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<Arc<String>> {
        self.token.load_full()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(target: TRANSPORT, %method, url);

        let request = self.client.request(method, url);
        match self.token.load_full() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = match response.json::<Message>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };

        debug!(target: TRANSPORT, status = status.as_u16(), message);
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Message, ApiError> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

#[async_trait]
impl HospitalApi for HttpApi {
    async fn patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.get("/patients").await
    }

    async fn create_patient(&self, patient: &Patient) -> Result<Patient, ApiError> {
        self.post("/patients", patient).await
    }

    async fn update_patient(&self, id: Uuid, patch: &Patch) -> Result<Patient, ApiError> {
        self.patch(&format!("/patients/{id}"), patch).await
    }

    async fn delete_patient(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete(&format!("/patients/{id}")).await.map(|_| ())
    }

    async fn appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.get("/appointments").await
    }

    async fn create_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, ApiError> {
        self.post("/appointments", appointment).await
    }

    async fn update_appointment(&self, id: Uuid, patch: &Patch) -> Result<Appointment, ApiError> {
        self.patch(&format!("/appointments/{id}"), patch).await
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        self.patch(
            &format!("/appointments/{id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete(&format!("/appointments/{id}")).await.map(|_| ())
    }

    async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/users").await
    }

    async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        self.post("/users/register", registration).await
    }

    async fn update_user(&self, id: Uuid, patch: &Patch) -> Result<User, ApiError> {
        self.patch(&format!("/users/{id}"), patch).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete(&format!("/users/{id}")).await.map(|_| ())
    }

    async fn approve_user(&self, id: Uuid) -> Result<User, ApiError> {
        self.patch(&format!("/users/{id}/approve"), &json!({})).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let session: Session = self
            .post(
                "/users/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;

        self.token.store(Some(Arc::new(session.token.to_owned())));
        Ok(session)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        if self.token.load().is_none() {
            return Ok(());
        }

        let result: Result<Message, ApiError> =
            self.post("/users/logout", &json!({})).await;
        self.token.store(None);
        result.map(|_| ())
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.get("/notifications").await
    }

    async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, ApiError> {
        self.post("/notifications", notification).await
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<Notification, ApiError> {
        self.patch(&format!("/notifications/{id}/read"), &json!({}))
            .await
    }

    async fn clear_notifications(&self) -> Result<u64, ApiError> {
        let message = self.delete("/notifications").await?;
        Ok(message.deleted.unwrap_or_default())
    }

    async fn emergencies(&self) -> Result<Vec<EmergencyAlert>, ApiError> {
        self.get("/emergencies").await
    }

    async fn create_emergency(&self, alert: &EmergencyAlert) -> Result<EmergencyAlert, ApiError> {
        self.post("/emergencies", alert).await
    }

    async fn resolve_emergency(&self, id: Uuid) -> Result<(), ApiError> {
        self.delete(&format!("/emergencies/{id}")).await.map(|_| ())
    }

    async fn hospital_data(&self) -> Result<HospitalData, ApiError> {
        self.get("/hospital-data").await
    }
}
