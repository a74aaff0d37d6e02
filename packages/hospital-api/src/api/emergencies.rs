use super::{
    extract::{Param, Payload},
    AppState, Message,
};
use crate::error::Error;
use crate::store::Document;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use hospital_model::{Collection, EmergencyAlert, EmergencyStatus, ValidationError};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", delete(resolve))
}

///
/// Active alerts, newest first
///
async fn list(State(state): State<AppState>) -> Result<Json<Vec<EmergencyAlert>>, Error> {
    let mut alerts = state.emergencies.all().await?;
    alerts.retain(EmergencyAlert::is_active);

    // insertion order breaks ties between alerts created in the same instant
    alerts.reverse();
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(alerts))
}

async fn create(
    State(state): State<AppState>,
    Payload(alert): Payload<EmergencyAlert>,
) -> Result<(StatusCode, Json<EmergencyAlert>), Error> {
    let alert = state.emergencies.create(&alert).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

///
/// Alerts are never deleted, only resolved
///
async fn resolve(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<Message>, Error> {
    let mut patch = Document::new();
    patch.insert(
        "status".to_string(),
        serde_json::to_value(EmergencyStatus::Resolved).map_err(ValidationError::from)?,
    );

    state
        .emergencies
        .patch(id, patch)
        .await?
        .ok_or(Error::not_found(Collection::Emergencies))?;

    Ok(Json(Message::new("Emergency alert resolved")))
}
