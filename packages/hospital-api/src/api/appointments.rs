use super::{
    extract::{Param, Payload},
    AppState, Message,
};
use crate::error::Error;
use crate::log::API;
use crate::store::{Document, Precondition};
use axum::{extract::State, http::StatusCode, routing::get, routing::patch, Json, Router};
use hospital_model::{Appointment, AppointmentStatus, Collection, ValidationError};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

const STATUS_FIELD: &str = "status";

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", patch(update).delete(remove))
        .route("/{id}/status", patch(update_status))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Appointment>>, Error> {
    Ok(Json(state.appointments.all().await?))
}

///
/// New appointments always start out Pending
///
async fn create(
    State(state): State<AppState>,
    Payload(appointment): Payload<Appointment>,
) -> Result<(StatusCode, Json<Appointment>), Error> {
    if appointment.status != AppointmentStatus::Pending {
        return Err(ValidationError::InitialStatus {
            status: appointment.status,
        }
        .into());
    }

    let appointment = state.appointments.create(&appointment).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn update(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<Document>,
) -> Result<Json<Appointment>, Error> {
    let next = match patch.get(STATUS_FIELD) {
        Some(status) => Some(
            serde_json::from_value::<AppointmentStatus>(status.clone())
                .map_err(ValidationError::from)?,
        ),
        None => None,
    };

    apply(&state, id, patch, next).await.map(Json)
}

async fn update_status(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
    Payload(update): Payload<StatusUpdate>,
) -> Result<Json<Appointment>, Error> {
    let mut patch = Document::new();
    patch.insert(
        STATUS_FIELD.to_string(),
        Value::String(update.status.as_str().to_string()),
    );

    apply(&state, id, patch, Some(update.status)).await.map(Json)
}

///
/// Writes the patch, checking a status change against the workflow.
///
/// The write is guarded on the status that was checked, so a concurrent
/// change in between surfaces as a conflict instead of an illegal edge.
///
async fn apply(
    state: &AppState,
    id: Uuid,
    patch: Document,
    next: Option<AppointmentStatus>,
) -> Result<Appointment, Error> {
    let precondition = match next {
        Some(next) => {
            let current = state
                .appointments
                .get(id)
                .await?
                .ok_or(Error::not_found(Collection::Appointments))?;

            current.status.transition_to(next)?;

            debug!(
                target: API,
                msg = "Appointment transition",
                %id,
                from = %current.status,
                to = %next
            );
            Some(Precondition::new(STATUS_FIELD, current.status.as_str()))
        }
        None => None,
    };

    state
        .appointments
        .patch_if(id, patch, precondition)
        .await?
        .ok_or(Error::not_found(Collection::Appointments))
}

async fn remove(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<Message>, Error> {
    if !state.appointments.delete(id).await? {
        return Err(Error::not_found(Collection::Appointments));
    }
    Ok(Json(Message::new("Appointment deleted")))
}
