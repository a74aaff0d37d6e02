use super::{
    extract::{Param, Payload},
    AppState, Message,
};
use crate::error::Error;
use crate::store::Document;
use axum::{extract::State, http::StatusCode, routing::get, routing::patch, Json, Router};
use hospital_model::{Collection, Patient};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", patch(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Patient>>, Error> {
    Ok(Json(state.patients.all().await?))
}

async fn create(
    State(state): State<AppState>,
    Payload(patient): Payload<Patient>,
) -> Result<(StatusCode, Json<Patient>), Error> {
    let patient = state.patients.create(&patient).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

async fn update(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
    Payload(patch): Payload<Document>,
) -> Result<Json<Patient>, Error> {
    state
        .patients
        .patch(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::not_found(Collection::Patients))
}

async fn remove(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<Message>, Error> {
    if !state.patients.delete(id).await? {
        return Err(Error::not_found(Collection::Patients));
    }
    Ok(Json(Message::new("Patient deleted")))
}
