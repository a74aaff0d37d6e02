use super::AppState;
use crate::error::Error;
use crate::log::SEED;
use axum::{extract::State, routing::get, Json, Router};
use hospital_model::HospitalData;
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show))
}

async fn show(State(state): State<AppState>) -> Result<Json<HospitalData>, Error> {
    Ok(Json(load_or_seed(&state).await?))
}

///
/// Returns the singleton, seeding the defaults on first read.
/// The seed lock makes concurrent first reads produce a single document.
///
pub async fn load_or_seed(state: &AppState) -> Result<HospitalData, Error> {
    let _guard = state.hospital_data_seed.lock().await;

    if let Some(data) = state.hospital_data.all().await?.into_iter().next() {
        return Ok(data);
    }

    let data = state.hospital_data.create(&HospitalData::seed()).await?;
    info!(target: SEED, msg = "Hospital data seeded");
    Ok(data)
}
