use super::{
    extract::{Filter, Param, Payload},
    AppState, Message,
};
use crate::error::Error;
use crate::store::Document;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use hospital_model::{Collection, Notification, Role, Viewer};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

///
/// Optional feed filter, `?role=Doctor&name=Dr.%20Smith`
///
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub role: Option<Role>,
    pub name: Option<String>,
}

impl FeedQuery {
    fn viewer(&self) -> Option<Viewer> {
        let role = self.role?;
        Some(match &self.name {
            Some(name) => Viewer::named(role, name),
            None => Viewer::role(role),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create).delete(clear))
        .route("/{id}/read", patch(mark_read))
}

///
/// Newest first
///
async fn list(
    State(state): State<AppState>,
    Filter(query): Filter<FeedQuery>,
) -> Result<Json<Vec<Notification>>, Error> {
    let mut notifications = state.notifications.all().await?;

    if let Some(viewer) = query.viewer() {
        notifications.retain(|n| n.is_visible_to(&viewer));
    }

    notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(notifications))
}

async fn create(
    State(state): State<AppState>,
    Payload(notification): Payload<Notification>,
) -> Result<(StatusCode, Json<Notification>), Error> {
    let notification = state.notifications.create(&notification).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn mark_read(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<Notification>, Error> {
    let mut patch = Document::new();
    patch.insert("read".to_string(), Value::Bool(true));

    state
        .notifications
        .patch(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::not_found(Collection::Notifications))
}

async fn clear(State(state): State<AppState>) -> Result<Json<Message>, Error> {
    let deleted = state.notifications.delete_all().await?;

    Ok(Json(Message {
        deleted: Some(deleted),
        ..Message::new("All notifications cleared")
    }))
}
