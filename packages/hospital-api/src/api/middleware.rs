use super::{extract::bearer_token, AppState};
use crate::error::{AuthError, Error};
use crate::log::{API, AUTHENTICATION};
use crate::prometheus::{REQUESTS_TOTAL, REQUEST_DURATION_SECONDS, REQUEST_ERRORS_TOTAL};
use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use std::time::Instant;
use tracing::{debug, info};

/// Routes reachable without a session when sessions are required.
/// Seeding is not one of them, use `hospital-api seed` to bootstrap.
const OPEN_PATHS: &[&str] = &["/api/users/login", "/api/users/register"];

fn request_path(request: &Request) -> String {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

///
/// Logs and measures every request
///
pub async fn track_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request_path(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    counter!(REQUESTS_TOTAL).increment(1);
    histogram!(REQUEST_DURATION_SECONDS).record(duration);
    if status.is_client_error() || status.is_server_error() {
        counter!(REQUEST_ERRORS_TOTAL).increment(1);
    }

    info!(
        target: API,
        method,
        path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
    );

    response
}

///
/// Rejects requests without a live session when `auth.require_session` is set
///
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if !state.auth.require_session {
        return Ok(next.run(request).await);
    }

    let path = request_path(&request);
    if OPEN_PATHS.contains(&path.as_str()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or(AuthError::Unauthenticated)?;

    match state.sessions.resolve(token).await {
        Some(user_id) => {
            debug!(target: AUTHENTICATION, msg = "Session accepted", %user_id, path);
            Ok(next.run(request).await)
        }
        None => {
            debug!(target: AUTHENTICATION, msg = "Session rejected", path);
            Err(AuthError::Unauthenticated.into())
        }
    }
}
