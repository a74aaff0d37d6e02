use super::{
    extract::{bearer_token, Param, Payload},
    AppState, Message,
};
use crate::auth::{
    hash_password_in_background, verify_password_in_background, PASSWORD_FIELD,
    PASSWORD_HASH_FIELD,
};
use crate::error::{AuthError, Error, StoreError};
use crate::log::AUTHENTICATION;
use crate::prometheus::{LOGINS_TOTAL, LOGIN_FAILURES_TOTAL};
use crate::seed;
use crate::store::Document;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use hospital_model::{Collection, Entity, Role, User, UserStatus, ValidationError, ID_FIELD};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/seed", post(seed_users))
        .route("/{id}", patch(update).delete(remove))
        .route("/{id}/approve", patch(approve))
}

///
/// Stores a new account with a salted password hash.
/// E-mail addresses are unique.
///
pub async fn create_account(state: &AppState, user: &User, password: &str) -> Result<User, Error> {
    if password.is_empty() {
        return Err(ValidationError::MissingField {
            field: PASSWORD_FIELD,
        }
        .into());
    }
    user.validate()?;

    if state
        .users
        .find_document_by("email", &user.email)
        .await?
        .is_some()
    {
        return Err(AuthError::UserExists.into());
    }

    let hash = hash_password_in_background(password, state.auth.hash_iterations).await?;

    let mut extra = Document::new();
    extra.insert(PASSWORD_HASH_FIELD.to_string(), Value::String(hash));

    // A concurrent registration can still win between the lookup and the insert
    let user = state
        .users
        .create_with(user, extra)
        .await
        .map_err(duplicate_email)?;
    info!(target: AUTHENTICATION, msg = "Account created", email = user.email, role = %user.role);
    Ok(user)
}

fn duplicate_email(err: Error) -> Error {
    match err {
        Error::Store(StoreError::UniqueViolation { field }) if field == "email" => {
            AuthError::UserExists.into()
        }
        err => err,
    }
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, Error> {
    Ok(Json(state.users.all().await?))
}

///
/// Admin create, the body is a full user plus `password`
///
async fn create(
    State(state): State<AppState>,
    Payload(mut body): Payload<Document>,
) -> Result<(StatusCode, Json<User>), Error> {
    let password = take_password(&mut body)?.ok_or(ValidationError::MissingField {
        field: PASSWORD_FIELD,
    })?;
    body.remove(PASSWORD_HASH_FIELD);

    let user: User =
        serde_json::from_value(Value::Object(body)).map_err(ValidationError::from)?;

    let user = create_account(&state, &user, &password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn register(
    State(state): State<AppState>,
    Payload(request): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    let user = User::new(
        &request.name,
        &request.email,
        request.role.unwrap_or_default(),
    );

    let user = create_account(&state, &user, &request.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

///
/// Verifies the password, stamps `lastLogin` and opens a session
///
async fn login(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, Error> {
    let Some(document) = state.users.find_document_by("email", &request.email).await? else {
        return Err(login_failed(&request.email));
    };

    let verified = match document.get(PASSWORD_HASH_FIELD).and_then(Value::as_str) {
        Some(hash) => verify_password_in_background(&request.password, hash).await?,
        None => false,
    };

    if !verified {
        return Err(login_failed(&request.email));
    }

    let id = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or(StoreError::MissingId {
            collection: Collection::Users,
        })?;

    let mut patch = Document::new();
    patch.insert(
        "lastLogin".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    let user = state
        .users
        .patch(id, patch)
        .await?
        .ok_or(Error::not_found(Collection::Users))?;

    let token = state.sessions.issue(id).await;

    counter!(LOGINS_TOTAL).increment(1);
    info!(target: AUTHENTICATION, msg = "Login", email = user.email, role = %user.role);

    Ok(Json(LoginResponse { user, token }))
}

fn login_failed(email: &str) -> Error {
    counter!(LOGIN_FAILURES_TOTAL).increment(1);
    warn!(target: AUTHENTICATION, msg = "Login rejected", email);
    AuthError::InvalidCredentials.into()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Message>, Error> {
    let token = bearer_token(&headers).ok_or(AuthError::Unauthenticated)?;

    if !state.sessions.revoke(token).await {
        return Err(AuthError::Unauthenticated.into());
    }
    Ok(Json(Message::new("Logged out")))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>, Error> {
    let token = bearer_token(&headers).ok_or(AuthError::Unauthenticated)?;

    let id = state
        .sessions
        .resolve(token)
        .await
        .ok_or(AuthError::Unauthenticated)?;

    state
        .users
        .get(id)
        .await?
        .map(Json)
        .ok_or(AuthError::Unauthenticated.into())
}

async fn seed_users(State(state): State<AppState>) -> Result<Json<Message>, Error> {
    let created = seed::demo_users(&state).await?;

    Ok(Json(Message {
        created: Some(created),
        ..Message::new("Users seeded successfully")
    }))
}

///
/// Partial update. A `password` field is hashed before it is stored.
///
async fn update(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
    Payload(mut patch): Payload<Document>,
) -> Result<Json<User>, Error> {
    patch.remove(PASSWORD_HASH_FIELD);

    if let Some(password) = take_password(&mut patch)? {
        let hash = hash_password_in_background(&password, state.auth.hash_iterations).await?;
        patch.insert(PASSWORD_HASH_FIELD.to_string(), Value::String(hash));
    }

    state
        .users
        .patch(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::not_found(Collection::Users))
}

async fn remove(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<Message>, Error> {
    if !state.users.delete(id).await? {
        return Err(Error::not_found(Collection::Users));
    }
    state.sessions.revoke_user(id).await;
    Ok(Json(Message::new("User deleted")))
}

async fn approve(
    State(state): State<AppState>,
    Param(id): Param<Uuid>,
) -> Result<Json<User>, Error> {
    let mut patch = Document::new();
    patch.insert(
        "status".to_string(),
        serde_json::to_value(UserStatus::Active).map_err(ValidationError::from)?,
    );

    state
        .users
        .patch(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::not_found(Collection::Users))
}

///
/// Removes a plain-text password from a request body.
/// A present but empty or non-string password is rejected.
///
fn take_password(body: &mut Document) -> Result<Option<String>, Error> {
    match body.remove(PASSWORD_FIELD) {
        None => Ok(None),
        Some(Value::String(password)) if !password.is_empty() => Ok(Some(password)),
        Some(_) => Err(ValidationError::MissingField {
            field: PASSWORD_FIELD,
        }
        .into()),
    }
}
