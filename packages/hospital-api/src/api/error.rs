use crate::error::{AuthError, Error, StoreError};
use crate::log::API;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hospital_model::ValidationError;
use serde_json::json;
use tracing::{error, warn};

const DATABASE_UNAVAILABLE: &str = "Database Connection Error";

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Store(StoreError::UniqueViolation { .. }) => StatusCode::BAD_REQUEST,
            Error::Auth(AuthError::UserExists) => StatusCode::BAD_REQUEST,
            Error::Auth(AuthError::InvalidCredentials | AuthError::Unauthenticated) => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Transition(_) => StatusCode::CONFLICT,
            Error::Store(StoreError::PreconditionFailed { .. }) => StatusCode::CONFLICT,
            Error::DatabaseConnection { .. } | Error::ConnectionTimeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Store(StoreError::Database(err)) if err.is_closed() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

///
/// Every error leaves the API as `{"message": ...}`
///
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let body = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                error!(target: API, msg = DATABASE_UNAVAILABLE, error = message);
                json!({ "message": DATABASE_UNAVAILABLE, "error": message })
            }
            s if s.is_server_error() => {
                error!(target: API, msg = "Request failed", error = message);
                json!({ "message": message })
            }
            _ => {
                warn!(
                    target: API,
                    msg = "Request rejected",
                    status = status.as_u16(),
                    error = message
                );
                json!({ "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::Schema {
            message: rejection.body_text(),
        }
        .into()
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        ValidationError::Schema {
            message: rejection.body_text(),
        }
        .into()
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::Schema {
            message: rejection.body_text(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_model::{AppointmentStatus, Collection, TransitionError};

    #[test]
    fn status_codes() {
        let cases: Vec<(Error, StatusCode)> = vec![
            (
                ValidationError::MissingField { field: "name" }.into(),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::UserExists.into(), StatusCode::BAD_REQUEST),
            (
                StoreError::UniqueViolation {
                    field: "email".to_string(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Unauthenticated.into(), StatusCode::UNAUTHORIZED),
            (
                Error::not_found(Collection::Appointments),
                StatusCode::NOT_FOUND,
            ),
            (
                TransitionError {
                    from: AppointmentStatus::Completed,
                    to: AppointmentStatus::Confirmed,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::PreconditionFailed {
                    field: "status".to_string(),
                    expected: "Pending".to_string(),
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                Error::DatabaseConnection { retries: 3 },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AuthError::MalformedHash.into(), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Unknown, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = Error::not_found(Collection::Appointments);
        assert_eq!(err.to_string(), "Appointment not found");
    }
}
