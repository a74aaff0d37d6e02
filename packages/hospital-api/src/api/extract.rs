use crate::error::Error;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, HeaderMap},
};

/// JSON request body, rejected as a 400 `{"message": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Payload<T>(pub T);

/// Path parameter, rejected as a 400 `{"message": ...}`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Param<T>(pub T);

/// Query string, rejected as a 400 `{"message": ...}`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Filter<T>(pub T);

///
/// Token from an `Authorization: Bearer <token>` header
///
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
