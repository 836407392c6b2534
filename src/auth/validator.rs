//! Authentication validator
//!
//! Implements HTTP Basic authentication against the configured admin identity.
//! Username and password are both compared in constant time, and both
//! comparisons always run so a wrong username costs the same as a wrong password.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Basic;
use axum_extra::typed_header::TypedHeaderRejection;
use log::warn;
use subtle::ConstantTimeEq;

use super::credentials::AdminCredentials;
use crate::error::{ApiError, AuthError};
use crate::server::AppState;

/// Checks a username/password pair against the admin identity.
pub fn validate_credentials(
    expected: &AdminCredentials,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    let username_ok = username.as_bytes().ct_eq(expected.username().as_bytes());
    let password_ok = password.as_bytes().ct_eq(expected.password().as_bytes());

    if bool::from(username_ok & password_ok) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Middleware guarding every `/api` route.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    auth_header: Result<TypedHeader<Authorization<Basic>>, TypedHeaderRejection>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Ok(TypedHeader(auth)) = auth_header else {
        return Err(AuthError::MissingCredentials.into());
    };

    if let Err(e) = validate_credentials(state.credentials(), auth.username(), auth.password()) {
        warn!("Rejected credentials for user '{}' on {}", auth.username(), req.uri().path());
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
