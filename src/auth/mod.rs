//! Authentication module.
//!
//! Service-level auth is a pre-shared key checked with constant-time comparison.
//! Caller identity is issued by the external identity service and arrives as a
//! trusted `x-user-id` header injected by the gateway.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header name carrying the authenticated caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, extracted from the `x-user-id` header.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Missing authenticated user identity".to_string())
            })?;

        Ok(CurrentUser {
            user_id: user_id.to_string(),
        })
    }
}

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    // Get the API key from the request header
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_key) => {
            // Constant-time comparison to prevent timing attacks
            if constant_time_compare(&provided_key, &expected) {
                next.run(request).await
            } else {
                unauthorized_response("Invalid API key")
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_key) if constant_time_compare(&bearer_key, &expected) => {
                    next.run(request).await
                }
                _ => unauthorized_response("Missing or invalid API key"),
            }
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    a_bytes.ct_eq(b_bytes).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_constant_time_compare_empty() {
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("", "not-empty"));
    }
}
