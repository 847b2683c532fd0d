//! Registration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{Registration, RegistrationView};
use crate::AppState;

/// Response for a registration mutation.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub registration: Registration,
}

/// POST /api/hackathons/:hid/register - Register as a solo participant.
///
/// Idempotent: 201 on first registration, 200 with the existing record after.
pub async fn register(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    let (registration, created) = state
        .coordinator
        .register(&user.user_id, &hackathon_id)
        .await?;

    let (status, message) = if created {
        (
            StatusCode::CREATED,
            "Successfully registered for hackathon".to_string(),
        )
    } else {
        (StatusCode::OK, "Already registered".to_string())
    };

    Ok((
        status,
        Json(RegistrationResponse {
            message,
            registration,
        }),
    ))
}

/// GET /api/hackathons/:hid/my-registration - The caller's registration plus
/// the resolved team, if any.
pub async fn my_registration(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
) -> Result<Json<RegistrationView>, AppError> {
    let view = state
        .coordinator
        .my_registration(&user.user_id, &hackathon_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not registered for this hackathon".to_string()))?;

    Ok(Json(view))
}
