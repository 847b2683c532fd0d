//! Hackathon catalog endpoints.
//!
//! The catalog itself is owned by the organizing side of the platform; these
//! routes exist so deployments and tests can seed events and read capacity.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::{CreateHackathonRequest, Hackathon, HackathonDetail};
use crate::AppState;

/// POST /api/hackathons - Create a hackathon catalog entry.
pub async fn create_hackathon(
    State(state): State<AppState>,
    Json(request): Json<CreateHackathonRequest>,
) -> Result<(StatusCode, Json<Hackathon>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Hackathon name is required".to_string()));
    }
    if request.starts_at.trim().is_empty() || request.ends_at.trim().is_empty() {
        return Err(AppError::Validation(
            "Start and end dates are required".to_string(),
        ));
    }

    let hackathon = state.repo.create_hackathon(&request).await?;
    Ok((StatusCode::CREATED, Json(hackathon)))
}

/// GET /api/hackathons - List all hackathons.
pub async fn list_hackathons(
    State(state): State<AppState>,
) -> Result<Json<Vec<Hackathon>>, AppError> {
    let hackathons = state.repo.list_hackathons().await?;
    Ok(Json(hackathons))
}

/// GET /api/hackathons/:hid - Get a hackathon with its derived participant count.
pub async fn get_hackathon(
    State(state): State<AppState>,
    Path(hackathon_id): Path<String>,
) -> Result<Json<HackathonDetail>, AppError> {
    let detail = state
        .repo
        .get_hackathon_detail(&hackathon_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hackathon not found".to_string()))?;

    Ok(Json(detail))
}
