//! Team lifecycle endpoints.
//!
//! Required-field validation happens here; role and state preconditions are
//! the coordinator's job.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::MessageResponse;
use crate::auth::CurrentUser;
use crate::coordinator::TeamLookup;
use crate::errors::AppError;
use crate::invite;
use crate::models::{
    CreateTeamRequest, JoinTeamRequest, RemoveMemberRequest, Team, TransferLeadershipRequest,
    DEFAULT_MAX_MEMBERS, MAX_MAX_MEMBERS,
};
use crate::AppState;

/// Response for a team mutation.
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub message: String,
    pub team: Team,
}

/// Response for the team listing.
#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub count: usize,
    pub teams: Vec<Team>,
}

/// POST /api/hackathons/:hid/team/create - Create a team led by the caller.
pub async fn create_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), AppError> {
    let name = request
        .team_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Team name is required".to_string()))?;

    let max_members = request.max_members.unwrap_or(DEFAULT_MAX_MEMBERS);
    if !(1..=MAX_MAX_MEMBERS).contains(&max_members) {
        return Err(AppError::Validation(format!(
            "maxMembers must be between 1 and {}",
            MAX_MAX_MEMBERS
        )));
    }

    let team = state
        .coordinator
        .create_team(&user.user_id, &hackathon_id, name, max_members)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            message: "Team created successfully".to_string(),
            team,
        }),
    ))
}

/// POST /api/hackathons/:hid/team/join - Join a team by invite code or id.
pub async fn join_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
    Json(request): Json<JoinTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let invite_code = request
        .invite_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let team_id = request
        .team_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let lookup = match (invite_code, team_id) {
        (Some(code), _) => TeamLookup::InviteCode(invite::normalize_code(code)),
        (None, Some(id)) => TeamLookup::Id(id.to_string()),
        (None, None) => {
            return Err(AppError::Validation(
                "Provide either inviteCode or teamId".to_string(),
            ));
        }
    };

    let team = state
        .coordinator
        .join_team(&user.user_id, &hackathon_id, lookup)
        .await?;

    Ok(Json(TeamResponse {
        message: "Successfully joined team".to_string(),
        team,
    }))
}

/// POST /api/hackathons/:hid/team/leave - Leave the caller's current team.
pub async fn leave_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .coordinator
        .leave_team(&user.user_id, &hackathon_id)
        .await?;

    Ok(Json(MessageResponse::new("Successfully left the team")))
}

/// POST /api/hackathons/:hid/team/remove-member - Remove a member (leader only).
pub async fn remove_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
    Json(request): Json<RemoveMemberRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let member_id = request
        .member_id
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("Member ID is required".to_string()))?;

    let team = state
        .coordinator
        .remove_member(&user.user_id, &hackathon_id, member_id)
        .await?;

    Ok(Json(TeamResponse {
        message: "Member removed successfully".to_string(),
        team,
    }))
}

/// POST /api/hackathons/:hid/team/transfer-leadership - Hand leadership to a
/// member of the same team (leader only).
pub async fn transfer_leadership(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
    Json(request): Json<TransferLeadershipRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let new_leader_id = request
        .new_leader_id
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("New leader ID is required".to_string()))?;

    let team = state
        .coordinator
        .transfer_leadership(&user.user_id, &hackathon_id, new_leader_id)
        .await?;

    Ok(Json(TeamResponse {
        message: "Leadership transferred successfully".to_string(),
        team,
    }))
}

/// DELETE /api/hackathons/:hid/team/delete - Dissolve the caller's team (leader only).
pub async fn delete_team(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(hackathon_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .coordinator
        .delete_team(&user.user_id, &hackathon_id)
        .await?;

    Ok(Json(MessageResponse::new(
        "Team deleted successfully. All members are now solo participants.",
    )))
}

/// GET /api/hackathons/:hid/team/:tid - Get a team by id.
pub async fn get_team(
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(String, String)>,
) -> Result<Json<Team>, AppError> {
    let team = state
        .repo
        .get_team(&hackathon_id, &team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    Ok(Json(team))
}

/// GET /api/hackathons/:hid/teams - List all teams for a hackathon.
pub async fn list_teams(
    State(state): State<AppState>,
    Path(hackathon_id): Path<String>,
) -> Result<Json<TeamListResponse>, AppError> {
    let teams = state.repo.list_teams(&hackathon_id).await?;

    Ok(Json(TeamListResponse {
        count: teams.len(),
        teams,
    }))
}
