//! Team roster model.

use serde::{Deserialize, Serialize};

/// Default team capacity when the creator does not pick one.
pub const DEFAULT_MAX_MEMBERS: i64 = 5;

/// Largest capacity a team may declare.
pub const MAX_MAX_MEMBERS: i64 = 20;

/// A team's membership, capacity, and leadership for one hackathon.
///
/// `member_ids` is ordered, includes the leader, and is the authoritative
/// membership list; registrations only back-reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub hackathon_id: String,
    pub name: String,
    pub leader_id: String,
    pub member_ids: Vec<String>,
    pub max_members: i64,
    pub invite_code: String,
    pub created_at: String,
}

impl Team {
    pub fn is_full(&self) -> bool {
        self.member_ids.len() as i64 >= self.max_members
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == user_id)
    }
}

/// Request body for creating a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub max_members: Option<i64>,
}

/// Request body for joining a team by invite code or id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Request body for removing a member (leader only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberRequest {
    #[serde(default)]
    pub member_id: Option<String>,
}

/// Request body for transferring leadership (leader only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLeadershipRequest {
    #[serde(default)]
    pub new_leader_id: Option<String>,
}
