//! Registration model: a single user's participation status in a single hackathon.

use serde::{Deserialize, Serialize};

use super::Team;

/// A user's membership state within a hackathon.
///
/// The role and team reference are a single tagged value, so a registration
/// cannot carry a team id while solo or lack one while on a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Membership {
    Solo,
    Leader {
        #[serde(rename = "teamId")]
        team_id: String,
    },
    Member {
        #[serde(rename = "teamId")]
        team_id: String,
    },
}

impl Membership {
    /// Role name as stored in the database.
    pub fn role(&self) -> &'static str {
        match self {
            Membership::Solo => "solo",
            Membership::Leader { .. } => "leader",
            Membership::Member { .. } => "member",
        }
    }

    /// The team this registration points at, if any.
    pub fn team_id(&self) -> Option<&str> {
        match self {
            Membership::Solo => None,
            Membership::Leader { team_id } | Membership::Member { team_id } => Some(team_id),
        }
    }

    pub fn is_solo(&self) -> bool {
        matches!(self, Membership::Solo)
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Membership::Leader { .. })
    }

    /// Rebuild the tagged value from its stored columns.
    ///
    /// Returns `None` for inconsistent rows (solo with a team id, or a team
    /// role without one).
    pub fn from_columns(role: &str, team_id: Option<String>) -> Option<Self> {
        match (role, team_id) {
            ("solo", None) => Some(Membership::Solo),
            ("leader", Some(team_id)) => Some(Membership::Leader { team_id }),
            ("member", Some(team_id)) => Some(Membership::Member { team_id }),
            _ => None,
        }
    }
}

/// One record per (user, hackathon) pair; the source of truth for a user's
/// status in that hackathon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub user_id: String,
    pub hackathon_id: String,
    #[serde(flatten)]
    pub membership: Membership,
    pub registered_at: String,
}

/// Registration plus the resolved team, for the my-registration view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: Registration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_from_columns() {
        assert_eq!(Membership::from_columns("solo", None), Some(Membership::Solo));
        assert_eq!(
            Membership::from_columns("leader", Some("t1".to_string())),
            Some(Membership::Leader {
                team_id: "t1".to_string()
            })
        );
        assert_eq!(
            Membership::from_columns("member", Some("t1".to_string())),
            Some(Membership::Member {
                team_id: "t1".to_string()
            })
        );
        // Inconsistent pairs are rejected
        assert_eq!(Membership::from_columns("solo", Some("t1".to_string())), None);
        assert_eq!(Membership::from_columns("leader", None), None);
        assert_eq!(Membership::from_columns("captain", None), None);
    }

    #[test]
    fn test_membership_serializes_as_role_and_team_id() {
        let solo = serde_json::to_value(Membership::Solo).unwrap();
        assert_eq!(solo["role"], "solo");
        assert!(solo.get("teamId").is_none());

        let leader = serde_json::to_value(Membership::Leader {
            team_id: "team-1".to_string(),
        })
        .unwrap();
        assert_eq!(leader["role"], "leader");
        assert_eq!(leader["teamId"], "team-1");
    }

    #[test]
    fn test_registration_flattens_membership() {
        let registration = Registration {
            user_id: "u1".to_string(),
            hackathon_id: "h1".to_string(),
            membership: Membership::Member {
                team_id: "t1".to_string(),
            },
            registered_at: "2025-01-01T00:00:00Z".to_string(),
        };

        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["role"], "member");
        assert_eq!(value["teamId"], "t1");
    }
}
