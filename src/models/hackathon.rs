//! Hackathon catalog model.
//!
//! The catalog is owned by the organizing side of the platform; this service
//! only needs enough of it to validate registrations and report capacity.

use serde::{Deserialize, Serialize};

/// How a hackathon is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HackathonKind {
    #[serde(rename = "In-Person")]
    InPerson,
    Virtual,
    Hybrid,
}

impl HackathonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HackathonKind::InPerson => "In-Person",
            HackathonKind::Virtual => "Virtual",
            HackathonKind::Hybrid => "Hybrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "In-Person" => Some(HackathonKind::InPerson),
            "Virtual" => Some(HackathonKind::Virtual),
            "Hybrid" => Some(HackathonKind::Hybrid),
            _ => None,
        }
    }
}

/// A hackathon event definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub id: String,
    pub name: String,
    pub starts_at: String,
    pub ends_at: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: HackathonKind,
    pub participants_limit: i64,
    pub created_at: String,
}

/// A hackathon with its participant count computed on read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HackathonDetail {
    #[serde(flatten)]
    pub hackathon: Hackathon,
    pub participant_count: i64,
}

/// Request body for creating a hackathon catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHackathonRequest {
    pub name: String,
    pub starts_at: String,
    pub ends_at: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: HackathonKind,
    #[serde(default)]
    pub participants_limit: Option<i64>,
}
