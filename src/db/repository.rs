//! Database repository for reads and catalog writes.
//!
//! Lifecycle transitions that touch more than one record live in the
//! coordinator; this type only covers single-document reads and the
//! hackathon catalog.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CreateHackathonRequest, Hackathon, HackathonDetail, HackathonKind, Membership, Registration,
    Team,
};

/// Database repository for all read-side data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== HACKATHON CATALOG ====================

    /// List all hackathons, newest first.
    pub async fn list_hackathons(&self) -> Result<Vec<Hackathon>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, starts_at, ends_at, location, kind, participants_limit, created_at
             FROM hackathons ORDER BY starts_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(hackathon_from_row).collect()
    }

    /// Get a hackathon by ID.
    pub async fn get_hackathon(&self, id: &str) -> Result<Option<Hackathon>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, starts_at, ends_at, location, kind, participants_limit, created_at
             FROM hackathons WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(hackathon_from_row).transpose()
    }

    /// Get a hackathon with its participant count derived from registrations.
    pub async fn get_hackathon_detail(
        &self,
        id: &str,
    ) -> Result<Option<HackathonDetail>, AppError> {
        let Some(hackathon) = self.get_hackathon(id).await? else {
            return Ok(None);
        };

        let row = sqlx::query("SELECT COUNT(*) AS n FROM registrations WHERE hackathon_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(HackathonDetail {
            hackathon,
            participant_count: row.get("n"),
        }))
    }

    /// Create a hackathon catalog entry.
    pub async fn create_hackathon(
        &self,
        request: &CreateHackathonRequest,
    ) -> Result<Hackathon, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let participants_limit = request.participants_limit.unwrap_or(100);

        sqlx::query(
            "INSERT INTO hackathons (id, name, starts_at, ends_at, location, kind, participants_limit, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.starts_at)
        .bind(&request.ends_at)
        .bind(&request.location)
        .bind(request.kind.as_str())
        .bind(participants_limit)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Hackathon {
            id,
            name: request.name.clone(),
            starts_at: request.starts_at.clone(),
            ends_at: request.ends_at.clone(),
            location: request.location.clone(),
            kind: request.kind,
            participants_limit,
            created_at: now,
        })
    }

    // ==================== TEAMS ====================

    /// Get a team by ID, scoped to a hackathon.
    pub async fn get_team(
        &self,
        hackathon_id: &str,
        team_id: &str,
    ) -> Result<Option<Team>, AppError> {
        let row = sqlx::query(
            "SELECT id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at
             FROM teams WHERE id = ? AND hackathon_id = ?",
        )
        .bind(team_id)
        .bind(hackathon_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(team_from_row))
    }

    /// List all teams for a hackathon, newest first.
    pub async fn list_teams(&self, hackathon_id: &str) -> Result<Vec<Team>, AppError> {
        let rows = sqlx::query(
            "SELECT id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at
             FROM teams WHERE hackathon_id = ? ORDER BY created_at DESC",
        )
        .bind(hackathon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }
}

// Helper functions for row conversion, shared with the coordinator.

pub(crate) fn hackathon_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Hackathon, AppError> {
    let kind_str: String = row.get("kind");
    let kind = HackathonKind::from_str(&kind_str).ok_or_else(|| {
        AppError::Database(format!("Unknown hackathon kind in storage: {}", kind_str))
    })?;

    Ok(Hackathon {
        id: row.get("id"),
        name: row.get("name"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        location: row.get("location"),
        kind,
        participants_limit: row.get("participants_limit"),
        created_at: row.get("created_at"),
    })
}

pub(crate) fn registration_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Registration, AppError> {
    let role: String = row.get("role");
    let team_id: Option<String> = row.get("team_id");
    let user_id: String = row.get("user_id");

    let membership = Membership::from_columns(&role, team_id).ok_or_else(|| {
        AppError::Database(format!(
            "Registration for user {} has inconsistent role/team columns",
            user_id
        ))
    })?;

    Ok(Registration {
        user_id,
        hackathon_id: row.get("hackathon_id"),
        membership,
        registered_at: row.get("registered_at"),
    })
}

pub(crate) fn team_from_row(row: &sqlx::sqlite::SqliteRow) -> Team {
    let member_ids_str: String = row.get("member_ids");
    Team {
        id: row.get("id"),
        hackathon_id: row.get("hackathon_id"),
        name: row.get("name"),
        leader_id: row.get("leader_id"),
        member_ids: parse_json_array(&member_ids_str),
        max_members: row.get("max_members"),
        invite_code: row.get("invite_code"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
