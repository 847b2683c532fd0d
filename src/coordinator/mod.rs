//! Membership coordinator: the only writer of registration roles and team rosters.
//!
//! Every lifecycle transition (register, create/join/leave a team, remove a
//! member, transfer leadership, delete a team) runs as one `BEGIN IMMEDIATE`
//! SQLite transaction, so the read-validate-write sequence over the
//! registration and team rows is a single atomic unit. Roster writes carry an
//! additional compare-and-swap guard on the stored member list; a guard that
//! matches zero rows aborts the whole transition instead of partially applying.

use chrono::Utc;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::db::{registration_from_row, team_from_row};
use crate::errors::AppError;
use crate::invite;
use crate::models::{Membership, Registration, RegistrationView, Team};

/// How often team creation re-rolls a colliding invite code before giving up.
const INVITE_CODE_ATTEMPTS: u32 = 5;

/// Coordinates all membership state transitions.
#[derive(Clone)]
pub struct Coordinator {
    pool: SqlitePool,
}

/// How a join request identifies its target team.
#[derive(Debug, Clone)]
pub enum TeamLookup {
    /// Invite code, already normalized to upper-case.
    InviteCode(String),
    /// Team id, for clients that already resolved the team.
    Id(String),
}

impl Coordinator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== TRANSITIONS ====================

    /// Register a user for a hackathon as a solo participant.
    ///
    /// Idempotent: an existing registration is returned unchanged. The bool
    /// is true when a new registration was created.
    pub async fn register(
        &self,
        user_id: &str,
        hackathon_id: &str,
    ) -> Result<(Registration, bool), AppError> {
        let mut conn = self.begin().await?;
        let result = self.register_tx(conn.as_mut(), user_id, hackathon_id).await;
        Self::finish(conn, result).await
    }

    async fn register_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        hackathon_id: &str,
    ) -> Result<(Registration, bool), AppError> {
        require_hackathon(conn, hackathon_id).await?;

        let now = Utc::now().to_rfc3339();
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO registrations (user_id, hackathon_id, role, team_id, registered_at)
             VALUES (?, ?, 'solo', NULL, ?)",
        )
        .bind(user_id)
        .bind(hackathon_id)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        let created = inserted.rows_affected() == 1;
        let registration = fetch_registration(conn, user_id, hackathon_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Registration missing immediately after insert".to_string())
            })?;

        if created {
            tracing::info!(user_id, hackathon_id, "registered solo participant");
        }
        Ok((registration, created))
    }

    /// Create a team led by the calling user.
    ///
    /// The caller must hold a solo registration; the team name must be free
    /// within the hackathon. The caller becomes leader and first member.
    pub async fn create_team(
        &self,
        user_id: &str,
        hackathon_id: &str,
        name: &str,
        max_members: i64,
    ) -> Result<Team, AppError> {
        let mut conn = self.begin().await?;
        let result = self
            .create_team_tx(conn.as_mut(), user_id, hackathon_id, name, max_members)
            .await;
        Self::finish(conn, result).await
    }

    async fn create_team_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        hackathon_id: &str,
        name: &str,
        max_members: i64,
    ) -> Result<Team, AppError> {
        require_hackathon(conn, hackathon_id).await?;
        let registration = require_solo(conn, user_id, hackathon_id).await?;

        let name_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE hackathon_id = ? AND name = ?)")
                .bind(hackathon_id)
                .bind(name)
                .fetch_one(&mut *conn)
                .await?;
        if name_taken {
            return Err(AppError::InvalidState(format!(
                "A team named '{}' already exists in this hackathon",
                name
            )));
        }

        let invite_code = unique_invite_code(conn).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let member_ids = vec![user_id.to_string()];
        let members_json = serde_json::to_string(&member_ids)?;

        sqlx::query(
            "INSERT INTO teams (id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(hackathon_id)
        .bind(name)
        .bind(user_id)
        .bind(&members_json)
        .bind(max_members)
        .bind(&invite_code)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        promote_registration(conn, &registration, "leader", Some(&id)).await?;

        tracing::info!(user_id, hackathon_id, team_id = %id, "team created");
        Ok(Team {
            id,
            hackathon_id: hackathon_id.to_string(),
            name: name.to_string(),
            leader_id: user_id.to_string(),
            member_ids,
            max_members,
            invite_code,
            created_at: now,
        })
    }

    /// Join an existing team by invite code or id.
    pub async fn join_team(
        &self,
        user_id: &str,
        hackathon_id: &str,
        lookup: TeamLookup,
    ) -> Result<Team, AppError> {
        let mut conn = self.begin().await?;
        let result = self
            .join_team_tx(conn.as_mut(), user_id, hackathon_id, lookup)
            .await;
        Self::finish(conn, result).await
    }

    async fn join_team_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        hackathon_id: &str,
        lookup: TeamLookup,
    ) -> Result<Team, AppError> {
        let registration = require_solo(conn, user_id, hackathon_id).await?;

        let mut team = fetch_team_by_lookup(conn, hackathon_id, &lookup)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.is_full() {
            return Err(AppError::InvalidState("Team is full".to_string()));
        }
        // Unreachable while the solo precondition holds, but checked anyway
        if team.has_member(user_id) {
            return Err(AppError::InvalidState(
                "You are already in this team".to_string(),
            ));
        }

        let previous_json = serde_json::to_string(&team.member_ids)?;
        team.member_ids.push(user_id.to_string());
        swap_roster(conn, &team, &previous_json).await?;

        promote_registration(conn, &registration, "member", Some(&team.id)).await?;

        tracing::info!(user_id, hackathon_id, team_id = %team.id, "joined team");
        Ok(team)
    }

    /// Leave the caller's current team.
    ///
    /// Leaders cannot leave; a team is never left leaderless.
    pub async fn leave_team(&self, user_id: &str, hackathon_id: &str) -> Result<(), AppError> {
        let mut conn = self.begin().await?;
        let result = self.leave_team_tx(conn.as_mut(), user_id, hackathon_id).await;
        Self::finish(conn, result).await
    }

    async fn leave_team_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        hackathon_id: &str,
    ) -> Result<(), AppError> {
        let registration = fetch_registration(conn, user_id, hackathon_id).await?;

        let team_id = match registration.as_ref().map(|r| &r.membership) {
            None | Some(Membership::Solo) => {
                return Err(AppError::InvalidState("You are not in a team".to_string()));
            }
            Some(Membership::Leader { .. }) => {
                return Err(AppError::InvalidState(
                    "As a leader, you must transfer leadership or delete the team before leaving"
                        .to_string(),
                ));
            }
            Some(Membership::Member { team_id }) => team_id.clone(),
        };

        let mut team = fetch_team(conn, hackathon_id, &team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        let previous_json = serde_json::to_string(&team.member_ids)?;
        team.member_ids.retain(|m| m != user_id);
        swap_roster(conn, &team, &previous_json).await?;

        demote_registration(conn, user_id, hackathon_id, &team_id).await?;

        tracing::info!(user_id, hackathon_id, team_id = %team.id, "left team");
        Ok(())
    }

    /// Remove a member from the leader's team.
    pub async fn remove_member(
        &self,
        acting_user_id: &str,
        hackathon_id: &str,
        member_id: &str,
    ) -> Result<Team, AppError> {
        let mut conn = self.begin().await?;
        let result = self
            .remove_member_tx(conn.as_mut(), acting_user_id, hackathon_id, member_id)
            .await;
        Self::finish(conn, result).await
    }

    async fn remove_member_tx(
        &self,
        conn: &mut SqliteConnection,
        acting_user_id: &str,
        hackathon_id: &str,
        member_id: &str,
    ) -> Result<Team, AppError> {
        let team_id = require_leader(conn, acting_user_id, hackathon_id, "remove members").await?;

        if member_id == acting_user_id {
            return Err(AppError::InvalidState(
                "You cannot remove yourself. Use delete team or transfer leadership.".to_string(),
            ));
        }

        let mut team = fetch_team(conn, hackathon_id, &team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if !team.has_member(member_id) {
            return Err(AppError::InvalidState(
                "User is not in your team".to_string(),
            ));
        }

        let previous_json = serde_json::to_string(&team.member_ids)?;
        team.member_ids.retain(|m| m != member_id);
        swap_roster(conn, &team, &previous_json).await?;

        demote_registration(conn, member_id, hackathon_id, &team_id).await?;

        tracing::info!(
            acting_user_id,
            hackathon_id,
            member_id,
            team_id = %team.id,
            "member removed from team"
        );
        Ok(team)
    }

    /// Hand leadership to another member of the same team.
    ///
    /// The team row and both registrations flip in the same transaction, so
    /// the swap is atomic to external observers. Member ordering is untouched.
    pub async fn transfer_leadership(
        &self,
        acting_user_id: &str,
        hackathon_id: &str,
        new_leader_id: &str,
    ) -> Result<Team, AppError> {
        let mut conn = self.begin().await?;
        let result = self
            .transfer_leadership_tx(conn.as_mut(), acting_user_id, hackathon_id, new_leader_id)
            .await;
        Self::finish(conn, result).await
    }

    async fn transfer_leadership_tx(
        &self,
        conn: &mut SqliteConnection,
        acting_user_id: &str,
        hackathon_id: &str,
        new_leader_id: &str,
    ) -> Result<Team, AppError> {
        let team_id =
            require_leader(conn, acting_user_id, hackathon_id, "transfer leadership").await?;

        if new_leader_id == acting_user_id {
            return Err(AppError::InvalidState(
                "You are already the team leader".to_string(),
            ));
        }

        let mut team = fetch_team(conn, hackathon_id, &team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if !team.has_member(new_leader_id) {
            return Err(AppError::InvalidState(
                "New leader must be a member of the team".to_string(),
            ));
        }

        let new_leader_registered: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE user_id = ? AND hackathon_id = ?)",
        )
        .bind(new_leader_id)
        .bind(hackathon_id)
        .fetch_one(&mut *conn)
        .await?;
        if !new_leader_registered {
            return Err(AppError::InvalidState(
                "New leader is not registered for this hackathon".to_string(),
            ));
        }

        let swapped = sqlx::query("UPDATE teams SET leader_id = ? WHERE id = ? AND leader_id = ?")
            .bind(new_leader_id)
            .bind(&team.id)
            .bind(acting_user_id)
            .execute(&mut *conn)
            .await?;
        if swapped.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Team leadership changed concurrently".to_string(),
            ));
        }

        let demoted = sqlx::query(
            "UPDATE registrations SET role = 'member'
             WHERE user_id = ? AND hackathon_id = ? AND role = 'leader' AND team_id = ?",
        )
        .bind(acting_user_id)
        .bind(hackathon_id)
        .bind(&team.id)
        .execute(&mut *conn)
        .await?;
        let promoted = sqlx::query(
            "UPDATE registrations SET role = 'leader'
             WHERE user_id = ? AND hackathon_id = ? AND role = 'member' AND team_id = ?",
        )
        .bind(new_leader_id)
        .bind(hackathon_id)
        .bind(&team.id)
        .execute(&mut *conn)
        .await?;
        if demoted.rows_affected() == 0 || promoted.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Registration state changed concurrently".to_string(),
            ));
        }

        team.leader_id = new_leader_id.to_string();
        tracing::info!(
            acting_user_id,
            hackathon_id,
            new_leader_id,
            team_id = %team.id,
            "leadership transferred"
        );
        Ok(team)
    }

    /// Dissolve the leader's team and reset every member to solo.
    ///
    /// The only transition that destroys a team record.
    pub async fn delete_team(
        &self,
        acting_user_id: &str,
        hackathon_id: &str,
    ) -> Result<(), AppError> {
        let mut conn = self.begin().await?;
        let result = self
            .delete_team_tx(conn.as_mut(), acting_user_id, hackathon_id)
            .await;
        Self::finish(conn, result).await
    }

    async fn delete_team_tx(
        &self,
        conn: &mut SqliteConnection,
        acting_user_id: &str,
        hackathon_id: &str,
    ) -> Result<(), AppError> {
        let team_id = require_leader(conn, acting_user_id, hackathon_id, "delete the team").await?;

        let team = fetch_team(conn, hackathon_id, &team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        // One statement resets every back-reference, whatever the roster says
        sqlx::query(
            "UPDATE registrations SET role = 'solo', team_id = NULL
             WHERE hackathon_id = ? AND team_id = ?",
        )
        .bind(hackathon_id)
        .bind(&team.id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(&team.id)
            .execute(&mut *conn)
            .await?;

        tracing::info!(acting_user_id, hackathon_id, team_id = %team.id, "team deleted");
        Ok(())
    }

    /// Read-only composite view: the caller's registration plus its resolved team.
    pub async fn my_registration(
        &self,
        user_id: &str,
        hackathon_id: &str,
    ) -> Result<Option<RegistrationView>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, hackathon_id, role, team_id, registered_at
             FROM registrations WHERE user_id = ? AND hackathon_id = ?",
        )
        .bind(user_id)
        .bind(hackathon_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(registration) = row.as_ref().map(registration_from_row).transpose()? else {
            return Ok(None);
        };

        let team = match registration.membership.team_id() {
            Some(team_id) => {
                let team_row = sqlx::query(
                    "SELECT id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at
                     FROM teams WHERE id = ? AND hackathon_id = ?",
                )
                .bind(team_id)
                .bind(hackathon_id)
                .fetch_optional(&self.pool)
                .await?;

                let team = team_row.as_ref().map(team_from_row);
                if team.is_none() {
                    tracing::warn!(user_id, hackathon_id, team_id, "registration references a missing team");
                }
                team
            }
            None => None,
        };

        Ok(Some(RegistrationView { registration, team }))
    }

    // ==================== TRANSACTION PLUMBING ====================

    /// Acquire a connection and open an immediate (write) transaction, so the
    /// whole transition serializes against other writers up front.
    async fn begin(&self) -> Result<PoolConnection<Sqlite>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(conn.as_mut()).await?;
        Ok(conn)
    }

    /// Commit on success, roll back on failure, then return the result.
    async fn finish<T>(
        mut conn: PoolConnection<Sqlite>,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                sqlx::query("COMMIT").execute(conn.as_mut()).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(conn.as_mut()).await {
                    tracing::error!("Rollback failed after aborted transition: {:?}", rollback_err);
                }
                Err(err)
            }
        }
    }
}

// ==================== SHARED TRANSITION STEPS ====================

async fn require_hackathon(
    conn: &mut SqliteConnection,
    hackathon_id: &str,
) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM hackathons WHERE id = ?)")
        .bind(hackathon_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound("Hackathon not found".to_string()))
    }
}

async fn fetch_registration(
    conn: &mut SqliteConnection,
    user_id: &str,
    hackathon_id: &str,
) -> Result<Option<Registration>, AppError> {
    let row = sqlx::query(
        "SELECT user_id, hackathon_id, role, team_id, registered_at
         FROM registrations WHERE user_id = ? AND hackathon_id = ?",
    )
    .bind(user_id)
    .bind(hackathon_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(registration_from_row).transpose()
}

/// Fetch the caller's registration and insist it is solo.
async fn require_solo(
    conn: &mut SqliteConnection,
    user_id: &str,
    hackathon_id: &str,
) -> Result<Registration, AppError> {
    let registration = fetch_registration(conn, user_id, hackathon_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidState("You must register for the hackathon first".to_string())
        })?;

    if !registration.membership.is_solo() {
        return Err(AppError::InvalidState(
            "You are already in a team. Leave your current team first.".to_string(),
        ));
    }
    Ok(registration)
}

/// Fetch the caller's registration and insist they lead a team; returns the team id.
async fn require_leader(
    conn: &mut SqliteConnection,
    user_id: &str,
    hackathon_id: &str,
    action: &str,
) -> Result<String, AppError> {
    let registration = fetch_registration(conn, user_id, hackathon_id).await?;
    match registration.map(|r| r.membership) {
        Some(Membership::Leader { team_id }) => Ok(team_id),
        _ => Err(AppError::Forbidden(format!(
            "Only the team leader can {}",
            action
        ))),
    }
}

async fn fetch_team(
    conn: &mut SqliteConnection,
    hackathon_id: &str,
    team_id: &str,
) -> Result<Option<Team>, AppError> {
    let row = sqlx::query(
        "SELECT id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at
         FROM teams WHERE id = ? AND hackathon_id = ?",
    )
    .bind(team_id)
    .bind(hackathon_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(team_from_row))
}

async fn fetch_team_by_lookup(
    conn: &mut SqliteConnection,
    hackathon_id: &str,
    lookup: &TeamLookup,
) -> Result<Option<Team>, AppError> {
    match lookup {
        TeamLookup::Id(team_id) => fetch_team(conn, hackathon_id, team_id).await,
        TeamLookup::InviteCode(code) => {
            let row = sqlx::query(
                "SELECT id, hackathon_id, name, leader_id, member_ids, max_members, invite_code, created_at
                 FROM teams WHERE invite_code = ? AND hackathon_id = ?",
            )
            .bind(code)
            .bind(hackathon_id)
            .fetch_optional(&mut *conn)
            .await?;

            Ok(row.as_ref().map(team_from_row))
        }
    }
}

/// Write the team's new member list, guarded by the list that was read.
///
/// `team.member_ids` must already hold the new roster. A zero-row update means
/// another writer got there first; the caller's transaction is aborted.
async fn swap_roster(
    conn: &mut SqliteConnection,
    team: &Team,
    previous_json: &str,
) -> Result<(), AppError> {
    let new_json = serde_json::to_string(&team.member_ids)?;
    let result = sqlx::query("UPDATE teams SET member_ids = ? WHERE id = ? AND member_ids = ?")
        .bind(&new_json)
        .bind(&team.id)
        .bind(previous_json)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Team roster changed concurrently, please retry".to_string(),
        ));
    }
    Ok(())
}

/// Move a solo registration onto a team, guarded by the solo role.
async fn promote_registration(
    conn: &mut SqliteConnection,
    registration: &Registration,
    role: &str,
    team_id: Option<&str>,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE registrations SET role = ?, team_id = ?
         WHERE user_id = ? AND hackathon_id = ? AND role = 'solo'",
    )
    .bind(role)
    .bind(team_id)
    .bind(&registration.user_id)
    .bind(&registration.hackathon_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Registration state changed concurrently".to_string(),
        ));
    }
    Ok(())
}

/// Reset a team member's registration to solo, guarded by the team back-reference.
async fn demote_registration(
    conn: &mut SqliteConnection,
    user_id: &str,
    hackathon_id: &str,
    team_id: &str,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE registrations SET role = 'solo', team_id = NULL
         WHERE user_id = ? AND hackathon_id = ? AND team_id = ?",
    )
    .bind(user_id)
    .bind(hackathon_id)
    .bind(team_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Registration state changed concurrently".to_string(),
        ));
    }
    Ok(())
}

/// Generate an invite code that is not yet taken, re-rolling on collision.
async fn unique_invite_code(conn: &mut SqliteConnection) -> Result<String, AppError> {
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let candidate = invite::generate_code();
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE invite_code = ?)")
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await?;
        if !taken {
            return Ok(candidate);
        }
        tracing::warn!("invite code collision, re-rolling");
    }
    Err(AppError::Internal(
        "Could not generate a unique invite code".to_string(),
    ))
}
