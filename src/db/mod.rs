//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create tables if they don't exist
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hackathons (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            starts_at TEXT NOT NULL,
            ends_at TEXT NOT NULL,
            location TEXT NOT NULL,
            kind TEXT NOT NULL,
            participants_limit INTEGER NOT NULL DEFAULT 100,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registrations (
            user_id TEXT NOT NULL,
            hackathon_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'solo' CHECK (role IN ('solo', 'leader', 'member')),
            team_id TEXT,
            registered_at TEXT NOT NULL,
            PRIMARY KEY (user_id, hackathon_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            hackathon_id TEXT NOT NULL,
            name TEXT NOT NULL,
            leader_id TEXT NOT NULL,
            member_ids TEXT NOT NULL,
            max_members INTEGER NOT NULL DEFAULT 5,
            invite_code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries; team names are unique per hackathon
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_teams_hackathon_name ON teams(hackathon_id, name);
        CREATE INDEX IF NOT EXISTS idx_teams_hackathon ON teams(hackathon_id);
        CREATE INDEX IF NOT EXISTS idx_registrations_hackathon ON registrations(hackathon_id);
        CREATE INDEX IF NOT EXISTS idx_registrations_team ON registrations(team_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
