//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data. Uniqueness of the
//! active timer and of room membership is enforced by the schema.

mod entries;
mod repository;
mod rooms;
mod timers;

pub use entries::DEFAULT_FEED_LIMIT;
pub use repository::*;
pub use timers::TimerLabels;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::format::to_storage;

/// Categories created on first start.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Development", "#ffffff"),
    ("Meetings", "#a0a0a0"),
    ("Research", "#737373"),
    ("Admin", "#525252"),
];

/// Rooms created on first start.
pub const DEFAULT_ROOMS: [&str; 2] = ["Open Office", "Focus Room"];

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;
    seed_defaults(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_entries (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id),
            tag_id TEXT REFERENCES tags(id) ON DELETE SET NULL,
            description TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL,
            end_time TEXT,
            duration INTEGER NOT NULL CHECK (duration >= 0),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS active_timers (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id),
            tag_id TEXT REFERENCES tags(id) ON DELETE SET NULL,
            description TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rooms (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            meet_link TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS room_participants (
            id TEXT PRIMARY KEY,
            room_id TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            joined_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_time_entries_user_start ON time_entries(user_id, start_time);
        CREATE INDEX IF NOT EXISTS idx_time_entries_start ON time_entries(start_time);
        CREATE INDEX IF NOT EXISTS idx_time_entries_category ON time_entries(category_id);
        CREATE INDEX IF NOT EXISTS idx_active_timers_category ON active_timers(category_id);
        CREATE INDEX IF NOT EXISTS idx_room_participants_room ON room_participants(room_id);
        CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the default categories and rooms when their tables are empty.
async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = to_storage(Utc::now());

    let categories: i64 = sqlx::query("SELECT COUNT(*) AS n FROM categories")
        .fetch_one(pool)
        .await?
        .get("n");
    if categories == 0 {
        for (name, color) in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (id, name, color, created_at) VALUES (?, ?, ?, ?)")
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(name)
                .bind(color)
                .bind(&now)
                .execute(pool)
                .await?;
        }
        tracing::info!("Seeded {} default categories", DEFAULT_CATEGORIES.len());
    }

    let rooms: i64 = sqlx::query("SELECT COUNT(*) AS n FROM rooms")
        .fetch_one(pool)
        .await?
        .get("n");
    if rooms == 0 {
        for name in DEFAULT_ROOMS {
            sqlx::query("INSERT INTO rooms (id, name, meet_link, created_at) VALUES (?, ?, NULL, ?)")
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(name)
                .bind(&now)
                .execute(pool)
                .await?;
        }
        tracing::info!("Seeded {} default rooms", DEFAULT_ROOMS.len());
    }

    Ok(())
}
