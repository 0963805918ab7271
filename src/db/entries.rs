//! Time entry ledger queries and the reads behind the statistics views.

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::format::to_storage;
use crate::models::{CreateEntryRequest, TeamEntry, TimeEntry, UpdateEntryRequest};
use crate::stats::{RollupRow, SeriesRow};

/// Longest team feed a single request can ask for.
pub const MAX_FEED_LIMIT: i64 = 500;
pub const DEFAULT_FEED_LIMIT: i64 = 100;

const ENTRY_COLUMNS: &str =
    "te.id, te.user_id, te.category_id, te.tag_id, te.description, te.start_time, te.end_time, te.duration";

const TEAM_ENTRY_SELECT: &str = r#"
    SELECT
        te.id, te.user_id, te.category_id, te.tag_id, te.description,
        te.start_time, te.end_time, te.duration,
        u.name AS user_name,
        u.email AS user_email,
        c.name AS category_name,
        c.color AS category_color,
        t.name AS tag_name,
        t.color AS tag_color
    FROM time_entries te
    JOIN users u ON te.user_id = u.id
    JOIN categories c ON te.category_id = c.id
    LEFT JOIN tags t ON te.tag_id = t.id
"#;

impl Repository {
    /// Entries of one user, newest first.
    pub async fn list_entries_by_user(&self, user_id: &str) -> Result<Vec<TimeEntry>, AppError> {
        let sql = format!(
            "SELECT {} FROM time_entries te WHERE te.user_id = ? ORDER BY te.start_time DESC",
            ENTRY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    pub async fn get_entry(&self, id: &str) -> Result<Option<TimeEntry>, AppError> {
        let sql = format!("SELECT {} FROM time_entries te WHERE te.id = ?", ENTRY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(entry_from_row))
    }

    /// Record an entry for `user_id`. Unknown category or tag is NotFound.
    pub async fn create_entry(
        &self,
        user_id: &str,
        request: &CreateEntryRequest,
    ) -> Result<TimeEntry, AppError> {
        let entry = TimeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category_id: request.category_id.clone(),
            tag_id: request.tag_id.clone().filter(|t| !t.is_empty()),
            description: request.description.clone().unwrap_or_default(),
            start_time: request.start_time,
            end_time: request.end_time,
            duration: request.duration,
        };

        insert_entry(&self.pool, &entry).await?;
        self.increment_revision().await?;
        Ok(entry)
    }

    /// Apply a partial edit. Absent fields keep their stored value.
    pub async fn update_entry(
        &self,
        id: &str,
        request: &UpdateEntryRequest,
    ) -> Result<TimeEntry, AppError> {
        let existing = self
            .get_entry(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time entry {} not found", id)))?;

        let updated = TimeEntry {
            category_id: request
                .category_id
                .clone()
                .unwrap_or(existing.category_id),
            tag_id: match &request.tag_id {
                Some(tag) => tag.clone().filter(|t| !t.is_empty()),
                None => existing.tag_id,
            },
            description: request.description.clone().unwrap_or(existing.description),
            start_time: request.start_time.unwrap_or(existing.start_time),
            end_time: request.end_time.unwrap_or(existing.end_time),
            duration: request.duration.unwrap_or(existing.duration),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE time_entries
            SET category_id = ?, tag_id = ?, description = ?, start_time = ?, end_time = ?, duration = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.category_id)
        .bind(&updated.tag_id)
        .bind(&updated.description)
        .bind(to_storage(updated.start_time))
        .bind(updated.end_time.map(to_storage))
        .bind(updated.duration)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(updated)
    }

    pub async fn delete_entry(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Time entry {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Most recent entries of the whole team with display metadata.
    pub async fn list_team_entries(&self, limit: i64) -> Result<Vec<TeamEntry>, AppError> {
        let limit = limit.clamp(1, MAX_FEED_LIMIT);
        let sql = format!("{} ORDER BY te.start_time DESC LIMIT ?", TEAM_ENTRY_SELECT);
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(team_entry_from_row).collect())
    }

    /// Team entries starting in `[from, until]`, optionally for one user.
    /// A missing bound is open.
    pub async fn list_team_entries_between(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        user_id: Option<&str>,
    ) -> Result<Vec<TeamEntry>, AppError> {
        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR te.start_time >= ?1)
              AND (?2 IS NULL OR te.start_time <= ?2)
              AND (?3 IS NULL OR te.user_id = ?3)
            ORDER BY te.start_time DESC"#,
            TEAM_ENTRY_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(from.map(to_storage))
            .bind(until.map(to_storage))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(team_entry_from_row).collect())
    }

    /// Per `(user, category)` sums for entries starting at or after `since`.
    pub async fn rollup_rows(&self, since: DateTime<Utc>) -> Result<Vec<RollupRow>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT
                te.user_id,
                te.category_id,
                c.name AS category_name,
                c.color AS category_color,
                COUNT(*) AS entry_count,
                COALESCE(SUM(te.duration), 0) AS total_seconds
            FROM time_entries te
            JOIN categories c ON te.category_id = c.id
            WHERE te.start_time >= ?
            GROUP BY te.user_id, te.category_id
            "#,
        )
        .bind(to_storage(since))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| RollupRow {
                user_id: row.get("user_id"),
                category_id: row.get("category_id"),
                category_name: row.get("category_name"),
                category_color: row.get("category_color"),
                entry_count: row.get("entry_count"),
                total_seconds: row.get("total_seconds"),
            })
            .collect())
    }

    /// Entries starting in `[from, until)`, oldest first, for charting.
    pub async fn series_rows(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        user_id: Option<&str>,
    ) -> Result<Vec<SeriesRow>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT
                te.start_time,
                te.user_id,
                u.name AS user_name,
                te.category_id,
                c.name AS category_name,
                c.color AS category_color,
                te.duration
            FROM time_entries te
            JOIN users u ON te.user_id = u.id
            JOIN categories c ON te.category_id = c.id
            WHERE te.start_time >= ? AND te.start_time < ?
              AND (? IS NULL OR te.user_id = ?)
            ORDER BY te.start_time ASC, te.rowid ASC
            "#,
        )
        .bind(to_storage(from))
        .bind(to_storage(until))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SeriesRow {
                start_time: row.get("start_time"),
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                category_id: row.get("category_id"),
                category_name: row.get("category_name"),
                category_color: row.get("category_color"),
                duration: row.get("duration"),
            })
            .collect())
    }
}

/// Insert on any executor so timer stop can record inside its transaction.
pub(crate) async fn insert_entry<'e, E>(executor: E, entry: &TimeEntry) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO time_entries
            (id, user_id, category_id, tag_id, description, start_time, end_time, duration, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.user_id)
    .bind(&entry.category_id)
    .bind(&entry.tag_id)
    .bind(&entry.description)
    .bind(to_storage(entry.start_time))
    .bind(entry.end_time.map(to_storage))
    .bind(entry.duration)
    .bind(to_storage(Utc::now()))
    .execute(executor)
    .await?;
    Ok(())
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> TimeEntry {
    TimeEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        category_id: row.get("category_id"),
        tag_id: row.get("tag_id"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        duration: row.get("duration"),
    }
}

fn team_entry_from_row(row: &sqlx::sqlite::SqliteRow) -> TeamEntry {
    TeamEntry {
        entry: entry_from_row(row),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        category_name: row.get("category_name"),
        category_color: row.get("category_color"),
        tag_name: row.get("tag_name"),
        tag_color: row.get("tag_color"),
    }
}
