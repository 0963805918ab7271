//! Active timer store: at most one running timer per user.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

use super::entries::insert_entry;
use super::Repository;
use crate::errors::AppError;
use crate::format::{format_clock, to_storage};
use crate::models::{ActiveTimer, TeamActiveTimer, TimeEntry};
use crate::timer::{elapsed_seconds, TimerView};

/// Labels a timer runs under.
#[derive(Debug, Clone)]
pub struct TimerLabels {
    pub category_id: String,
    pub tag_id: Option<String>,
    pub description: String,
}

impl Repository {
    /// Start a timer, replacing any timer the user already has.
    pub async fn start_timer(
        &self,
        user_id: &str,
        labels: &TimerLabels,
        start_time: DateTime<Utc>,
    ) -> Result<ActiveTimer, AppError> {
        let timer = ActiveTimer {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category_id: labels.category_id.clone(),
            tag_id: labels.tag_id.clone(),
            description: labels.description.clone(),
            start_time,
        };

        sqlx::query(
            r#"
            INSERT INTO active_timers (id, user_id, category_id, tag_id, description, start_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                id = excluded.id,
                category_id = excluded.category_id,
                tag_id = excluded.tag_id,
                description = excluded.description,
                start_time = excluded.start_time,
                created_at = excluded.created_at
            "#,
        )
        .bind(&timer.id)
        .bind(&timer.user_id)
        .bind(&timer.category_id)
        .bind(&timer.tag_id)
        .bind(&timer.description)
        .bind(to_storage(timer.start_time))
        .bind(to_storage(Utc::now()))
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        tracing::debug!("Timer started for user {}", user_id);
        Ok(timer)
    }

    /// Relabel the running timer. The start time never changes.
    ///
    /// Returns `None` when the user has no running timer.
    pub async fn update_timer(
        &self,
        user_id: &str,
        labels: &TimerLabels,
    ) -> Result<Option<ActiveTimer>, AppError> {
        let result = sqlx::query(
            "UPDATE active_timers SET category_id = ?, tag_id = ?, description = ? WHERE user_id = ?",
        )
        .bind(&labels.category_id)
        .bind(&labels.tag_id)
        .bind(&labels.description)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.increment_revision().await?;
        self.get_timer(user_id).await
    }

    pub async fn get_timer(&self, user_id: &str) -> Result<Option<ActiveTimer>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_id, category_id, tag_id, description, start_time FROM active_timers WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(timer_from_row))
    }

    /// Drop the running timer without recording it. Idempotent.
    pub async fn discard_timer(&self, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM active_timers WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            self.increment_revision().await?;
        }
        Ok(removed)
    }

    /// Stop the running timer and record it in one transaction.
    ///
    /// The entry spans `start_time..end_time` (`end_time` defaults to now).
    /// `duration` overrides the measured span, for clients that paused locally.
    /// Nothing is recorded when the duration is zero. Returns `None` when there
    /// was no timer or nothing was recorded.
    pub async fn stop_and_record(
        &self,
        user_id: &str,
        end_time: Option<DateTime<Utc>>,
        duration: Option<i64>,
    ) -> Result<Option<TimeEntry>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, user_id, category_id, tag_id, description, start_time FROM active_timers WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(timer) = row.as_ref().map(timer_from_row) else {
            return Ok(None);
        };

        let end_time = end_time.unwrap_or_else(Utc::now);
        let mut view = TimerView::restore(Some(&timer));
        if let Some(elapsed) = duration {
            let paused_at = Duration::try_seconds(elapsed.max(0))
                .and_then(|d| timer.start_time.checked_add_signed(d))
                .ok_or_else(|| AppError::Validation("Duration is out of range".to_string()))?;
            view.pause(paused_at);
        }

        let entry = match view.finish(end_time) {
            Some(draft) => {
                let entry = TimeEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    user_id: timer.user_id.clone(),
                    category_id: timer.category_id.clone(),
                    tag_id: timer.tag_id.clone(),
                    description: timer.description.clone(),
                    start_time: draft.start_time,
                    end_time: Some(draft.end_time),
                    duration: draft.duration,
                };
                insert_entry(&mut *tx, &entry).await?;
                Some(entry)
            }
            None => None,
        };

        sqlx::query("DELETE FROM active_timers WHERE id = ?")
            .bind(&timer.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.increment_revision().await?;

        tracing::debug!(
            "Timer stopped for user {} ({} seconds recorded)",
            user_id,
            entry.as_ref().map(|e| e.duration).unwrap_or(0)
        );
        Ok(entry)
    }

    /// Every running timer with user, category and tag metadata, oldest first.
    pub async fn list_active_timers(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamActiveTimer>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT
                at.id, at.user_id, at.category_id, at.tag_id, at.description, at.start_time,
                u.name AS user_name,
                u.email AS user_email,
                c.name AS category_name,
                c.color AS category_color,
                t.name AS tag_name,
                t.color AS tag_color
            FROM active_timers at
            JOIN users u ON at.user_id = u.id
            JOIN categories c ON at.category_id = c.id
            LEFT JOIN tags t ON at.tag_id = t.id
            ORDER BY at.start_time ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let timer = timer_from_row(row);
                let elapsed = elapsed_seconds(timer.start_time, now);
                TeamActiveTimer {
                    timer,
                    user_name: row.get("user_name"),
                    user_email: row.get("user_email"),
                    category_name: row.get("category_name"),
                    category_color: row.get("category_color"),
                    tag_name: row.get("tag_name"),
                    tag_color: row.get("tag_color"),
                    elapsed_seconds: elapsed,
                    elapsed_display: format_clock(elapsed),
                }
            })
            .collect())
    }
}

fn timer_from_row(row: &sqlx::sqlite::SqliteRow) -> ActiveTimer {
    ActiveTimer {
        id: row.get("id"),
        user_id: row.get("user_id"),
        category_id: row.get("category_id"),
        tag_id: row.get("tag_id"),
        description: row.get("description"),
        start_time: row.get("start_time"),
    }
}
