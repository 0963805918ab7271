//! Database repository for CRUD operations.
//!
//! Every successful write bumps the revision counter in `meta`. Time entries,
//! active timers and rooms live in sibling modules as further `impl` blocks.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::config::BootstrapAdmin;
use crate::errors::AppError;
use crate::format::to_storage;
use crate::models::{
    Category, CreateLabelRequest, CreateUserRequest, RevisionInfo, Role, Tag, UpdateLabelRequest,
    User,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(crate) pool: SqlitePool,
}

/// Which label table a shared operation targets.
#[derive(Debug, Clone, Copy)]
enum LabelKind {
    Category,
    Tag,
}

impl LabelKind {
    fn table(self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Tag => "tags",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            LabelKind::Category => "Category",
            LabelKind::Tag => "Tag",
        }
    }
}

/// Normalized form used for storing and looking up emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = to_storage(Utc::now());
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== USER OPERATIONS ====================

    /// List all users, ordered by name.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, name, role, created_at FROM users ORDER BY name ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, email, name, role, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Look up a user and their password hash for login.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, name, role, created_at, password_hash FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| (user_from_row(&row), row.get("password_hash"))))
    }

    /// The stored password hash of a user.
    pub async fn get_password_hash(&self, id: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("password_hash")))
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Create a user. Duplicate emails surface as [`AppError::Conflict`].
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let email = normalize_email(&request.email);
        let name = request.name.trim().to_string();

        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(&name)
        .bind(password_hash)
        .bind(request.role.as_str())
        .bind(to_storage(now))
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("A user with email {} already exists", email))
            }
            other => other,
        })?;

        self.increment_revision().await?;

        Ok(User {
            id,
            email,
            name,
            role: request.role,
            created_at: now,
        })
    }

    /// Patch name, role and optionally the password hash.
    pub async fn update_user(
        &self,
        id: &str,
        name: Option<&str>,
        role: Option<Role>,
        password_hash: Option<&str>,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let name = name.map(str::trim).unwrap_or(&existing.name).to_string();
        let role = role.unwrap_or(existing.role);

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET name = ?, role = ? WHERE id = ?")
            .bind(&name)
            .bind(role.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if let Some(hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
                .bind(hash)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.increment_revision().await?;

        Ok(User {
            name,
            role,
            ..existing
        })
    }

    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Delete a user. Entries, timer and room membership cascade.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Create the configured admin when no user exists yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        if self.count_users().await? > 0 {
            return Ok(None);
        }

        let request = CreateUserRequest {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password: String::new(),
            role: Role::Admin,
        };
        self.create_user(&request, password_hash).await.map(Some)
    }

    // ==================== CATEGORY OPERATIONS ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows = self.list_labels(LabelKind::Category).await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let row = self.get_label(LabelKind::Category, id).await?;
        Ok(row.as_ref().map(category_from_row))
    }

    pub async fn create_category(&self, request: &CreateLabelRequest) -> Result<Category, AppError> {
        let (id, name, color, created_at) = self.insert_label(LabelKind::Category, request).await?;
        Ok(Category {
            id,
            name,
            color,
            created_at,
        })
    }

    pub async fn update_category(
        &self,
        id: &str,
        request: &UpdateLabelRequest,
    ) -> Result<Category, AppError> {
        let existing = self
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        let name = request.name.as_deref().map(str::trim).unwrap_or(&existing.name).to_string();
        let color = request.color.clone().unwrap_or(existing.color);
        self.write_label(LabelKind::Category, id, &name, &color).await?;

        Ok(Category {
            id: existing.id,
            name,
            color,
            created_at: existing.created_at,
        })
    }

    /// Delete a category.
    ///
    /// Refused when it is the last category or when any time entry or active
    /// timer still references it.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM categories")
            .fetch_one(&mut *tx)
            .await?
            .get("n");
        if total <= 1 {
            return Err(AppError::Validation(
                "Cannot delete the last category".to_string(),
            ));
        }

        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM time_entries WHERE category_id = ?1) AS entries,
                (SELECT COUNT(*) FROM active_timers WHERE category_id = ?1) AS timers
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let entries: i64 = row.get("entries");
        let timers: i64 = row.get("timers");
        if entries > 0 || timers > 0 {
            return Err(AppError::Validation(format!(
                "Category is in use by {} time entries and {} running timers",
                entries, timers
            )));
        }

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== TAG OPERATIONS ====================

    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let rows = self.list_labels(LabelKind::Tag).await?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    pub async fn get_tag(&self, id: &str) -> Result<Option<Tag>, AppError> {
        let row = self.get_label(LabelKind::Tag, id).await?;
        Ok(row.as_ref().map(tag_from_row))
    }

    pub async fn create_tag(&self, request: &CreateLabelRequest) -> Result<Tag, AppError> {
        let (id, name, color, created_at) = self.insert_label(LabelKind::Tag, request).await?;
        Ok(Tag {
            id,
            name,
            color,
            created_at,
        })
    }

    pub async fn update_tag(&self, id: &str, request: &UpdateLabelRequest) -> Result<Tag, AppError> {
        let existing = self
            .get_tag(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;

        let name = request.name.as_deref().map(str::trim).unwrap_or(&existing.name).to_string();
        let color = request.color.clone().unwrap_or(existing.color);
        self.write_label(LabelKind::Tag, id, &name, &color).await?;

        Ok(Tag {
            id: existing.id,
            name,
            color,
            created_at: existing.created_at,
        })
    }

    /// Delete a tag. References on entries and timers are cleared by the schema.
    pub async fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== LABEL HELPERS ====================

    async fn list_labels(&self, kind: LabelKind) -> Result<Vec<sqlx::sqlite::SqliteRow>, AppError> {
        let sql = format!(
            "SELECT id, name, color, created_at FROM {} ORDER BY created_at ASC, rowid ASC",
            kind.table()
        );
        Ok(sqlx::query(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_label(
        &self,
        kind: LabelKind,
        id: &str,
    ) -> Result<Option<sqlx::sqlite::SqliteRow>, AppError> {
        let sql = format!(
            "SELECT id, name, color, created_at FROM {} WHERE id = ?",
            kind.table()
        );
        Ok(sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_label(
        &self,
        kind: LabelKind,
        request: &CreateLabelRequest,
    ) -> Result<(String, String, String, chrono::DateTime<Utc>), AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let name = request.name.trim().to_string();

        let sql = format!(
            "INSERT INTO {} (id, name, color, created_at) VALUES (?, ?, ?, ?)",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(&name)
            .bind(&request.color)
            .bind(to_storage(now))
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;
        tracing::debug!("{} {} created", kind.noun(), id);

        Ok((id, name, request.color.clone(), now))
    }

    async fn write_label(
        &self,
        kind: LabelKind,
        id: &str,
        name: &str,
        color: &str,
    ) -> Result<(), AppError> {
        let sql = format!("UPDATE {} SET name = ?, color = ? WHERE id = ?", kind.table());
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(color)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", kind.noun(), id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

// Helper functions for row conversion

pub(crate) fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role: Role::parse(&role),
        created_at: row.get("created_at"),
    }
}

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

fn tag_from_row(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}
