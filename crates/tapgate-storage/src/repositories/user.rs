#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::User;
use sqlx::SqlitePool;
use tapgate_core::BadgeId;

/// Repository trait for User entity operations
///
/// The ingestion pipeline only reads users; `create` exists for admin
/// provisioning and test seeding.
pub trait UserRepository: Send + Sync {
    /// Find a user by badge UID
    async fn find_by_badge(&self, badge: &BadgeId) -> StorageResult<Option<User>>;

    /// Find a user by their ID
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>>;

    /// Get all active users
    async fn find_all_active(&self) -> StorageResult<Vec<User>>;

    /// Create a new user
    async fn create(&self, user: &User) -> StorageResult<i64>;

    /// Deactivate a user by ID
    async fn deactivate(&self, id: i64) -> StorageResult<()>;
}

/// SQLite implementation of UserRepository
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Create a new SQLite user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn find_by_badge(&self, badge: &BadgeId) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, badge_uid, email, password_hash,
                   is_active, is_admin, created_at
            FROM users
            WHERE badge_uid = ?
            "#,
        )
        .bind(badge.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, badge_uid, email, password_hash,
                   is_active, is_admin, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_all_active(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, badge_uid, email, password_hash,
                   is_active, is_admin, created_at
            FROM users
            WHERE is_active = 1
            ORDER BY full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, user: &User) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (full_name, badge_uid, email, password_hash, is_active, is_admin)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.badge_uid)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn deactivate(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", "id", id));
        }

        Ok(())
    }
}
