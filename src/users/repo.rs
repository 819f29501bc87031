use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, User, UserUpdate};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_active, is_verified, created_at, updated_at";

/// Access to the `users` table. Lookups and counts only see active rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, new_user: &NewUser) -> anyhow::Result<User>;
    /// Returns `None` when no active user has this id.
    async fn update(&self, id: i32, changes: &UserUpdate) -> anyhow::Result<Option<User>>;
    /// Soft delete. Returns `false` if the user was already inactive or missing.
    async fn deactivate(&self, id: i32) -> anyhow::Result<bool>;
    async fn count_active(&self) -> anyhow::Result<i64>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND is_active = TRUE"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create(&self, new_user: &NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update(&self, id: i32, changes: &UserUpdate) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email       = COALESCE($2, email),
                   first_name  = COALESCE($3, first_name),
                   last_name   = COALESCE($4, last_name),
                   is_verified = COALESCE($5, is_verified),
                   updated_at  = now()
             WHERE id = $1 AND is_active = TRUE
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.is_verified)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;
        Ok(user)
    }

    async fn deactivate(&self, id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET is_active = FALSE, updated_at = now()
             WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("deactivate user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_active(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
            .fetch_one(&self.db)
            .await
            .context("count active users")?;
        Ok(count)
    }
}
