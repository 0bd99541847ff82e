//! User repository for gator.

use chrono::Utc;
use uuid::Uuid;

use super::user::User;
use super::DbPool;
use crate::error::is_unique_violation;
use crate::{GatorError, Result};

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Fails with [`GatorError::AlreadyExists`] if the name is taken.
    pub async fn create(&self, name: &str) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query("INSERT INTO users (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&user.name)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    GatorError::AlreadyExists(format!("user {name}"))
                } else {
                    GatorError::Database(e.to_string())
                }
            })?;

        Ok(user)
    }

    /// Get a user by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List all users ordered by name.
    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Delete every user. Feeds, follows and posts go with them.
    ///
    /// Returns the number of users deleted.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
