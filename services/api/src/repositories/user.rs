//! User repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by email, creating it if absent
    ///
    /// The insert relies on the unique email constraint: on conflict the
    /// existing row wins and is returned unchanged, so concurrent requests
    /// for the same email cannot create duplicates.
    pub async fn find_or_create(&self, email: &str, pseudo: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, pseudo)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, pseudo, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(pseudo)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            info!("Created user {}", row.get::<Uuid, _>("id"));
            return Ok(map_user(&row));
        }

        let row = sqlx::query(
            r#"
            SELECT id, email, pseudo, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_user(&row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, pseudo, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_user(&row)))
    }

    /// Delete a user
    ///
    /// Login tokens, sessions, and reviews follow through the foreign-key
    /// cascades.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting user {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        pseudo: row.get("pseudo"),
        created_at: row.get("created_at"),
    }
}
