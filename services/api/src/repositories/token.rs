//! Login-token and session repositories
//!
//! Both stores key their rows by the SHA-256 fingerprint of the raw
//! credential; the raw value is returned to the caller exactly once at
//! issue time and never stored.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{LoginToken, Session};
use crate::token;

/// Repository for single-use magic-link tokens
#[derive(Clone)]
pub struct LoginTokenRepository {
    pool: PgPool,
}

impl LoginTokenRepository {
    /// Create a new login token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a login token for a user
    ///
    /// Returns the raw token; it cannot be retrieved again afterwards.
    pub async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String> {
        let raw = token::generate();
        let token_hash = token::fingerprint(&raw);
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO login_tokens (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!("Issued login token for user {}", user_id);
        Ok(raw)
    }

    /// Find a login token by its fingerprint
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<LoginToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM login_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| LoginToken {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            used_at: row.get("used_at"),
            created_at: row.get("created_at"),
        }))
    }

    /// Mark a login token consumed
    ///
    /// The update is conditional on `used_at IS NULL`, so under concurrent
    /// verification of the same token exactly one caller observes `true`;
    /// the loser gets `false`.
    pub async fn consume(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE login_tokens
            SET used_at = $2
            WHERE id = $1 AND used_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for long-lived authenticated sessions
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a session for a user and return the raw bearer value
    ///
    /// A fingerprint collision violates the unique constraint and surfaces
    /// as an error; with 256 bits of entropy that is not a practical
    /// concern.
    pub async fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String> {
        let raw = token::generate();
        let token_hash = token::fingerprint(&raw);
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!("Created session for user {}", user_id);
        Ok(raw)
    }

    /// Find a session by its fingerprint
    ///
    /// Indexed lookup; this runs on every protected request.
    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Session {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        }))
    }

    /// Delete the session matching a fingerprint, if any
    ///
    /// Idempotent: revoking an unknown or already-revoked session is not an
    /// error.
    pub async fn revoke_by_hash(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
