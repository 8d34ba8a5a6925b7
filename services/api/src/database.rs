//! Schema bootstrap for the API service
//!
//! All cross-request invariants live here as constraints: unique token
//! fingerprints, the one-review-per-(establishment, user) rule, and
//! cascading deletion through foreign keys. Application code never
//! re-implements these with check-then-act logic.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        pseudo TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS login_tokens (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL UNIQUE,
        expires_at TIMESTAMPTZ NOT NULL,
        used_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL UNIQUE,
        expires_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS establishments (
        id UUID PRIMARY KEY,
        place_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        address TEXT,
        external_rating DOUBLE PRECISION,
        tags JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY,
        establishment_id UUID NOT NULL REFERENCES establishments(id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        score DOUBLE PRECISION,
        comment TEXT NOT NULL,
        role TEXT,
        contract TEXT,
        housing TEXT,
        housing_quality TEXT,
        split_shift BOOLEAN NOT NULL DEFAULT false,
        unpaid_overtime BOOLEAN NOT NULL DEFAULT false,
        toxic_manager BOOLEAN NOT NULL DEFAULT false,
        harassment BOOLEAN NOT NULL DEFAULT false,
        recommend BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT uq_review_establishment_user UNIQUE (establishment_id, user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_establishment ON reviews(establishment_id)",
    "CREATE INDEX IF NOT EXISTS idx_login_tokens_user ON login_tokens(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
];

/// Create the service tables if they do not exist yet
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}
