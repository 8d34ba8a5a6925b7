//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
///
/// Users own login tokens, sessions, and reviews; all three are removed by
/// cascade when the user row is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub pseudo: String,
    pub created_at: DateTime<Utc>,
}
