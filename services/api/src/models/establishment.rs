//! Establishment model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Establishment entity
///
/// A reviewable workplace, deduplicated by the external `place_id` coming
/// from the place-lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Establishment {
    pub id: Uuid,
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub external_rating: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// New establishment creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEstablishment {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub external_rating: Option<f64>,
    pub tags: Vec<String>,
}
