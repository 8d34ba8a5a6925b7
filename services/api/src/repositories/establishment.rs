//! Establishment repository for database operations

use anyhow::Result;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Establishment, NewEstablishment};

/// Establishment repository
#[derive(Clone)]
pub struct EstablishmentRepository {
    pool: PgPool,
}

impl EstablishmentRepository {
    /// Create a new establishment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an establishment, or return the existing one for the same
    /// place id
    ///
    /// Dedup-on-create: the unique `place_id` constraint is the
    /// authoritative signal, so a concurrent insert for the same place
    /// resolves to the already-stored row instead of an error.
    pub async fn create_or_get(&self, new: &NewEstablishment) -> Result<Establishment> {
        let row = sqlx::query(
            r#"
            INSERT INTO establishments (id, place_id, name, address, external_rating, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (place_id) DO NOTHING
            RETURNING id, place_id, name, address, external_rating, tags, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.place_id)
        .bind(&new.name)
        .bind(&new.address)
        .bind(new.external_rating)
        .bind(Json(&new.tags))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            info!("Created establishment {}", row.get::<Uuid, _>("id"));
            return Ok(map_establishment(&row));
        }

        self.find_by_place_id(&new.place_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("establishment vanished after conflicting insert"))
    }

    /// Find an establishment by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Establishment>> {
        let row = sqlx::query(
            r#"
            SELECT id, place_id, name, address, external_rating, tags, created_at
            FROM establishments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_establishment(&row)))
    }

    /// Find an establishment by its external place id
    pub async fn find_by_place_id(&self, place_id: &str) -> Result<Option<Establishment>> {
        let row = sqlx::query(
            r#"
            SELECT id, place_id, name, address, external_rating, tags, created_at
            FROM establishments
            WHERE place_id = $1
            "#,
        )
        .bind(place_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| map_establishment(&row)))
    }

    /// Delete an establishment
    ///
    /// Its reviews go with it through the foreign-key cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting establishment {}", id);

        let result = sqlx::query("DELETE FROM establishments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_establishment(row: &sqlx::postgres::PgRow) -> Establishment {
    Establishment {
        id: row.get("id"),
        place_id: row.get("place_id"),
        name: row.get("name"),
        address: row.get("address"),
        external_rating: row.get("external_rating"),
        tags: row.get::<Json<Vec<String>>, _>("tags").0,
        created_at: row.get("created_at"),
    }
}
