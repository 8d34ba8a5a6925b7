//! Review repository for database operations

use anyhow::{Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Housing, HousingQuality, Review, ReviewFields, ReviewWithAuthor};

/// Review repository
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review, or replace the author's existing review of the
    /// same establishment
    ///
    /// A single statement guarded by the (establishment_id, user_id)
    /// unique constraint: concurrent submissions from the same user cannot
    /// produce two rows, and a replacement keeps the original `id` and
    /// `created_at`.
    pub async fn upsert(
        &self,
        establishment_id: Uuid,
        user_id: Uuid,
        fields: &ReviewFields,
    ) -> Result<Review> {
        let row = sqlx::query(
            r#"
            INSERT INTO reviews (
                id, establishment_id, user_id, score, comment, role, contract,
                housing, housing_quality, split_shift, unpaid_overtime,
                toxic_manager, harassment, recommend
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT ON CONSTRAINT uq_review_establishment_user DO UPDATE SET
                score = EXCLUDED.score,
                comment = EXCLUDED.comment,
                role = EXCLUDED.role,
                contract = EXCLUDED.contract,
                housing = EXCLUDED.housing,
                housing_quality = EXCLUDED.housing_quality,
                split_shift = EXCLUDED.split_shift,
                unpaid_overtime = EXCLUDED.unpaid_overtime,
                toxic_manager = EXCLUDED.toxic_manager,
                harassment = EXCLUDED.harassment,
                recommend = EXCLUDED.recommend
            RETURNING id, establishment_id, user_id, score, comment, role, contract,
                      housing, housing_quality, split_shift, unpaid_overtime,
                      toxic_manager, harassment, recommend, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(establishment_id)
        .bind(user_id)
        .bind(fields.score)
        .bind(&fields.comment)
        .bind(&fields.role)
        .bind(&fields.contract)
        .bind(fields.housing.map(|h| h.as_str()))
        .bind(fields.housing_quality.map(|q| q.as_str()))
        .bind(fields.split_shift)
        .bind(fields.unpaid_overtime)
        .bind(fields.toxic_manager)
        .bind(fields.harassment)
        .bind(fields.recommend)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Stored review {} for establishment {}",
            row.get::<Uuid, _>("id"),
            establishment_id
        );
        map_review(&row)
    }

    /// Find a review by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query(
            r#"
            SELECT id, establishment_id, user_id, score, comment, role, contract,
                   housing, housing_quality, split_shift, unpaid_overtime,
                   toxic_manager, harassment, recommend, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_review(&row)).transpose()
    }

    /// Delete a review
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting review {}", id);

        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all reviews for an establishment, newest first
    pub async fn list_for_establishment(
        &self,
        establishment_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.establishment_id, r.user_id, r.score, r.comment, r.role,
                   r.contract, r.housing, r.housing_quality, r.split_shift,
                   r.unpaid_overtime, r.toxic_manager, r.harassment, r.recommend,
                   r.created_at, u.pseudo AS author_pseudo
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.establishment_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ReviewWithAuthor {
                    review: map_review(&row)?,
                    author_pseudo: row.get("author_pseudo"),
                })
            })
            .collect()
    }
}

fn map_review(row: &sqlx::postgres::PgRow) -> Result<Review> {
    Ok(Review {
        id: row.get("id"),
        establishment_id: row.get("establishment_id"),
        user_id: row.get("user_id"),
        score: row.get("score"),
        comment: row.get("comment"),
        role: row.get("role"),
        contract: row.get("contract"),
        housing: parse_categorical::<Housing>(row.get("housing"), "housing")?,
        housing_quality: parse_categorical::<HousingQuality>(
            row.get("housing_quality"),
            "housing_quality",
        )?,
        split_shift: row.get("split_shift"),
        unpaid_overtime: row.get("unpaid_overtime"),
        toxic_manager: row.get("toxic_manager"),
        harassment: row.get("harassment"),
        recommend: row.get("recommend"),
        created_at: row.get("created_at"),
    })
}

fn parse_categorical<T>(value: Option<String>, column: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| anyhow!("corrupt {column} column: {e}"))
        })
        .transpose()
}
