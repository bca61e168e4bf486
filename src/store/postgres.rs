//! Postgres-backed offer store
//!
//! The `UNIQUE` index on `code` makes `append` atomic with respect to the
//! uniqueness invariant; a monotonic `seq` column provides the issuance-order
//! tie-break for newest-first listings.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::offer::{DiscountType, Offer, OfferStatus, RecipientType};
use crate::store::OfferStore;
use crate::{OfferError, Result};

const COLUMNS: &str =
    "id, recipient_type, recipient_id, code, discount_type, value, portal, status, date_issued";

#[derive(Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    recipient_type: String,
    recipient_id: String,
    code: String,
    discount_type: String,
    value: f64,
    portal: String,
    status: String,
    date_issued: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = OfferError;

    fn try_from(row: OfferRow) -> Result<Self> {
        let recipient_type = RecipientType::parse(&row.recipient_type)
            .ok_or_else(|| storage_invalid("recipient_type", &row.recipient_type))?;
        let discount_type = DiscountType::parse(&row.discount_type)
            .ok_or_else(|| storage_invalid("discount_type", &row.discount_type))?;
        let status = OfferStatus::parse(&row.status)
            .ok_or_else(|| storage_invalid("status", &row.status))?;
        Ok(Offer {
            id: row.id,
            recipient_type,
            recipient_id: row.recipient_id,
            code: row.code,
            discount_type,
            value: row.value,
            portal: row.portal,
            status,
            date_issued: row.date_issued,
        })
    }
}

fn storage_invalid(column: &str, value: &str) -> OfferError {
    OfferError::Storage(format!("unexpected {column} value '{value}' in offers row"))
}

fn storage_err(e: sqlx::Error) -> OfferError {
    OfferError::Storage(e.to_string())
}

impl OfferStore for PgOfferStore {
    async fn append(&self, offer: Offer) -> Result<()> {
        sqlx::query(
            "INSERT INTO offers (id, recipient_type, recipient_id, code, discount_type, value, portal, status, date_issued) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(offer.id)
        .bind(offer.recipient_type.as_str())
        .bind(&offer.recipient_id)
        .bind(&offer.code)
        .bind(offer.discount_type.as_str())
        .bind(offer.value)
        .bind(&offer.portal)
        .bind(offer.status.as_str())
        .bind(offer.date_issued)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                OfferError::DuplicateCode(offer.code.clone())
            }
            other => storage_err(other),
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {COLUMNS} FROM offers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Offer::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {COLUMNS} FROM offers WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Offer::try_from).transpose()
    }

    async fn list_by_recipient(
        &self,
        recipient_type: RecipientType,
        recipient_id: &str,
    ) -> Result<Vec<Offer>> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {COLUMNS} FROM offers \
             WHERE recipient_type = $1 AND recipient_id = $2 \
             ORDER BY date_issued DESC, seq DESC"
        ))
        .bind(recipient_type.as_str())
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.into_iter().map(Offer::try_from).collect()
    }

    async fn update_status(&self, id: Uuid, status: OfferStatus) -> Result<Offer> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "UPDATE offers SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.map(Offer::try_from)
            .transpose()?
            .ok_or(OfferError::NotFound)
    }
}
