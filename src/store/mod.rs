//! Offer storage
//!
//! The store exclusively owns the offer collection: query results are copies,
//! callers never hold references into it. Code uniqueness is enforced inside
//! `append` as one atomic step (a read-then-write check at the caller would be
//! racy under concurrent issuance).

use uuid::Uuid;

use crate::domain::offer::{Offer, OfferStatus, RecipientType};
use crate::Result;

pub mod memory;
pub mod postgres;

#[allow(async_fn_in_trait)]
pub trait OfferStore: Send + Sync {
    /// Append a new offer. Fails with [`crate::OfferError::DuplicateCode`]
    /// when another offer already carries the same code.
    async fn append(&self, offer: Offer) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Offer>>;

    /// All offers for one recipient, newest first: `date_issued` descending,
    /// issuance order descending as tie-break.
    async fn list_by_recipient(
        &self,
        recipient_type: RecipientType,
        recipient_id: &str,
    ) -> Result<Vec<Offer>>;

    /// Set the status of an existing offer, returning the updated record.
    /// Fails with [`crate::OfferError::NotFound`] when the id is unknown.
    async fn update_status(&self, id: Uuid, status: OfferStatus) -> Result<Offer>;
}
