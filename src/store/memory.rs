//! In-memory offer store
//!
//! Backs the test suite and local demos. A single mutex guards both the
//! record vector and the code index, so the uniqueness check and the insert
//! are one atomic step.

use std::collections::HashSet;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::offer::{Offer, OfferStatus, RecipientType};
use crate::store::OfferStore;
use crate::{OfferError, Result};

#[derive(Default)]
struct Inner {
    /// Insertion order doubles as the issuance-order tie-break.
    offers: Vec<Offer>,
    codes: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryOfferStore {
    inner: Mutex<Inner>,
}

impl MemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OfferStore for MemoryOfferStore {
    async fn append(&self, offer: Offer) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.codes.contains(&offer.code) {
            return Err(OfferError::DuplicateCode(offer.code));
        }
        inner.codes.insert(offer.code.clone());
        inner.offers.push(offer);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>> {
        let inner = self.inner.lock().await;
        Ok(inner.offers.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Offer>> {
        let inner = self.inner.lock().await;
        Ok(inner.offers.iter().find(|o| o.code == code).cloned())
    }

    async fn list_by_recipient(
        &self,
        recipient_type: RecipientType,
        recipient_id: &str,
    ) -> Result<Vec<Offer>> {
        let inner = self.inner.lock().await;
        let mut matches: Vec<(usize, Offer)> = inner
            .offers
            .iter()
            .enumerate()
            .filter(|(_, o)| o.recipient_type == recipient_type && o.recipient_id == recipient_id)
            .map(|(i, o)| (i, o.clone()))
            .collect();
        matches.sort_by(|(ia, a), (ib, b)| {
            b.date_issued
                .cmp(&a.date_issued)
                .then_with(|| ib.cmp(ia))
        });
        Ok(matches.into_iter().map(|(_, o)| o).collect())
    }

    async fn update_status(&self, id: Uuid, status: OfferStatus) -> Result<Offer> {
        let mut inner = self.inner.lock().await;
        let offer = inner
            .offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OfferError::NotFound)?;
        offer.status = status;
        Ok(offer.clone())
    }
}
