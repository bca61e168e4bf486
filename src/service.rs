//! Offer issuance and query service
//!
//! Validates typed requests at the boundary, assigns identity and timestamps,
//! delegates durability and code uniqueness to the store, and paginates the
//! read side.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::code;
use crate::domain::offer::{
    IssueOfferRequest, Offer, OfferPage, OfferStatus, PageRequest, RecipientType,
};
use crate::store::OfferStore;
use crate::{OfferError, Result};

/// Attempts at generating a non-colliding code before giving up.
const MAX_CODE_ATTEMPTS: u32 = 5;

pub struct OfferService<S> {
    store: S,
}

impl<S: OfferStore> OfferService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn issue_client_offer(
        &self,
        client_id: &str,
        request: IssueOfferRequest,
    ) -> Result<Offer> {
        self.issue(RecipientType::Client, client_id, request).await
    }

    pub async fn issue_vendor_offer(
        &self,
        vendor_id: &str,
        request: IssueOfferRequest,
    ) -> Result<Offer> {
        self.issue(RecipientType::Vendor, vendor_id, request).await
    }

    pub async fn client_offer_page(&self, client_id: &str, page: PageRequest) -> Result<OfferPage> {
        self.page(RecipientType::Client, client_id, page).await
    }

    pub async fn vendor_offer_page(&self, vendor_id: &str, page: PageRequest) -> Result<OfferPage> {
        self.page(RecipientType::Vendor, vendor_id, page).await
    }

    pub async fn get_offer(&self, id: Uuid) -> Result<Offer> {
        self.store.find_by_id(id).await?.ok_or(OfferError::NotFound)
    }

    /// Status mutation hook for the external redemption collaborator. No
    /// transition rules are enforced here; redemption semantics live with
    /// that collaborator.
    pub async fn set_status(&self, id: Uuid, status: OfferStatus) -> Result<Offer> {
        let offer = self.store.update_status(id, status).await?;
        info!(offer_id = %offer.id, status = status.as_str(), "offer status updated");
        Ok(offer)
    }

    async fn issue(
        &self,
        recipient_type: RecipientType,
        recipient_id: &str,
        request: IssueOfferRequest,
    ) -> Result<Offer> {
        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        if recipient_id.trim().is_empty() {
            let mut error = ValidationError::new("length");
            error.message = Some("recipient_id must not be empty".into());
            errors.add("recipient_id".into(), error);
        }
        if !errors.is_empty() {
            return Err(OfferError::Validation(errors));
        }

        let offer = Offer {
            id: Uuid::now_v7(),
            recipient_type,
            recipient_id: recipient_id.to_string(),
            code: String::new(),
            discount_type: request.discount_type,
            value: request.value,
            portal: request.portal,
            status: OfferStatus::Sent,
            date_issued: Utc::now(),
        };

        let offer = match request.code {
            // A caller-supplied code is used verbatim; a collision is the
            // caller's mistake, not a reason to retry.
            Some(code) => {
                let offer = Offer { code, ..offer };
                self.store.append(offer.clone()).await?;
                offer
            }
            None => self.append_with_generated_code(offer).await?,
        };

        info!(
            offer_id = %offer.id,
            recipient_type = offer.recipient_type.as_str(),
            recipient_id = %offer.recipient_id,
            code = %offer.code,
            "offer issued"
        );
        Ok(offer)
    }

    async fn append_with_generated_code(&self, offer: Offer) -> Result<Offer> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = Offer {
                code: code::generate(offer.recipient_type.code_prefix()),
                ..offer.clone()
            };
            match self.store.append(candidate.clone()).await {
                Ok(()) => return Ok(candidate),
                Err(OfferError::DuplicateCode(code)) => {
                    tracing::warn!(code = %code, attempt, "generated offer code collided, retrying");
                }
                Err(other) => return Err(other),
            }
        }
        Err(OfferError::CodeGeneration {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    async fn page(
        &self,
        recipient_type: RecipientType,
        recipient_id: &str,
        page: PageRequest,
    ) -> Result<OfferPage> {
        page.validate()?;

        let all = self
            .store
            .list_by_recipient(recipient_type, recipient_id)
            .await?;
        let total_items = all.len() as u64;
        let size = page.page_size as usize;
        let total_pages = (all.len().div_ceil(size)) as u32;

        let start = (page.page as usize - 1).saturating_mul(size);
        // past-the-end pages come back empty rather than erroring
        let items = if start >= all.len() {
            Vec::new()
        } else {
            all.into_iter().skip(start).take(size).collect()
        };

        Ok(OfferPage {
            items,
            total_items,
            total_pages,
            page: page.page,
            page_size: page.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::offer::DiscountType;
    use crate::store::memory::MemoryOfferStore;

    fn service() -> OfferService<MemoryOfferStore> {
        OfferService::new(MemoryOfferStore::new())
    }

    fn percentage(value: f64) -> IssueOfferRequest {
        IssueOfferRequest {
            discount_type: DiscountType::Percentage,
            value,
            portal: "All Portals".into(),
            code: None,
        }
    }

    fn amount(value: f64) -> IssueOfferRequest {
        IssueOfferRequest {
            discount_type: DiscountType::FixedAmount,
            value,
            portal: "NestMall".into(),
            code: None,
        }
    }

    #[tokio::test]
    async fn test_issue_assigns_identity_code_and_status() {
        let svc = service();
        let offer = svc.issue_client_offer("c1", percentage(15.0)).await.unwrap();

        assert!(offer.code.starts_with("DNEST-"));
        assert_eq!(offer.status, OfferStatus::Sent);
        assert_eq!(offer.recipient_type, RecipientType::Client);
        assert_eq!(offer.recipient_id, "c1");
        assert_eq!(offer.value, 15.0);
    }

    #[tokio::test]
    async fn test_vendor_offers_use_vendor_prefix() {
        let svc = service();
        let offer = svc.issue_vendor_offer("v1", amount(500.0)).await.unwrap();
        assert!(offer.code.starts_with("VNEST-"));
        assert_eq!(offer.recipient_type, RecipientType::Vendor);
    }

    #[tokio::test]
    async fn test_issued_codes_are_unique() {
        let svc = service();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..50 {
            let offer = svc.issue_client_offer("c1", percentage(5.0)).await.unwrap();
            assert!(codes.insert(offer.code), "duplicate code issued");
        }
    }

    #[tokio::test]
    async fn test_non_positive_value_is_rejected_for_both_discount_types() {
        let svc = service();
        for value in [0.0, -5.0] {
            for req in [percentage(value), amount(value)] {
                let err = svc.issue_client_offer("c1", req).await.unwrap_err();
                assert!(matches!(err, OfferError::Validation(_)));
            }
        }
    }

    #[tokio::test]
    async fn test_empty_recipient_and_portal_are_rejected() {
        let svc = service();
        let err = svc.issue_client_offer("  ", percentage(10.0)).await.unwrap_err();
        match err {
            OfferError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("recipient_id"));
            }
            other => panic!("expected validation error, got {other}"),
        }

        let mut req = percentage(10.0);
        req.portal = String::new();
        let err = svc.issue_client_offer("c1", req).await.unwrap_err();
        assert!(matches!(err, OfferError::Validation(_)));
    }

    #[tokio::test]
    async fn test_caller_supplied_code_is_kept_and_collisions_surface() {
        let svc = service();
        let mut req = percentage(10.0);
        req.code = Some("SUMMER-2026".into());
        let offer = svc.issue_client_offer("c1", req.clone()).await.unwrap();
        assert_eq!(offer.code, "SUMMER-2026");

        let err = svc.issue_client_offer("c2", req).await.unwrap_err();
        assert!(matches!(err, OfferError::DuplicateCode(code) if code == "SUMMER-2026"));
    }

    #[tokio::test]
    async fn test_refetch_preserves_identity_and_fields() {
        let svc = service();
        let issued = svc.issue_client_offer("c1", amount(500.0)).await.unwrap();

        let fetched = svc.get_offer(issued.id).await.unwrap();
        assert_eq!(fetched, issued);

        let listed = svc
            .client_offer_page("c1", PageRequest::new(1, 5))
            .await
            .unwrap();
        assert_eq!(listed.items, vec![issued]);
    }

    #[tokio::test]
    async fn test_get_offer_unknown_id_is_not_found() {
        let svc = service();
        let err = svc.get_offer(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, OfferError::NotFound));
    }

    #[tokio::test]
    async fn test_pagination_covers_every_offer_exactly_once_newest_first() {
        let svc = service();
        for _ in 0..7 {
            svc.issue_client_offer("c1", percentage(5.0)).await.unwrap();
        }

        let mut seen = Vec::new();
        for page in 1..=3 {
            let p = svc
                .client_offer_page("c1", PageRequest::new(page, 3))
                .await
                .unwrap();
            assert_eq!(p.total_items, 7);
            assert_eq!(p.total_pages, 3);
            seen.extend(p.items);
        }
        assert_eq!(seen.len(), 7);

        let ids: std::collections::HashSet<_> = seen.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 7, "duplicates across pages");
        assert!(
            seen.windows(2).all(|w| w[0].date_issued >= w[1].date_issued),
            "pages are not newest-first"
        );
    }

    #[tokio::test]
    async fn test_empty_recipient_has_zero_pages() {
        let svc = service();
        for page in [1, 7] {
            let p = svc
                .client_offer_page("nobody", PageRequest::new(page, 5))
                .await
                .unwrap();
            assert!(p.items.is_empty());
            assert_eq!(p.total_items, 0);
            assert_eq!(p.total_pages, 0);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_empty_not_an_error() {
        let svc = service();
        svc.issue_client_offer("c1", percentage(15.0)).await.unwrap();
        svc.issue_client_offer("c1", amount(500.0)).await.unwrap();

        let p = svc
            .client_offer_page("c1", PageRequest::new(2, 5))
            .await
            .unwrap();
        assert!(p.items.is_empty());
        assert_eq!(p.total_items, 2);
        assert_eq!(p.total_pages, 1);
    }

    #[tokio::test]
    async fn test_page_zero_is_a_validation_error() {
        let svc = service();
        let err = svc
            .client_offer_page("c1", PageRequest::new(0, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::Validation(_)));
        let err = svc
            .client_offer_page("c1", PageRequest::new(1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::Validation(_)));
    }

    #[tokio::test]
    async fn test_clients_and_vendors_are_partitioned() {
        let svc = service();
        svc.issue_client_offer("x1", percentage(10.0)).await.unwrap();
        svc.issue_vendor_offer("x1", percentage(20.0)).await.unwrap();

        let clients = svc
            .client_offer_page("x1", PageRequest::new(1, 10))
            .await
            .unwrap();
        let vendors = svc
            .vendor_offer_page("x1", PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(clients.total_items, 1);
        assert_eq!(vendors.total_items, 1);
        assert_eq!(clients.items[0].value, 10.0);
        assert_eq!(vendors.items[0].value, 20.0);
    }

    #[tokio::test]
    async fn test_status_update_is_visible_on_refetch() {
        let svc = service();
        let issued = svc.issue_client_offer("c1", percentage(15.0)).await.unwrap();

        let updated = svc.set_status(issued.id, OfferStatus::Redeemed).await.unwrap();
        assert_eq!(updated.status, OfferStatus::Redeemed);

        let fetched = svc.get_offer(issued.id).await.unwrap();
        assert_eq!(fetched.status, OfferStatus::Redeemed);
        // identity untouched by the mutation
        assert_eq!(fetched.id, issued.id);
        assert_eq!(fetched.code, issued.code);
        assert_eq!(fetched.recipient_id, issued.recipient_id);
    }

    /// Store double whose appends always collide, to exercise the bounded
    /// retry budget.
    struct AlwaysColliding;

    impl OfferStore for AlwaysColliding {
        async fn append(&self, offer: Offer) -> Result<()> {
            Err(OfferError::DuplicateCode(offer.code))
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Offer>> {
            Ok(None)
        }
        async fn find_by_code(&self, _code: &str) -> Result<Option<Offer>> {
            Ok(None)
        }
        async fn list_by_recipient(
            &self,
            _recipient_type: RecipientType,
            _recipient_id: &str,
        ) -> Result<Vec<Offer>> {
            Ok(Vec::new())
        }
        async fn update_status(&self, _id: Uuid, _status: OfferStatus) -> Result<Offer> {
            Err(OfferError::NotFound)
        }
    }

    #[tokio::test]
    async fn test_code_generation_gives_up_after_bounded_attempts() {
        let svc = OfferService::new(AlwaysColliding);
        let err = svc.issue_client_offer("c1", percentage(10.0)).await.unwrap_err();
        assert!(matches!(
            err,
            OfferError::CodeGeneration {
                attempts: MAX_CODE_ATTEMPTS
            }
        ));
    }
}
