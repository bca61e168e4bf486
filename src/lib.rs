//! DigitalNest Offer Management
//!
//! Issuance and read-back of promotional discount codes for the DigitalNest
//! marketplace platform.
//!
//! ## Features
//! - Offer issuance for clients and vendors
//! - Prefixed, human-readable offer codes with collision retry
//! - Atomic code-uniqueness enforcement at the store boundary
//! - Paginated, newest-first offer listings
//! - Pluggable storage (in-memory, Postgres)

use thiserror::Error;

pub mod domain;
pub mod service;
pub mod store;

pub use domain::offer::{
    DiscountType, IssueOfferRequest, Offer, OfferPage, OfferStatus, PageRequest, RecipientType,
};
pub use service::OfferService;
pub use store::{memory::MemoryOfferStore, postgres::PgOfferStore, OfferStore};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum OfferError {
    /// A request field is missing or violates a domain invariant. Never
    /// retried automatically; the offending fields are listed in the payload.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A caller-supplied code is already in use by another offer.
    #[error("offer code '{0}' is already in use")]
    DuplicateCode(String),

    /// Generated codes kept colliding until the retry budget ran out. The
    /// caller may retry the whole issuance request.
    #[error("could not generate a unique offer code after {attempts} attempts")]
    CodeGeneration { attempts: u32 },

    /// No offer with the requested id. An empty recipient listing is not an
    /// error, just an empty page.
    #[error("offer not found")]
    NotFound,

    /// The storage backend is unreachable or rejected the operation.
    /// Propagated as-is; retries are the caller's responsibility.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, OfferError>;
