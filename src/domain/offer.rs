//! Offer records and the typed request/response structs at the service boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A discount code issued to a client or a vendor.
///
/// `id`, `recipient_type` and `recipient_id` are set once at issuance and
/// never change. `status` is the only field an external collaborator may
/// mutate afterwards (redemption).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub recipient_type: RecipientType,
    pub recipient_id: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: f64,
    pub portal: String,
    pub status: OfferStatus,
    pub date_issued: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    Client,
    Vendor,
}

impl RecipientType {
    /// Code prefix for this recipient category.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::Client => "DNEST",
            Self::Vendor => "VNEST",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Self::Client),
            "vendor" => Some(Self::Vendor),
            _ => None,
        }
    }
}

/// How `Offer::value` is interpreted: percentage points or a raw currency
/// amount. Formatting and currency conversion belong to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountType {
    #[serde(rename = "percentage")]
    Percentage,
    #[serde(rename = "amount")]
    FixedAmount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "amount",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(Self::Percentage),
            "amount" => Some(Self::FixedAmount),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    #[default]
    Sent,
    Redeemed,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Redeemed => "redeemed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(Self::Sent),
            "redeemed" => Some(Self::Redeemed),
            _ => None,
        }
    }
}

/// Issuance request body. The recipient comes from the call site (path
/// parameter or typed wrapper), not from the payload.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct IssueOfferRequest {
    pub discount_type: DiscountType,
    #[validate(range(exclusive_min = 0.0, message = "value must be positive"))]
    pub value: f64,
    #[validate(length(min = 1, message = "portal must not be empty"))]
    pub portal: String,
    /// Caller-supplied code. Omitted in the common case; the service then
    /// generates one with the recipient-category prefix.
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: Option<String>,
}

/// 1-based page request.
#[derive(Clone, Copy, Debug, Deserialize, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1, message = "page starts at 1"))]
    pub page: u32,
    #[validate(range(min = 1, message = "page_size must be positive"))]
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

/// One page of a recipient's offers plus total-count metadata.
#[derive(Clone, Debug, Serialize)]
pub struct OfferPage {
    pub items: Vec<Offer>,
    pub total_items: u64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
}
