//! Domain events published after successful writes

use serde::Serialize;
use uuid::Uuid;

use crate::domain::offer::{OfferStatus, RecipientType};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OfferEvent {
    Issued {
        offer_id: Uuid,
        recipient_type: RecipientType,
        recipient_id: String,
        code: String,
    },
    StatusChanged {
        offer_id: Uuid,
        status: OfferStatus,
    },
}

impl OfferEvent {
    /// NATS subject this event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Issued { .. } => "offers.issued",
            Self::StatusChanged { .. } => "offers.status",
        }
    }
}
