//! Offer domain: records, requests, code generation, events

pub mod code;
pub mod events;
pub mod offer;
