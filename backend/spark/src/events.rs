//! Decoded crowdfunding contract events.
//!
//! `donate` in `contracts/crowdfunding` publishes `("donation", donor)` topics
//! with the amount as data; anything else the contract emits is ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Leading topic symbol of a contract event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Donation,
    Other,
}

impl EventKind {
    pub const DONATION_TOPIC: &'static str = "donation";

    pub fn from_topic(symbol: &str) -> Self {
        if symbol == Self::DONATION_TOPIC {
            EventKind::Donation
        } else {
            EventKind::Other
        }
    }
}

/// A donation as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationEvent {
    pub donor: Option<String>,
    /// Contract units (stroops for the native asset).
    pub amount: i128,
    pub ledger: u64,
    pub closed_at: Option<DateTime<Utc>>,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}
