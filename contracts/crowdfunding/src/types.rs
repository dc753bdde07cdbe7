//! # Types
//!
//! A campaign is stored as two instance entries:
//!
//! - [`CampaignConfig`]: written once by `initialize`, never mutated.
//! - the running donation total: written on every `donate`.
//!
//! [`CampaignStatus`] is the reconstructed public view.

use soroban_sdk::contracttype;

/// Immutable campaign configuration.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignConfig {
    /// Funding target, in token units.
    pub target: i128,
    /// Ledger timestamp after which donations are refused.
    pub deadline: u64,
}

/// Public view of the campaign returned by `get_status`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignStatus {
    /// Sum of all recorded donations. Not capped at the target.
    pub total: i128,
    pub target: i128,
    pub deadline: u64,
}
