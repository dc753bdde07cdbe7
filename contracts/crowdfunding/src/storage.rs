//! # Storage
//!
//! Everything lives in instance storage (contract-lifetime TTL):
//!
//! | Key         | Type             | Description                      |
//! |-------------|------------------|----------------------------------|
//! | `Config`    | `CampaignConfig` | Target and deadline, write-once  |
//! | `Donations` | `i128`           | Running donation total           |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.

use soroban_sdk::{contracttype, Env};

use crate::types::CampaignConfig;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Write-once campaign configuration.
    Config,
    /// Running total of donations.
    Donations,
}

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

/// Write the configuration and a zero total.
pub fn init_campaign(env: &Env, config: &CampaignConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    env.storage().instance().set(&DataKey::Donations, &0i128);
    bump_instance(env);
}

/// `None` before `initialize`.
pub fn load_config(env: &Env) -> Option<CampaignConfig> {
    let config = env.storage().instance().get(&DataKey::Config);
    if config.is_some() {
        bump_instance(env);
    }
    config
}

pub fn load_total(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::Donations)
        .unwrap_or(0)
}

/// Add `amount` to the total. Returns the new total, or `None` on overflow.
pub fn add_donation(env: &Env, amount: i128) -> Option<i128> {
    let total = load_total(env).checked_add(amount)?;
    env.storage().instance().set(&DataKey::Donations, &total);
    bump_instance(env);
    Some(total)
}
