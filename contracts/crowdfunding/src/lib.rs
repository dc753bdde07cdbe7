//! # Crowdfunding Contract
//!
//! Single-campaign contract backing the StellarSpark donation page.
//!
//! | Phase     | Entry Point                              |
//! |-----------|------------------------------------------|
//! | Bootstrap | [`CrowdfundingContract::initialize`]     |
//! | Funding   | [`CrowdfundingContract::donate`]         |
//! | Queries   | [`CrowdfundingContract::get_status`]     |
//!
//! Every accepted donation publishes a `("donation", donor)` event carrying
//! the amount; the off-chain poller sums these to report ledger-side
//! progress.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, panic_with_error, symbol_short, Address, Env};

mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use types::{CampaignConfig, CampaignStatus};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized     = 2,
    InvalidTarget      = 3,
    InvalidAmount      = 4,
    DeadlinePassed     = 5,
}

#[contract]
pub struct CrowdfundingContract;

#[contractimpl]
impl CrowdfundingContract {
    /// Open the campaign.
    ///
    /// Callable once; the deadline is `deadline_step` seconds after the
    /// current ledger timestamp.
    pub fn initialize(env: Env, target_amount: i128, deadline_step: u64) {
        if storage::is_initialized(&env) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        if target_amount <= 0 {
            panic_with_error!(&env, Error::InvalidTarget);
        }

        let deadline = env.ledger().timestamp().saturating_add(deadline_step);
        storage::init_campaign(
            &env,
            &CampaignConfig {
                target: target_amount,
                deadline,
            },
        );
    }

    /// Record a donation from `donor`.
    ///
    /// Donations past the target are still accepted; the target is a goal,
    /// not a cap.
    pub fn donate(env: Env, donor: Address, amount: i128) {
        donor.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let config = match storage::load_config(&env) {
            Some(config) => config,
            None => panic_with_error!(&env, Error::NotInitialized),
        };
        if env.ledger().timestamp() > config.deadline {
            panic_with_error!(&env, Error::DeadlinePassed);
        }

        if storage::add_donation(&env, amount).is_none() {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        env.events()
            .publish((symbol_short!("donation"), donor), amount);
    }

    /// Current totals. All zero before `initialize`.
    pub fn get_status(env: Env) -> CampaignStatus {
        let (target, deadline) = storage::load_config(&env)
            .map(|c| (c.target, c.deadline))
            .unwrap_or((0, 0));
        CampaignStatus {
            total: storage::load_total(&env),
            target,
            deadline,
        }
    }
}
