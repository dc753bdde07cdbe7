#![allow(dead_code)]

extern crate std;

use crate::CampaignStatus;

/// INV-1: the running total is never negative.
pub fn assert_total_non_negative(status: &CampaignStatus) {
    assert!(
        status.total >= 0,
        "INV-1 violated: negative total ({})",
        status.total
    );
}

/// INV-2: an initialised campaign has a positive target.
pub fn assert_target_positive(status: &CampaignStatus) {
    assert!(
        status.target > 0,
        "INV-2 violated: non-positive target ({})",
        status.target
    );
}

/// INV-3: after a donation of `amount`, the total grows by exactly `amount`.
pub fn assert_donation_invariant(total_before: i128, total_after: i128, amount: i128) {
    assert_eq!(
        total_after,
        total_before + amount,
        "INV-3 violated: {} + {} != {}",
        total_before,
        amount,
        total_after
    );
}

/// INV-4: target and deadline never change after initialisation.
pub fn assert_config_immutable(original: &CampaignStatus, current: &CampaignStatus) {
    assert_eq!(original.target, current.target, "INV-4 violated: target changed");
    assert_eq!(
        original.deadline, current.deadline,
        "INV-4 violated: deadline changed"
    );
}

/// Run all stateless invariants.
pub fn assert_all_campaign_invariants(status: &CampaignStatus) {
    assert_total_non_negative(status);
    assert_target_positive(status);
}
