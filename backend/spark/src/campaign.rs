//! Client-side campaign aggregate: running total against a fixed target.

use serde::Serialize;

use crate::amount::{Amount, DonationAmount};

/// Total raised and target for the campaign.
///
/// The total only ever grows and is capped at the target for display;
/// the submitted transfer amount itself is never altered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignAggregate {
    total_raised: Amount,
    target: Amount,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSnapshot {
    pub total_raised: Amount,
    pub target: Amount,
    pub progress_percent: f64,
    pub complete: bool,
    /// Entry count of the activity feed, not a unique-payer count.
    pub backers: usize,
}

impl CampaignAggregate {
    /// Returns `None` for a zero target.
    pub fn new(target: Amount) -> Option<Self> {
        (!target.is_zero()).then_some(CampaignAggregate {
            total_raised: Amount::ZERO,
            target,
        })
    }

    pub fn total_raised(&self) -> Amount {
        self.total_raised
    }

    pub fn apply_confirmed_donation(&mut self, amount: DonationAmount) {
        self.total_raised = self
            .total_raised
            .saturating_add(amount.amount())
            .min(self.target);
    }

    pub fn progress_percent(&self) -> f64 {
        self.total_raised.percent_of(self.target).min(100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.total_raised >= self.target
    }

    pub fn snapshot(&self, backers: usize) -> CampaignSnapshot {
        CampaignSnapshot {
            total_raised: self.total_raised,
            target: self.target,
            progress_percent: self.progress_percent(),
            complete: self.is_complete(),
            backers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: i64) -> Amount {
        Amount::from_units(n).unwrap()
    }

    fn donation(n: i64) -> DonationAmount {
        DonationAmount::new(units(n)).unwrap()
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(CampaignAggregate::new(Amount::ZERO).is_none());
    }

    #[test]
    fn first_donation_moves_progress() {
        let mut campaign = CampaignAggregate::new(units(1000)).unwrap();
        campaign.apply_confirmed_donation(donation(150));
        assert_eq!(campaign.total_raised(), units(150));
        assert_eq!(campaign.progress_percent(), 15.0);
        assert!(!campaign.is_complete());
    }

    #[test]
    fn total_is_capped_at_target() {
        let mut campaign = CampaignAggregate::new(units(1000)).unwrap();
        campaign.apply_confirmed_donation(donation(950));
        campaign.apply_confirmed_donation(donation(100));
        assert_eq!(campaign.total_raised(), units(1000));
        assert_eq!(campaign.progress_percent(), 100.0);
        assert!(campaign.is_complete());

        campaign.apply_confirmed_donation(donation(5));
        assert_eq!(campaign.total_raised(), units(1000));
        assert_eq!(campaign.progress_percent(), 100.0);
    }

    #[test]
    fn total_never_decreases() {
        let mut campaign = CampaignAggregate::new(units(1000)).unwrap();
        let mut previous = campaign.total_raised();
        for n in [1, 400, 3, 700, 1] {
            campaign.apply_confirmed_donation(donation(n));
            assert!(campaign.total_raised() >= previous);
            previous = campaign.total_raised();
        }
    }

    #[test]
    fn snapshot_carries_backers() {
        let campaign = CampaignAggregate::new(units(1000)).unwrap();
        let snap = campaign.snapshot(3);
        assert_eq!(snap.backers, 3);
        assert_eq!(snap.progress_percent, 0.0);
        assert!(!snap.complete);
        assert_eq!(snap.target, units(1000));
    }
}
