//! Owned application state for one donor session.
//!
//! Everything the presentation layer shows lives here: the connected
//! identity, the amount being typed, the state of the current attempt,
//! the campaign aggregate and the activity feed. The coordinator works on
//! a `&mut Session`; nothing is global.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::activity::{ActivityEvent, ActivityLedger};
use crate::amount::{self, Amount, DonationAmount};
use crate::campaign::{CampaignAggregate, CampaignSnapshot};
use crate::connection::{ConnectionState, Identity};
use crate::errors::DonationError;
use crate::ledger::SubmissionReceipt;
use crate::poller::ObservedCampaign;

/// Lifecycle of a single donation attempt.
///
/// ```text
/// Idle ──submit──► Pending ──► Succeeded
///                     └──────► Failed
/// Succeeded | Failed ──edit amount──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionAttempt {
    pub status: TransactionStatus,
    pub error: Option<DonationError>,
}

/// Proof that an attempt was started; consumed when it completes.
///
/// Captures the identity so a reconnect mid-flight cannot change who the
/// recorded donation is attributed to.
#[derive(Debug)]
pub struct DonationTicket {
    identity: Identity,
    amount: DonationAmount,
}

impl DonationTicket {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn amount(&self) -> DonationAmount {
        self.amount
    }
}

/// Result of a confirmed donation.
#[derive(Debug, Clone, Serialize)]
pub struct DonationReceipt {
    pub event: ActivityEvent,
    pub campaign: CampaignSnapshot,
}

pub type TransactionOutcome = Result<DonationReceipt, DonationError>;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
}

impl From<&DonationError> for ErrorView {
    fn from(e: &DonationError) -> Self {
        ErrorView {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub amount: String,
    pub status: TransactionStatus,
    pub error: Option<ErrorView>,
    pub campaign: CampaignSnapshot,
    pub activity: Vec<ActivityEvent>,
    pub observed: Option<ObservedCampaign>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub connection: ConnectionState,
    amount_input: String,
    attempt: TransactionAttempt,
    campaign: CampaignAggregate,
    activity: ActivityLedger,
    observed: Option<ObservedCampaign>,
}

impl Session {
    pub fn new(campaign: CampaignAggregate) -> Self {
        Session {
            connection: ConnectionState::default(),
            amount_input: String::new(),
            attempt: TransactionAttempt::default(),
            campaign,
            activity: ActivityLedger::new(),
            observed: None,
        }
    }

    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    pub fn attempt(&self) -> &TransactionAttempt {
        &self.attempt
    }

    pub fn status(&self) -> TransactionStatus {
        self.attempt.status
    }

    pub fn campaign(&self) -> &CampaignAggregate {
        &self.campaign
    }

    pub fn activity(&self) -> &ActivityLedger {
        &self.activity
    }

    pub fn observed(&self) -> Option<&ObservedCampaign> {
        self.observed.as_ref()
    }

    pub fn set_observed(&mut self, observed: ObservedCampaign) {
        self.observed = Some(observed);
    }

    /// Record a new amount entry. A finished attempt is discarded; an
    /// in-flight one is left alone.
    pub fn set_amount(&mut self, input: impl Into<String>) {
        self.amount_input = input.into();
        if self.attempt.status != TransactionStatus::Pending {
            self.attempt = TransactionAttempt::default();
        }
    }

    /// Record a pre-flow failure (validation, connection) without leaving Idle.
    pub fn reject(&mut self, error: DonationError) {
        if self.attempt.status != TransactionStatus::Pending {
            self.attempt.status = TransactionStatus::Idle;
        }
        self.attempt.error = Some(error);
    }

    /// Validate the current input and move to Pending.
    pub fn begin_attempt(&mut self) -> Result<DonationTicket, DonationError> {
        if self.attempt.status == TransactionStatus::Pending {
            return Err(DonationError::InFlight);
        }

        let (identity, amount) = match amount::validate(&self.amount_input, &self.connection) {
            Ok(v) => v,
            Err(e) => {
                self.reject(e.clone());
                return Err(e);
            }
        };

        self.attempt = TransactionAttempt {
            status: TransactionStatus::Pending,
            error: None,
        };
        info!(donor = %identity.shortened(), %amount, "donation pending");

        Ok(DonationTicket { identity, amount })
    }

    /// Settle a started attempt. On success the aggregate and the feed
    /// are updated together and the input is cleared.
    pub fn complete_attempt(
        &mut self,
        ticket: DonationTicket,
        result: Result<SubmissionReceipt, DonationError>,
    ) -> TransactionOutcome {
        debug_assert_eq!(self.attempt.status, TransactionStatus::Pending);

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(donor = %ticket.identity.shortened(), kind = e.kind(), "donation failed: {e}");
                self.attempt = TransactionAttempt {
                    status: TransactionStatus::Failed,
                    error: Some(e.clone()),
                };
                return Err(e);
            }
        };

        let event = ActivityEvent {
            id: self.activity.next_id(),
            donor: ticket.identity.shortened(),
            amount: ticket.amount.amount(),
            timestamp: Utc::now(),
            tx_hash: Some(receipt.hash),
        };
        self.campaign.apply_confirmed_donation(ticket.amount);
        self.activity.record(event.clone());
        self.amount_input.clear();
        self.attempt = TransactionAttempt {
            status: TransactionStatus::Succeeded,
            error: None,
        };

        info!(
            donor = %event.donor,
            amount = %event.amount,
            total = %self.campaign.total_raised(),
            "donation confirmed"
        );

        Ok(DonationReceipt {
            event,
            campaign: self.campaign_snapshot(),
        })
    }

    /// Fail a Pending attempt whose ticket was lost before settling.
    /// Anything else is left untouched.
    pub fn abandon_attempt(&mut self, error: DonationError) {
        if self.attempt.status == TransactionStatus::Pending {
            warn!(kind = error.kind(), "donation abandoned: {error}");
            self.attempt = TransactionAttempt {
                status: TransactionStatus::Failed,
                error: Some(error),
            };
        }
    }

    pub fn campaign_snapshot(&self) -> CampaignSnapshot {
        self.campaign.snapshot(self.activity.size())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.connection.identity().cloned(),
            amount: self.amount_input.clone(),
            status: self.attempt.status,
            error: self.attempt.error.as_ref().map(ErrorView::from),
            campaign: self.campaign_snapshot(),
            activity: self.activity.snapshot(),
            observed: self.observed.clone(),
        }
    }

    /// Total raised so far, for logging.
    pub fn total_raised(&self) -> Amount {
        self.campaign.total_raised()
    }
}
