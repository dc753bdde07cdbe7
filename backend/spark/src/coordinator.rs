//! Donation flow: validate → load account → build transfer → sign → submit
//! → reconcile.
//!
//! The flow is split in three so a shared session need not be locked while
//! the wallet and the ledger are being awaited:
//!
//! 1. [`Session::begin_attempt`] validates and moves to Pending.
//! 2. [`DonationCoordinator::execute`] talks to the collaborators only.
//! 3. [`Session::complete_attempt`] applies the result.
//!
//! [`DonationCoordinator::submit_donation`] runs all three on an owned
//! session. No step is retried; every retry is a new user submission.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::connection::{Identity, IdentityProvider};
use crate::errors::{DonationError, LedgerError, WalletError};
use crate::ledger::{Ledger, Settlement, Signer, SubmissionReceipt, TransferRequest};
use crate::session::{DonationTicket, Session, TransactionOutcome};

/// Settings that shape every transfer the coordinator builds.
#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub network_passphrase: String,
    pub settlement: Settlement,
    /// Validity window of a built transfer; enforced by the ledger.
    pub timeout: Duration,
}

/// Wallet-side collaborators: connection and signing.
pub trait Wallet: IdentityProvider + Signer {}

impl<T: IdentityProvider + Signer> Wallet for T {}

pub struct DonationCoordinator<L, W> {
    ledger: L,
    wallet: W,
    settings: TransferSettings,
}

impl<L: Ledger, W: Wallet> DonationCoordinator<L, W> {
    pub fn new(ledger: L, wallet: W, settings: TransferSettings) -> Self {
        DonationCoordinator {
            ledger,
            wallet,
            settings,
        }
    }

    /// Ask the wallet for an identity.
    pub async fn connect(&self) -> Result<Identity, DonationError> {
        info!("requesting wallet connection");
        self.wallet.connect().await.map_err(|e| {
            warn!("wallet connection failed: {e}");
            DonationError::ConnectionRejected
        })
    }

    /// Run a full donation on an owned session.
    pub async fn submit_donation(&self, session: &mut Session) -> TransactionOutcome {
        let ticket = match session.begin_attempt() {
            Ok(ticket) => ticket,
            Err(DonationError::NotConnected) => {
                match self.connect().await {
                    Ok(identity) => session.connection.connect(identity),
                    Err(e) => session.reject(e),
                }
                return Err(DonationError::NotConnected);
            }
            Err(e) => return Err(e),
        };

        let result = self.execute(&ticket).await;
        session.complete_attempt(ticket, result)
    }

    /// Steps 2–5 of the flow. Touches no session state.
    pub async fn execute(
        &self,
        ticket: &DonationTicket,
    ) -> Result<SubmissionReceipt, DonationError> {
        let payer = ticket.identity();

        let account = self
            .ledger
            .load_account(payer)
            .await
            .map_err(|e| match e {
                LedgerError::NotFound => DonationError::AccountNotFound(payer.to_string()),
                LedgerError::Network(msg) => DonationError::Network(msg),
                LedgerError::Rejected(msg) => DonationError::Network(
                    msg.unwrap_or_else(|| "account lookup refused".to_string()),
                ),
                LedgerError::Malformed(msg) => DonationError::Unknown(Some(msg)),
            })?;

        let fee = self.ledger.base_fee().await.map_err(|e| match e {
            LedgerError::Malformed(msg) => DonationError::Unknown(Some(msg)),
            other => DonationError::Network(other.to_string()),
        })?;

        let sequence = account.sequence.checked_add(1).ok_or_else(|| {
            DonationError::Unknown(Some("account sequence exhausted".to_string()))
        })?;
        let timeout = chrono::Duration::from_std(self.settings.timeout)
            .map_err(|e| DonationError::Unknown(Some(e.to_string())))?;

        let request = TransferRequest {
            source: payer.clone(),
            destination: self.settings.settlement.destination(payer),
            amount: ticket.amount().amount(),
            fee,
            sequence,
            network_passphrase: self.settings.network_passphrase.clone(),
            valid_until: Utc::now() + timeout,
        };
        debug!(?request, "transfer built");

        let signed = self
            .wallet
            .sign(&request, &self.settings.network_passphrase)
            .await
            .and_then(|signed| signed.check().map(|_| signed))
            .map_err(|e| match e {
                WalletError::Rejected(msg) | WalletError::Unavailable(msg) => {
                    DonationError::SignatureRejected(msg)
                }
            })?;

        let receipt = self.ledger.submit(&signed).await.map_err(|e| match e {
            LedgerError::Rejected(msg) => DonationError::Submission(msg),
            LedgerError::Network(msg) | LedgerError::Malformed(msg) => {
                DonationError::Submission(Some(msg))
            }
            LedgerError::NotFound => DonationError::Submission(None),
        })?;

        info!(hash = %receipt.hash, ledger = ?receipt.ledger, "transfer accepted");
        Ok(receipt)
    }
}
