//! Contracts for the ledger-side collaborators and the transfer shapes
//! that flow between them.

use std::future::Future;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::connection::Identity;
use crate::errors::{LedgerError, WalletError};

/// On-ledger state of the payer account needed to build a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub account_id: Identity,
    pub sequence: i64,
}

/// Where a donation is settled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Settlement {
    /// Pay back to the payer. Placeholder until a campaign address is configured.
    #[default]
    ToPayer,
    ToAddress(Identity),
}

impl Settlement {
    pub fn destination(&self, payer: &Identity) -> Identity {
        match self {
            Settlement::ToPayer => payer.clone(),
            Settlement::ToAddress(address) => address.clone(),
        }
    }
}

/// Unsigned native-asset payment handed to the signer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub source: Identity,
    pub destination: Identity,
    pub amount: Amount,
    /// Base fee in stroops.
    pub fee: u32,
    pub sequence: i64,
    pub network_passphrase: String,
    pub valid_until: DateTime<Utc>,
}

/// Signer output: a base64 transaction envelope ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransfer {
    pub envelope_xdr: String,
}

impl SignedTransfer {
    /// Reject envelopes that cannot possibly be submitted.
    pub fn check(&self) -> Result<(), WalletError> {
        if self.envelope_xdr.trim().is_empty() {
            return Err(WalletError::Rejected("wallet returned an empty envelope".to_string()));
        }
        STANDARD
            .decode(self.envelope_xdr.trim())
            .map(|_| ())
            .map_err(|e| WalletError::Rejected(format!("wallet returned a malformed envelope: {e}")))
    }
}

/// Acceptance of a submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub hash: String,
    pub ledger: Option<u64>,
}

/// `loadAccount(Identity) → AccountState`.
pub trait LedgerQuery {
    fn load_account(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<AccountState, LedgerError>> + Send;
}

/// `baseFee() → fee` in stroops.
pub trait FeeEstimator {
    fn base_fee(&self) -> impl Future<Output = Result<u32, LedgerError>> + Send;
}

/// `submit(signed) → acceptance | SubmissionError(message)`.
pub trait Submitter {
    fn submit(
        &self,
        signed: &SignedTransfer,
    ) -> impl Future<Output = Result<SubmissionReceipt, LedgerError>> + Send;
}

/// `sign(unsigned, network) → signed | rejected`.
pub trait Signer {
    fn sign(
        &self,
        request: &TransferRequest,
        network_passphrase: &str,
    ) -> impl Future<Output = Result<SignedTransfer, WalletError>> + Send;
}

/// Everything the coordinator needs from the ledger side.
pub trait Ledger: LedgerQuery + FeeEstimator + Submitter {}

impl<T: LedgerQuery + FeeEstimator + Submitter> Ledger for T {}
