//! Application-wide error types.
//!
//! [`SparkError`] covers infrastructure (HTTP, configuration, event decoding).
//! [`DonationError`] is the user-facing taxonomy of a donation attempt;
//! every variant renders the message shown next to the donate button.
//! [`LedgerError`] and [`WalletError`] are what the external collaborators
//! report; the coordinator classifies them into [`DonationError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SparkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event parse error: {0}")]
    EventParse(String),
}

pub type Result<T> = std::result::Result<T, SparkError>;

const GENERIC_FAILURE: &str = "Transaction failed. Please try again.";
const GENERIC_SUBMISSION_FAILURE: &str = "Transaction submission failed. Please try again.";

/// Classified failure of a single donation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DonationError {
    #[error("Please connect your wallet first.")]
    NotConnected,

    #[error("Wallet not found or connection rejected")]
    ConnectionRejected,

    #[error("Please enter a valid donation amount.")]
    InvalidAmount,

    #[error("A donation is already being processed.")]
    InFlight,

    #[error("Account {0} not found on the network. Please fund your account first.")]
    AccountNotFound(String),

    #[error("Network error: {0}. Please try again.")]
    Network(String),

    #[error("Signature rejected: {0}")]
    SignatureRejected(String),

    #[error("{}", .0.as_deref().unwrap_or(GENERIC_SUBMISSION_FAILURE))]
    Submission(Option<String>),

    #[error("{}", .0.as_deref().unwrap_or(GENERIC_FAILURE))]
    Unknown(Option<String>),
}

impl DonationError {
    /// Stable identifier for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::ConnectionRejected => "connection_rejected",
            Self::InvalidAmount => "invalid_amount",
            Self::InFlight => "in_flight",
            Self::AccountNotFound(_) => "account_not_found",
            Self::Network(_) => "network_error",
            Self::SignatureRejected(_) => "signature_rejected",
            Self::Submission(_) => "submission_error",
            Self::Unknown(_) => "unknown_failure",
        }
    }

    /// Failures raised before the attempt leaves Idle.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ConnectionRejected | Self::InvalidAmount | Self::InFlight
        )
    }
}

/// Failure reported by a ledger collaborator (query, fee, submission).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("rejected by ledger: {}", .0.as_deref().unwrap_or("no detail"))]
    Rejected(Option<String>),

    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LedgerError::Malformed(e.to_string())
        } else {
            LedgerError::Network(e.to_string())
        }
    }
}

/// Failure reported by the wallet (identity provider or signer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("rejected by wallet: {0}")]
    Rejected(String),

    #[error("wallet unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for WalletError {
    fn from(e: reqwest::Error) -> Self {
        WalletError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_message_is_verbatim_when_present() {
        let err = DonationError::Submission(Some("tx_bad_seq".to_string()));
        assert_eq!(err.to_string(), "tx_bad_seq");
    }

    #[test]
    fn submission_message_falls_back_to_generic() {
        assert_eq!(
            DonationError::Submission(None).to_string(),
            GENERIC_SUBMISSION_FAILURE
        );
        assert_eq!(DonationError::Unknown(None).to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn account_not_found_mentions_funding() {
        let msg = DonationError::AccountNotFound("GABC".to_string()).to_string();
        assert!(msg.contains("fund your account"));
    }

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(DonationError::NotConnected.kind(), "not_connected");
        assert_eq!(
            DonationError::SignatureRejected("x".into()).kind(),
            "signature_rejected"
        );
        assert!(DonationError::InvalidAmount.is_validation());
        assert!(!DonationError::Network("down".into()).is_validation());
    }
}
