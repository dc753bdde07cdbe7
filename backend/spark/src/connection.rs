//! The connected payer identity and the collaborator that supplies it.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::WalletError;

/// Opaque account string identifying the connected payer and signer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(address: impl Into<String>) -> Self {
        Identity(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display-safe form: first four and last four characters.
    ///
    /// Identities too short to truncate are returned whole.
    pub fn shortened(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet-side connection flow: `connect() → Identity | rejected`.
pub trait IdentityProvider {
    fn connect(&self) -> impl Future<Output = Result<Identity, WalletError>> + Send;
}

/// Holds the currently connected identity, if any.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    identity: Option<Identity>,
}

impl ConnectionState {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    pub fn connect(&mut self, identity: Identity) {
        info!(address = %identity.shortened(), "wallet connected");
        self.identity = Some(identity);
    }

    pub fn disconnect(&mut self) {
        self.identity = None;
    }
}
