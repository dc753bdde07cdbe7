//! HTTP bridge to the user's wallet.
//!
//! The bridge owns wallet discovery and the signing prompt; this side only
//! asks for an address and for a signature over a [`TransferRequest`].

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::{Identity, IdentityProvider};
use crate::errors::WalletError;
use crate::ledger::{SignedTransfer, Signer, TransferRequest};

#[derive(Clone)]
pub struct WalletBridge {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    address: String,
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    transfer: &'a TransferRequest,
    network_passphrase: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signed_tx_xdr: String,
}

#[derive(Debug, Deserialize)]
struct BridgeError {
    error: String,
}

impl WalletBridge {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        WalletBridge {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// 4xx means the user (or wallet) said no; anything else means we never
/// got an answer.
async fn check(resp: Response) -> Result<Response, WalletError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let reason = resp
        .json::<BridgeError>()
        .await
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
    if status.is_client_error() {
        Err(WalletError::Rejected(reason))
    } else {
        Err(WalletError::Unavailable(reason))
    }
}

impl IdentityProvider for WalletBridge {
    async fn connect(&self) -> Result<Identity, WalletError> {
        let resp = self
            .client
            .post(format!("{}/connect", self.base_url))
            .send()
            .await?;
        let body: ConnectResponse = check(resp).await?.json().await?;
        if body.address.is_empty() {
            return Err(WalletError::Rejected("no address selected".to_string()));
        }
        Ok(Identity::new(body.address))
    }
}

impl Signer for WalletBridge {
    async fn sign(
        &self,
        request: &TransferRequest,
        network_passphrase: &str,
    ) -> Result<SignedTransfer, WalletError> {
        debug!(source = %request.source.shortened(), amount = %request.amount, "requesting signature");
        let resp = self
            .client
            .post(format!("{}/sign", self.base_url))
            .json(&SignRequest {
                transfer: request,
                network_passphrase,
            })
            .send()
            .await?;
        let body: SignResponse = check(resp).await?.json().await?;
        Ok(SignedTransfer {
            envelope_xdr: body.signed_tx_xdr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::amount::Amount;

    #[test]
    fn sign_request_wire_shape() {
        let transfer = TransferRequest {
            source: Identity::new("GSRC"),
            destination: Identity::new("GDST"),
            amount: Amount::from_stroops(125_000_000),
            fee: 100,
            sequence: 7,
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            valid_until: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 30).unwrap(),
        };
        let body = serde_json::to_value(SignRequest {
            transfer: &transfer,
            network_passphrase: &transfer.network_passphrase,
        })
        .unwrap();

        assert_eq!(body["transfer"]["amount"], json!("12.5"));
        assert_eq!(body["transfer"]["source"], json!("GSRC"));
        assert_eq!(body["transfer"]["sequence"], json!(7));
        assert_eq!(body["transfer"]["valid_until"], json!("2024-01-01T00:00:30Z"));
        assert_eq!(body["network_passphrase"], json!("Test SDF Network ; September 2015"));
    }

    #[test]
    fn sign_response_shape() {
        let body: SignResponse =
            serde_json::from_value(json!({ "signed_tx_xdr": "AAAA" })).unwrap();
        assert_eq!(body.signed_tx_xdr, "AAAA");
    }
}
