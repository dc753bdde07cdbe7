//! Horizon REST client: account lookup, base fee and transaction submission.
//!
//! Unlike the Soroban event poller, nothing here retries: a donation is
//! user-initiated, so every failure is reported and the user decides.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::connection::Identity;
use crate::errors::LedgerError;
use crate::ledger::{
    AccountState, FeeEstimator, LedgerQuery, SignedTransfer, SubmissionReceipt, Submitter,
};

#[derive(Clone)]
pub struct HorizonClient {
    client: Client,
    base_url: String,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    sequence: String,
}

#[derive(Debug, Deserialize)]
struct FeeStatsResponse {
    last_ledger_base_fee: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
    ledger: Option<u64>,
}

/// RFC 7807 problem document returned by Horizon on failure.
#[derive(Debug, Deserialize, Default)]
struct Problem {
    title: Option<String>,
    detail: Option<String>,
    extras: Option<Value>,
}

impl HorizonClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        HorizonClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl LedgerQuery for HorizonClient {
    async fn load_account(&self, identity: &Identity) -> Result<AccountState, LedgerError> {
        let resp = self
            .client
            .get(self.url(&format!("/accounts/{identity}")))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound);
        }
        if !status.is_success() {
            let problem = resp.json::<Problem>().await.unwrap_or_default();
            return Err(LedgerError::Network(
                problem_message(status, &problem).unwrap_or_else(|| status.to_string()),
            ));
        }

        let body: AccountResponse = resp.json().await?;
        let sequence = body
            .sequence
            .parse()
            .map_err(|_| LedgerError::Malformed(format!("bad sequence {:?}", body.sequence)))?;
        debug!(account = %body.account_id, sequence, "account loaded");

        Ok(AccountState {
            account_id: Identity::new(body.account_id),
            sequence,
        })
    }
}

impl FeeEstimator for HorizonClient {
    async fn base_fee(&self) -> Result<u32, LedgerError> {
        let resp = self
            .client
            .get(self.url("/fee_stats"))
            .send()
            .await?
            .error_for_status()?;
        let body: FeeStatsResponse = resp.json().await?;
        body.last_ledger_base_fee
            .parse()
            .map_err(|_| LedgerError::Malformed(format!("bad base fee {:?}", body.last_ledger_base_fee)))
    }
}

impl Submitter for HorizonClient {
    async fn submit(&self, signed: &SignedTransfer) -> Result<SubmissionReceipt, LedgerError> {
        let resp = self
            .client
            .post(self.url("/transactions"))
            .form(&[("tx", signed.envelope_xdr.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let problem = resp.json::<Problem>().await.unwrap_or_default();
            let message = problem_message(status, &problem);
            warn!(%status, ?message, "transaction rejected by Horizon");
            return Err(LedgerError::Rejected(message));
        }

        let body: SubmitResponse = resp.json().await?;
        Ok(SubmissionReceipt {
            hash: body.hash,
            ledger: body.ledger,
        })
    }
}

/// Most specific message Horizon gave us: result codes, then detail, then title.
fn problem_message(status: StatusCode, problem: &Problem) -> Option<String> {
    if let Some(codes) = problem
        .extras
        .as_ref()
        .and_then(|e| e.get("result_codes"))
        .and_then(result_codes_message)
    {
        return Some(codes);
    }
    problem
        .detail
        .clone()
        .or_else(|| problem.title.clone())
        .filter(|m| !m.is_empty())
        .or_else(|| (status == StatusCode::GATEWAY_TIMEOUT).then(|| "submission timed out".to_string()))
}

/// `{"transaction":"tx_failed","operations":["op_underfunded"]}` →
/// `tx_failed: op_underfunded`.
fn result_codes_message(codes: &Value) -> Option<String> {
    let tx = codes.get("transaction").and_then(Value::as_str)?;
    let ops: Vec<&str> = codes
        .get("operations")
        .and_then(Value::as_array)
        .map(|ops| ops.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if ops.is_empty() {
        Some(tx.to_string())
    } else {
        Some(format!("{tx}: {}", ops.join(", ")))
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
