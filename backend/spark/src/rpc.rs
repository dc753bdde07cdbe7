//! Soroban JSON-RPC access for the campaign status poller.
//!
//! Only `getEvents` is used. Failed requests, rate limits and non-fatal RPC
//! errors are retried with doubling back-off (2s up to 60s); cancelling the
//! token ends the wait early.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{Result, SparkError};
use crate::events::{DonationEvent, EventKind};

const BACKOFF_START: Duration = Duration::from_secs(2);
const BACKOFF_CAP: Duration = Duration::from_secs(60);

/// Invalid request / unknown method. Retrying cannot succeed.
const FATAL_CODES: [i64; 2] = [-32600, -32601];

/// Parameters for one `getEvents` page.
#[derive(Debug, Clone)]
pub struct EventQuery<'a> {
    pub contract_id: &'a str,
    pub start_ledger: u32,
    pub cursor: Option<&'a str>,
    pub limit: u32,
}

impl<'a> EventQuery<'a> {
    fn params(&self) -> GetEventsParams<'a> {
        GetEventsParams {
            // startLedger and cursor are mutually exclusive.
            start_ledger: self.cursor.is_none().then_some(self.start_ledger),
            filters: [ContractFilter {
                kind: "contract",
                contract_ids: [self.contract_id],
            }],
            pagination: Pagination {
                limit: self.limit,
                cursor: self.cursor,
            },
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: GetEventsParams<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetEventsParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_ledger: Option<u32>,
    filters: [ContractFilter<'a>; 1],
    pagination: Pagination<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContractFilter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    contract_ids: [&'a str; 1],
}

#[derive(Serialize)]
struct Pagination<'a> {
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<EventsPage>,
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

/// One page of `getEvents`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// One JSON-encoded ScVal per topic entry.
    pub topic: Vec<String>,
    pub value: Value,
    pub contract_id: Option<String>,
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_closed_at: Option<String>,
    pub in_successful_contract_call: Option<bool>,
}

/// Fetch one page of contract events, retrying transient failures until
/// `cancel` fires.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    query: &EventQuery<'_>,
    cancel: &CancellationToken,
) -> Result<EventsPage> {
    let request = Request {
        jsonrpc: "2.0",
        id: 1,
        method: "getEvents",
        params: query.params(),
    };
    let mut delay = BACKOFF_START;

    loop {
        let why = match client.post(rpc_url).json(&request).send().await {
            Err(e) => format!("getEvents request failed: {e}"),
            Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                "rate-limited by RPC".to_string()
            }
            Ok(resp) => match parse_envelope(&resp.bytes().await?)? {
                Envelope {
                    error: Some(fault), ..
                } if FATAL_CODES.contains(&fault.code) => {
                    return Err(SparkError::EventParse(format!(
                        "getEvents failed ({}): {}",
                        fault.code, fault.message
                    )));
                }
                Envelope {
                    error: Some(fault), ..
                } => format!("getEvents error {}: {}", fault.code, fault.message),
                Envelope {
                    result: Some(page), ..
                } => {
                    debug!(
                        events = page.events.len(),
                        latest_ledger = ?page.latest_ledger,
                        "fetched events page"
                    );
                    return Ok(page);
                }
                Envelope { result: None, .. } => {
                    return Err(SparkError::EventParse(
                        "getEvents returned no result".to_string(),
                    ));
                }
            },
        };

        warn!("{why}, retrying in {}s", delay.as_secs());
        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(SparkError::EventParse("event fetch cancelled".to_string()));
            }
            _ = tokio::time::sleep(delay) => {}
        }
        delay = (delay * 2).min(BACKOFF_CAP);
    }
}

fn parse_envelope(body: &[u8]) -> Result<Envelope> {
    Ok(serde_json::from_slice(body)?)
}

/// Donations among `events`. Failed calls and other event kinds are dropped.
pub fn decode_donations(events: &[RawEvent], contract_id: &str) -> Vec<DonationEvent> {
    events
        .iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| to_donation(e, contract_id))
        .collect()
}

fn to_donation(event: &RawEvent, contract_id: &str) -> Option<DonationEvent> {
    let (head, rest) = event.topic.split_first()?;
    if EventKind::from_topic(&scalar(head, "symbol")) != EventKind::Donation {
        return None;
    }

    Some(DonationEvent {
        donor: rest.first().map(|t| scalar(t, "address")),
        amount: i128_value(&event.value)?,
        ledger: event.ledger.unwrap_or_default(),
        closed_at: event.ledger_closed_at.as_deref().and_then(closed_at),
        contract_id: event
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_owned()),
        tx_hash: event.tx_hash.clone(),
    })
}

/// Topic entries arrive as `{"type":..,"value":..}`, `{"<type>":..}` or a
/// bare string.
fn scalar(topic: &str, type_key: &str) -> String {
    serde_json::from_str::<Value>(topic)
        .ok()
        .and_then(|v| {
            v.get("value")
                .or_else(|| v.get(type_key))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| topic.to_owned())
}

/// An `i128` ScVal: bare number or string, `{"type":"i128","value":..}`,
/// `{"i128":..}`, or split `{"hi":..,"lo":..}` parts.
fn i128_value(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n.as_i64().map(i128::from),
        Value::String(s) => s.parse().ok(),
        Value::Object(map) => match (map.get("hi"), map.get("lo")) {
            (Some(hi), Some(lo)) => {
                let (hi, lo) = (hi.as_i64()?, lo.as_u64()?);
                Some((i128::from(hi) << 64) | i128::from(lo))
            }
            _ => map
                .get("value")
                .or_else(|| map.get("i128"))
                .and_then(i128_value),
        },
        _ => None,
    }
}

fn closed_at(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
