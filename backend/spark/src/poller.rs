//! Long-running background task that refreshes the ledger-observed
//! campaign status.
//!
//! The observed status is shown next to the client-side aggregate; it never
//! feeds into it, so local progress stays monotonic whatever the ledger says.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::Result;
use crate::events::DonationEvent;
use crate::rpc::{self, EventQuery};
use crate::session::Session;

/// Campaign totals as seen on the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObservedCampaign {
    /// Sum of donation amounts, in contract units.
    pub total_donated: i128,
    pub donations_seen: u64,
    pub latest_ledger: Option<u64>,
    pub last_donation: Option<DonationEvent>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Source of ledger-side campaign status.
pub trait CampaignStatusSource {
    fn poll(&mut self) -> impl Future<Output = Result<ObservedCampaign>> + Send;
}

/// Accumulates `donation` events emitted by the campaign contract.
pub struct SorobanDonationSource {
    client: Client,
    rpc_url: String,
    contract_id: String,
    events_per_page: u32,
    current_ledger: u32,
    cursor: Option<String>,
    observed: ObservedCampaign,
    cancel: CancellationToken,
}

impl SorobanDonationSource {
    pub fn new(
        client: Client,
        rpc_url: impl Into<String>,
        contract_id: impl Into<String>,
        start_ledger: u32,
        events_per_page: u32,
        cancel: CancellationToken,
    ) -> Self {
        SorobanDonationSource {
            client,
            rpc_url: rpc_url.into(),
            contract_id: contract_id.into(),
            events_per_page,
            current_ledger: start_ledger,
            cursor: None,
            observed: ObservedCampaign::default(),
            cancel,
        }
    }
}

impl CampaignStatusSource for SorobanDonationSource {
    async fn poll(&mut self) -> Result<ObservedCampaign> {
        let query = EventQuery {
            contract_id: &self.contract_id,
            start_ledger: self.current_ledger,
            cursor: self.cursor.as_deref(),
            limit: self.events_per_page,
        };
        let page = rpc::fetch_events(&self.client, &self.rpc_url, &query, &self.cancel).await?;

        let donations = rpc::decode_donations(&page.events, &self.contract_id);
        if !donations.is_empty() {
            info!(
                raw = page.events.len(),
                donations = donations.len(),
                "new ledger donations observed"
            );
        }
        for d in donations {
            self.observed.total_donated = self.observed.total_donated.saturating_add(d.amount);
            self.observed.donations_seen += 1;
            self.observed.last_donation = Some(d);
        }

        self.current_ledger = next_start_ledger(self.current_ledger, page.latest_ledger);
        if page.cursor.is_some() {
            self.cursor = page.cursor;
        }
        self.observed.latest_ledger = page.latest_ledger.or(self.observed.latest_ledger);
        self.observed.refreshed_at = Some(Utc::now());

        Ok(self.observed.clone())
    }
}

/// Start ledger for the next page: never moves backwards, and a
/// `latestLedger` beyond `u32` saturates instead of wrapping.
fn next_start_ledger(current: u32, latest: Option<u64>) -> u32 {
    latest
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX).max(current))
        .unwrap_or(current)
}

/// Poll `source` every `interval` until `cancel` fires.
pub async fn run<S: CampaignStatusSource>(
    mut source: S,
    session: Arc<Mutex<Session>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!("Campaign status poller starting, every {}s", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = source.poll() => polled,
        };

        match polled {
            Ok(observed) => session.lock().await.set_observed(observed),
            Err(e) => error!("Campaign status poll error: {e}"),
        }
    }

    info!("Campaign status poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SparkError;
    use crate::testing::session_with_target;

    struct ScriptedSource {
        polls: u64,
        fail_every_other: bool,
    }

    impl CampaignStatusSource for ScriptedSource {
        async fn poll(&mut self) -> Result<ObservedCampaign> {
            self.polls += 1;
            if self.fail_every_other && self.polls % 2 == 0 {
                return Err(SparkError::EventParse("flaky".to_string()));
            }
            Ok(ObservedCampaign {
                total_donated: self.polls as i128 * 10,
                donations_seen: self.polls,
                latest_ledger: Some(self.polls),
                last_donation: None,
                refreshed_at: None,
            })
        }
    }

    #[test]
    fn start_ledger_only_moves_forward() {
        assert_eq!(next_start_ledger(500, None), 500);
        assert_eq!(next_start_ledger(500, Some(420)), 500);
        assert_eq!(next_start_ledger(500, Some(612)), 612);
    }

    #[test]
    fn oversized_latest_ledger_saturates() {
        let huge = u64::from(u32::MAX) + 7;
        assert_eq!(next_start_ledger(10, Some(huge)), u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_observed_status_until_cancelled() {
        let session = Arc::new(Mutex::new(session_with_target(1000)));
        let cancel = CancellationToken::new();
        let source = ScriptedSource {
            polls: 0,
            fail_every_other: false,
        };

        let task = tokio::spawn(run(
            source,
            session.clone(),
            Duration::from_secs(10),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        let observed = session.lock().await.observed().cloned().unwrap();
        assert_eq!(observed.donations_seen, 3);

        cancel.cancel();
        task.await.unwrap();

        // Local aggregate untouched by what the ledger reports.
        assert!(session.lock().await.campaign().total_raised().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_do_not_stop_the_loop() {
        let session = Arc::new(Mutex::new(session_with_target(1000)));
        let cancel = CancellationToken::new();
        let source = ScriptedSource {
            polls: 0,
            fail_every_other: true,
        };

        let task = tokio::spawn(run(
            source,
            session.clone(),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(session.lock().await.observed().unwrap().donations_seen, 3);

        cancel.cancel();
        task.await.unwrap();
    }
}
