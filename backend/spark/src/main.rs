//! StellarSpark donation engine — entry point.
//!
//! Serves the donor session over a small Axum REST API: the wallet bridge
//! supplies the identity and signatures, Horizon loads accounts and accepts
//! transactions. When a campaign contract is configured, a background task
//! polls Soroban `getEvents` for its `donation` events.

mod activity;
mod amount;
mod api;
mod campaign;
mod config;
mod connection;
mod coordinator;
mod errors;
mod events;
mod horizon;
mod ledger;
mod poller;
mod rpc;
mod session;
mod wallet;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use campaign::CampaignAggregate;
use config::Config;
use coordinator::{DonationCoordinator, TransferSettings};
use horizon::HorizonClient;
use ledger::Settlement;
use poller::SorobanDonationSource;
use session::Session;
use wallet::WalletBridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    if config.settlement == Settlement::ToPayer {
        warn!("SETTLEMENT_ADDRESS not set, donations are paid back to the donor");
    }

    // Signing waits on a human, so the shared client gets a generous timeout.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;

    let campaign = CampaignAggregate::new(config.campaign_target)
        .ok_or_else(|| anyhow::anyhow!("campaign target must be positive"))?;
    let session = Arc::new(Mutex::new(Session::new(campaign)));
    let shutdown = CancellationToken::new();

    // ─── Campaign status poller ───────────────────────────
    let poller_task = match &config.contract_id {
        Some(contract_id) => {
            info!("Observing campaign contract {contract_id}");
            let source = SorobanDonationSource::new(
                client.clone(),
                config.rpc_url.clone(),
                contract_id.clone(),
                config.start_ledger,
                config.events_per_page,
                shutdown.child_token(),
            );
            Some(tokio::spawn(poller::run(
                source,
                session.clone(),
                config.poll_interval,
                shutdown.child_token(),
            )))
        }
        None => {
            info!("CONTRACT_ID not set, campaign status polling disabled");
            None
        }
    };

    // ─── REST API ─────────────────────────────────────────
    let coordinator = DonationCoordinator::new(
        HorizonClient::new(client.clone(), config.horizon_url.clone()),
        WalletBridge::new(client, config.wallet_bridge_url.clone()),
        TransferSettings {
            network_passphrase: config.network_passphrase.clone(),
            settlement: config.settlement.clone(),
            timeout: config.tx_timeout,
        },
    );
    let api_state = Arc::new(api::ApiState {
        session,
        coordinator,
    });

    let app = api::router(api_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            token.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = poller_task {
        let _ = handle.await;
    }

    Ok(())
}
