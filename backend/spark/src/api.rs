//! Axum REST API handlers.
//!
//! The session lock is never held across a wallet or ledger call: a
//! donation takes it to start, releases it while the collaborators run,
//! and takes it again to settle. Readers therefore see `pending`. The
//! collaborator calls and the settle step run on their own task, so the
//! attempt reaches a terminal state even when the client goes away.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::activity::ActivityEvent;
use crate::campaign::CampaignSnapshot;
use crate::connection::Identity;
use crate::coordinator::{DonationCoordinator, Wallet};
use crate::errors::DonationError;
use crate::ledger::Ledger;
use crate::poller::ObservedCampaign;
use crate::session::{DonationReceipt, Session, SessionSnapshot};

pub struct ApiState<L, W> {
    pub session: Arc<Mutex<Session>>,
    pub coordinator: DonationCoordinator<L, W>,
}

pub fn router<L, W>(state: Arc<ApiState<L, W>>) -> Router
where
    L: Ledger + Send + Sync + 'static,
    W: Wallet + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/session", get(get_session::<L, W>))
        .route("/campaign", get(get_campaign::<L, W>))
        .route("/activity", get(get_activity::<L, W>))
        .route("/connect", post(connect::<L, W>).delete(disconnect::<L, W>))
        .route("/amount", put(set_amount::<L, W>))
        .route("/donations", post(donate::<L, W>))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct CampaignResponse {
    pub campaign: CampaignSnapshot,
    pub observed: Option<ObservedCampaign>,
}

#[derive(Serialize)]
pub struct ActivityResponse {
    pub count: usize,
    pub events: Vec<ActivityEvent>,
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub identity: Identity,
}

#[derive(Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub error: String,
}

/// A [`DonationError`] rendered as an HTTP response.
pub struct ApiError(pub DonationError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DonationError::InFlight => StatusCode::CONFLICT,
            e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorResponse {
                kind: self.0.kind(),
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /session`
pub async fn get_session<L, W>(State(state): State<Arc<ApiState<L, W>>>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

/// `GET /campaign`
pub async fn get_campaign<L, W>(
    State(state): State<Arc<ApiState<L, W>>>,
) -> Json<CampaignResponse> {
    let session = state.session.lock().await;
    Json(CampaignResponse {
        campaign: session.campaign_snapshot(),
        observed: session.observed().cloned(),
    })
}

/// `GET /activity`
pub async fn get_activity<L, W>(
    State(state): State<Arc<ApiState<L, W>>>,
) -> Json<ActivityResponse> {
    let session = state.session.lock().await;
    let events = session.activity().snapshot();
    Json(ActivityResponse {
        count: events.len(),
        events,
    })
}

/// `POST /connect`
///
/// Asks the wallet for an identity and makes it the session's payer.
pub async fn connect<L, W>(
    State(state): State<Arc<ApiState<L, W>>>,
) -> Result<Json<ConnectResponse>, ApiError>
where
    L: Ledger + Send + Sync,
    W: Wallet + Send + Sync,
{
    match state.coordinator.connect().await {
        Ok(identity) => {
            state.session.lock().await.connection.connect(identity.clone());
            Ok(Json(ConnectResponse { identity }))
        }
        Err(e) => {
            state.session.lock().await.reject(e.clone());
            Err(ApiError(e))
        }
    }
}

/// `DELETE /connect`
///
/// Forgets the payer. An attempt already in flight keeps the identity it
/// started with.
pub async fn disconnect<L, W>(State(state): State<Arc<ApiState<L, W>>>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.connection.disconnect();
    Json(session.snapshot())
}

/// `PUT /amount`
pub async fn set_amount<L, W>(
    State(state): State<Arc<ApiState<L, W>>>,
    Json(req): Json<AmountRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.set_amount(req.amount);
    Json(session.snapshot())
}

/// `POST /donations`
///
/// Runs one donation with the amount currently entered.
pub async fn donate<L, W>(
    State(state): State<Arc<ApiState<L, W>>>,
) -> Result<Json<DonationReceipt>, ApiError>
where
    L: Ledger + Send + Sync + 'static,
    W: Wallet + Send + Sync + 'static,
{
    let started = state.session.lock().await.begin_attempt();
    let ticket = match started {
        Ok(ticket) => ticket,
        Err(DonationError::NotConnected) => {
            info!("donation without a wallet, requesting connection");
            let connected = state.coordinator.connect().await;
            let mut session = state.session.lock().await;
            match connected {
                Ok(identity) => session.connection.connect(identity),
                Err(e) => session.reject(e),
            }
            return Err(ApiError(DonationError::NotConnected));
        }
        Err(e) => return Err(ApiError(e)),
    };

    // Settles even if this request future is dropped.
    let flow = tokio::spawn({
        let state = state.clone();
        async move {
            let result = state.coordinator.execute(&ticket).await;
            state.session.lock().await.complete_attempt(ticket, result)
        }
    });

    match flow.await {
        Ok(outcome) => outcome.map(Json).map_err(ApiError),
        Err(e) => {
            error!("donation task aborted: {e}");
            let failure = DonationError::Unknown(None);
            state.session.lock().await.abandon_attempt(failure.clone());
            Err(ApiError(failure))
        }
    }
}
