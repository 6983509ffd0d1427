//! API routes for ludusd.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

use ludus_common::rpc::{
    CompleteGameRequest, CompleteGameResponse, ErrorBody, HealthResponse, LeaderboardEntry,
    LeaderboardPeriod, LearnerUpsert, ProgressView, TransactionView, UnlockReplayResponse,
    WalletView,
};
use ludus_common::{GameProgress, Learner, LudusError, VERSION};

use crate::state::AppState;
use crate::{completion, leaderboard, replay};

type AppStateArc = Arc<AppState>;
type ApiError = (StatusCode, Json<ErrorBody>);

/// Map a domain error onto an HTTP status and wire body. Unexpected
/// failures are logged here and reported generically.
fn map_error(err: LudusError) -> ApiError {
    let status = match &err {
        LudusError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        LudusError::GameNotFound(_) => StatusCode::NOT_FOUND,
        LudusError::Validation(_) | LudusError::InsufficientBalance { .. } => {
            StatusCode::BAD_REQUEST
        }
        LudusError::Io(_) | LudusError::Json(_) | LudusError::Internal(_) => {
            error!("Request failed: {err}");
            let generic = LudusError::Internal("internal error".to_string());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::from_error(&generic)),
            );
        }
    };
    (status, Json(ErrorBody::from_error(&err)))
}

// ============================================================================
// Game routes
// ============================================================================

pub fn game_routes() -> Router<AppStateArc> {
    Router::new()
        .route(
            "/v1/learners/:learner_id/games/:game_id/complete",
            post(complete_game),
        )
        .route(
            "/v1/learners/:learner_id/games/:game_id/replay/unlock",
            post(unlock_replay),
        )
        .route(
            "/v1/learners/:learner_id/games/:game_id/progress",
            get(get_progress),
        )
        .route("/v1/learners/:learner_id/progress", get(get_batch_progress))
}

async fn complete_game(
    State(state): State<AppStateArc>,
    Path((learner_id, game_id)): Path<(String, String)>,
    Json(req): Json<CompleteGameRequest>,
) -> Result<Json<CompleteGameResponse>, ApiError> {
    completion::complete_game(&state, &learner_id, &game_id, req)
        .await
        .map(Json)
        .map_err(map_error)
}

async fn unlock_replay(
    State(state): State<AppStateArc>,
    Path((learner_id, game_id)): Path<(String, String)>,
) -> Result<Json<UnlockReplayResponse>, ApiError> {
    replay::unlock_replay(&state, &learner_id, &game_id)
        .await
        .map(Json)
        .map_err(map_error)
}

/// Progress is never a 404: unknown pairs answer with zeroed defaults.
async fn get_progress(
    State(state): State<AppStateArc>,
    Path((learner_id, game_id)): Path<(String, String)>,
) -> Json<ProgressView> {
    let progress = state.progress.read().await;
    let view = match progress.get(&learner_id, &game_id) {
        Some(record) => ProgressView::from(record),
        None => ProgressView::from(&GameProgress::new(game_id)),
    };
    Json(view)
}

#[derive(Debug, Deserialize)]
struct BatchProgressQuery {
    #[serde(default)]
    category: Option<String>,
}

async fn get_batch_progress(
    State(state): State<AppStateArc>,
    Path(learner_id): Path<String>,
    Query(query): Query<BatchProgressQuery>,
) -> Json<BTreeMap<String, ProgressView>> {
    let progress = state.progress.read().await;
    let mut views = BTreeMap::new();
    if let Some(games) = progress.for_learner(&learner_id) {
        let prefix = query.category.unwrap_or_default();
        for (game_id, record) in games {
            if game_id.starts_with(&prefix) {
                views.insert(game_id.clone(), ProgressView::from(record));
            }
        }
    }
    Json(views)
}

// ============================================================================
// Learner routes
// ============================================================================

pub fn learner_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/learners/:learner_id", put(put_learner))
        .route("/v1/learners/:learner_id/wallet", get(get_wallet))
}

async fn put_learner(
    State(state): State<AppStateArc>,
    Path(learner_id): Path<String>,
    Json(update): Json<LearnerUpsert>,
) -> Json<Learner> {
    let mut learners = state.learners.write().await;
    let mut learner = learners.get_or_default(&learner_id);
    if let Some(name) = update.display_name {
        learner.display_name = name;
    }
    if let Some(dob) = update.date_of_birth {
        learner.date_of_birth = Some(dob);
    }
    if let Some(tenant) = update.tenant {
        learner.tenant = Some(tenant);
    }
    if let Some(plan) = update.plan {
        learner.plan = plan;
    }
    learners.upsert(learner.clone());
    drop(learners);
    state.persist().await;
    Json(learner)
}

async fn get_wallet(
    State(state): State<AppStateArc>,
    Path(learner_id): Path<String>,
) -> Json<WalletView> {
    let wallets = state.wallets.read().await;
    let view = match wallets.get(&learner_id) {
        Some(wallet) => WalletView {
            learner_id: learner_id.clone(),
            balance: wallet.balance,
            transactions: wallet
                .transactions
                .iter()
                .rev()
                .take(state.config.transactions_returned)
                .map(TransactionView::from)
                .collect(),
        },
        None => WalletView {
            learner_id: learner_id.clone(),
            balance: 0,
            transactions: Vec::new(),
        },
    };
    Json(view)
}

// ============================================================================
// Leaderboard routes
// ============================================================================

pub fn leaderboard_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/leaderboard/:period", get(get_leaderboard))
}

async fn get_leaderboard(
    State(state): State<AppStateArc>,
    Path(period): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let period: LeaderboardPeriod = period.parse().map_err(map_error)?;
    Ok(Json(leaderboard::top_entries(&state, period).await))
}

// ============================================================================
// Health routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        games_in_catalog: state.catalog.len(),
        learners_tracked: state.progress.read().await.learner_count(),
    })
}
