//! Routes for turn processing.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use chronoweave_core::world::{TurnId, WorldModel};
use chronoweave_sync::application::manager::SyncResult;
use chronoweave_sync::domain::action::PlayerAction;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /api/v1/turns.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    /// The turn being played.
    pub turn_id: TurnId,
    /// What the player did. Defaults to an empty action.
    #[serde(default)]
    pub action: PlayerAction,
    /// The caller's World Model. Defaults to an empty world.
    #[serde(default)]
    pub world: WorldModel,
}

/// POST /api/v1/turns
#[instrument(skip(state, request), fields(turn_id = request.turn_id))]
async fn process_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<SyncResult>, ApiError> {
    info!("handling process_turn request");

    let result = state
        .manager
        .process_turn(&request.action, request.world, request.turn_id)
        .await;

    if result.is_rejected() {
        return Err(result.into());
    }
    Ok(Json(result))
}

/// Returns the router for turn processing.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/turns", post(process_turn))
}
