//! Routes for validation-only synchronization.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use chronoweave_core::world::WorldModel;
use chronoweave_sync::application::manager::SyncResult;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /api/v1/sync.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// The World Model to validate.
    pub world: WorldModel,
}

/// POST /api/v1/sync
#[instrument(skip(state, request))]
async fn synchronize(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResult>, ApiError> {
    info!("handling synchronize request");

    let result = state.manager.synchronize_all_systems(request.world);

    if result.is_rejected() {
        return Err(result.into());
    }
    Ok(Json(result))
}

/// Returns the router for synchronization.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/sync", post(synchronize))
}
