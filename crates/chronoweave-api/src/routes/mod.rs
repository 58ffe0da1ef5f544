//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod sync;
pub mod turns;

/// Every route, without state or middleware.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(turns::router())
        .merge(sync::router())
}
