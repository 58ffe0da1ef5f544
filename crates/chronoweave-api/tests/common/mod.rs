//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chronoweave_core::config::SimulationConfig;
use chronoweave_core::generation::ContentGenerator;
use chronoweave_core::rng::DeterministicRng;
use chronoweave_core::roster::InMemoryRoster;
use chronoweave_sync::application::manager::SynchronizationManager;
use chronoweave_sync::domain::trigger::FlagLoopTrigger;
use chronoweave_test_support::{MockRng, fixed_clock};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use chronoweave_api::routes;
use chronoweave_api::state::AppState;

/// The ids every test world may reference.
pub struct Cast {
    pub npcs: Vec<Uuid>,
    pub thread: Uuid,
}

impl Cast {
    pub fn new() -> Self {
        Self {
            npcs: (0..4).map(|_| Uuid::new_v4()).collect(),
            thread: Uuid::new_v4(),
        }
    }
}

/// Build the full app router with deterministic Clock/RNG, the offline
/// generator, and rosters holding the cast. Uses the same routes as
/// `main.rs`.
pub fn build_test_app(cast: &Cast) -> Router {
    build_test_app_with(cast, None)
}

/// As [`build_test_app`], with a custom content generator.
pub fn build_test_app_with(cast: &Cast, generator: Option<Arc<dyn ContentGenerator>>) -> Router {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
    let mut manager =
        SynchronizationManager::new(SimulationConfig::default(), rng, Arc::new(fixed_clock()))
            .with_rosters(
                Arc::new(InMemoryRoster::from_ids(cast.npcs.iter().copied())),
                Arc::new(InMemoryRoster::from_ids([cast.thread])),
            )
            .with_loop_trigger(Arc::new(FlagLoopTrigger::new("player_died")));
    let kind = match generator {
        Some(generator) => {
            manager = manager.with_generator(generator);
            "http"
        }
        None => "offline",
    };

    routes::api_router().with_state(AppState::new(manager, kind))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or_default();

    (status, json)
}
