//! Chronoweave API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use chronoweave_api::error::AppError;
use chronoweave_api::generator::HttpContentGenerator;
use chronoweave_api::rosters::RosterFile;
use chronoweave_api::routes;
use chronoweave_api::state::AppState;
use chronoweave_core::clock::SystemClock;
use chronoweave_core::config::SimulationConfig;
use chronoweave_core::rng::{DeterministicRng, SeededRng};
use chronoweave_sync::application::manager::SynchronizationManager;
use chronoweave_sync::domain::trigger::FlagLoopTrigger;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Chronoweave API server");

    // Read configuration from environment.
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
    let config = match std::env::var("CHRONOWEAVE_CONFIG") {
        Ok(path) => SimulationConfig::load(&path)?,
        Err(_) => SimulationConfig::default(),
    };
    let loop_flag = std::env::var("LOOP_FLAG").unwrap_or_else(|_| "player_died".to_string());

    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = match std::env::var("RNG_SEED") {
        Ok(seed) => {
            let seed: u64 = seed
                .parse()
                .map_err(|e| AppError::Config(format!("RNG_SEED must be a valid u64: {e}")))?;
            tracing::info!(seed, "using seeded RNG");
            Arc::new(Mutex::new(SeededRng::from_seed(seed)))
        }
        Err(_) => Arc::new(Mutex::new(SeededRng::from_entropy())),
    };

    // Build the synchronization manager.
    let mut manager = SynchronizationManager::new(config, rng, Arc::new(SystemClock))
        .with_loop_trigger(Arc::new(FlagLoopTrigger::new(loop_flag)));
    if let Ok(path) = std::env::var("CHRONOWEAVE_ROSTER") {
        let (npcs, threads) = RosterFile::load(&path)?.into_rosters();
        manager = manager.with_rosters(Arc::new(npcs), Arc::new(threads));
    }
    let generator_kind = match std::env::var("GENERATOR_URL") {
        Ok(url) => {
            let generator = HttpContentGenerator::new(url)?;
            tracing::info!(endpoint = generator.endpoint(), "using HTTP content generator");
            manager = manager.with_generator(Arc::new(generator));
            "http"
        }
        Err(_) => {
            tracing::warn!("GENERATOR_URL not set; narration will use fallback text");
            "offline"
        }
    };

    let app_state = AppState::new(manager, generator_kind);

    // Build router.
    let app = routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
