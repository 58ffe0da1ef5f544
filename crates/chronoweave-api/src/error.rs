//! Chronoweave API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chronoweave_core::config::ConfigError;
use chronoweave_sync::application::manager::SyncResult;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The simulation config file could not be loaded.
    #[error("simulation config error: {0}")]
    Simulation(#[from] ConfigError),

    /// The content generator client could not be built.
    #[error("generator client error: {0}")]
    Generator(#[from] reqwest::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned when the engines reject a request.
#[derive(Debug, Serialize)]
pub struct RejectionBody<'a> {
    /// Machine-readable error code of the first error.
    pub error: &'a str,
    /// Human-readable error message of the first error.
    pub message: &'a str,
    /// The full report, carrying the caller's unchanged World Model.
    pub report: &'a SyncResult,
}

/// A rejected turn or validation pass, rendered as 422 with the full report.
#[derive(Debug)]
pub struct ApiError(pub Box<SyncResult>);

impl From<SyncResult> for ApiError {
    fn from(result: SyncResult) -> Self {
        Self(Box::new(result))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, message) = self
            .0
            .errors
            .first()
            .map_or(("rejected", ""), |e| (e.code.as_str(), e.message.as_str()));

        let body = RejectionBody {
            error,
            message,
            report: &self.0,
        };

        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}
