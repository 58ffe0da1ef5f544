//! Content-generation collaborator boundary.
//!
//! The generator (a language model behind some transport) is slow and
//! unreliable. Engines never call it directly: every call site goes through
//! [`generate_text_or_fallback`], which bounds the call with a timeout,
//! checks the returned shape, and substitutes deterministic text on any
//! failure. A partially-typed response never reaches the World Model.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::diagnostics::Warning;

/// Why a generation call produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The call exceeded its budget.
    #[error("generation timed out after {0} ms")]
    Timeout(u64),

    /// The collaborator could not be reached or refused the request.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The response lacked a required field.
    #[error("malformed generator output: {0}")]
    Malformed(String),
}

/// Description of the structured output a call expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputShape {
    /// Shape name, sent to the generator.
    pub name: &'static str,
    /// Fields that must be present and non-empty.
    pub required_fields: &'static [&'static str],
    /// The field whose text is surfaced.
    pub text_field: &'static str,
}

/// One-line narration of a matured consequence chain.
pub const CHAIN_MANIFESTATION: OutputShape = OutputShape {
    name: "chain_manifestation",
    required_fields: &["text"],
    text_field: "text",
};

/// Narrative hook surfaced when jealousy crosses its threshold.
pub const JEALOUSY_HOOK: OutputShape = OutputShape {
    name: "jealousy_hook",
    required_fields: &["hook"],
    text_field: "hook",
};

/// How a psychological effect shows itself after a rollback.
pub const PSYCHOLOGICAL_MANIFESTATION: OutputShape = OutputShape {
    name: "psychological_manifestation",
    required_fields: &["manifestation"],
    text_field: "manifestation",
};

/// A structured generator response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredContent(pub Map<String, Value>);

impl StructuredContent {
    /// Builds content with a single text field.
    #[must_use]
    pub fn with_text(field: &str, text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(field.to_owned(), Value::String(text.into()));
        Self(map)
    }

    /// Returns the trimmed string value of `field` if present and non-empty.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Checks every required field of `shape` is present.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Malformed` naming the first missing field.
    pub fn conform_to(&self, shape: &OutputShape) -> Result<(), GenerationError> {
        for field in shape.required_fields {
            if self.text(field).is_none() {
                return Err(GenerationError::Malformed(format!(
                    "{} is missing required field `{field}`",
                    shape.name
                )));
            }
        }
        Ok(())
    }
}

/// The content-generation collaborator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produces content for `context_document` in the requested shape.
    async fn generate(
        &self,
        context_document: &str,
        shape: &OutputShape,
    ) -> Result<StructuredContent, GenerationError>;
}

/// A generator that is never reachable; every call falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl ContentGenerator for OfflineGenerator {
    async fn generate(
        &self,
        _context_document: &str,
        _shape: &OutputShape,
    ) -> Result<StructuredContent, GenerationError> {
        Err(GenerationError::Unavailable("no generator configured".to_owned()))
    }
}

/// Text obtained from a generation call, possibly the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// The text to use.
    pub text: String,
    /// Shape that was requested.
    pub shape: &'static str,
    /// Why the fallback was used, if it was.
    pub fallback_reason: Option<String>,
}

impl Generated {
    /// Returns `true` when the deterministic fallback was used.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.fallback_reason.is_some()
    }

    /// The warning to record for a fallback, if any.
    #[must_use]
    pub fn warning(&self) -> Option<Warning> {
        self.fallback_reason
            .as_ref()
            .map(|reason| Warning::GenerationFallback {
                shape: self.shape.to_owned(),
                reason: reason.clone(),
            })
    }
}

/// Calls the generator within `timeout` and extracts the shape's text field,
/// substituting `fallback` on timeout, error or malformed output.
pub async fn generate_text_or_fallback(
    generator: &dyn ContentGenerator,
    context_document: &str,
    shape: &OutputShape,
    timeout: Duration,
    fallback: String,
) -> Generated {
    let attempt = match tokio::time::timeout(timeout, generator.generate(context_document, shape))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    };

    let text = attempt.and_then(|content| {
        content.conform_to(shape)?;
        content
            .text(shape.text_field)
            .map(str::to_owned)
            .ok_or_else(|| {
                GenerationError::Malformed(format!(
                    "{} is missing text field `{}`",
                    shape.name, shape.text_field
                ))
            })
    });

    match text {
        Ok(text) => Generated {
            text,
            shape: shape.name,
            fallback_reason: None,
        },
        Err(err) => {
            warn!(shape = shape.name, error = %err, "generation failed, using fallback");
            Generated {
                text: fallback,
                shape: shape.name,
                fallback_reason: Some(err.to_string()),
            }
        }
    }
}
