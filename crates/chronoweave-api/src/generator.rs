//! HTTP content generator.
//!
//! Posts the context document and the requested output shape to a
//! configured endpoint and expects a JSON object back. Every transport or
//! decoding problem becomes a `GenerationError`, which the engines recover
//! from with fallback text.

use async_trait::async_trait;
use chronoweave_core::generation::{
    ContentGenerator, GenerationError, OutputShape, StructuredContent,
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Request body sent to the generation endpoint.
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    shape: &'a OutputShape,
    context: &'a str,
}

/// A `ContentGenerator` backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpContentGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContentGenerator {
    /// Creates a generator posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest::Error` if the client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(
        &self,
        context_document: &str,
        shape: &OutputShape,
    ) -> Result<StructuredContent, GenerationError> {
        let request = GenerationRequest {
            shape,
            context: context_document,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Unavailable(format!(
                "generator returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        debug!(shape = shape.name, "generator responded");
        into_content(body)
    }
}

fn into_content(body: Value) -> Result<StructuredContent, GenerationError> {
    match body {
        Value::Object(map) => Ok(StructuredContent(map)),
        other => Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
