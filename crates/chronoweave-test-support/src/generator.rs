//! Test generators: `ContentGenerator` doubles for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chronoweave_core::generation::{
    ContentGenerator, GenerationError, OutputShape, StructuredContent,
};

/// A generator that answers each output shape with scripted text in its
/// text field and records every context document it was given.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: HashMap<&'static str, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    /// Creates a generator with no scripted responses; unscripted shapes
    /// come back empty and are treated as malformed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the text returned for `shape`.
    #[must_use]
    pub fn respond(mut self, shape: &OutputShape, text: impl Into<String>) -> Self {
        self.responses.insert(shape.name, text.into());
        self
    }

    /// Returns `(shape name, context document)` for every call so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        context_document: &str,
        shape: &OutputShape,
    ) -> Result<StructuredContent, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((shape.name.to_owned(), context_document.to_owned()));
        Ok(self
            .responses
            .get(shape.name)
            .map(|text| StructuredContent::with_text(shape.text_field, text.clone()))
            .unwrap_or_default())
    }
}

/// A generator that always fails with the configured error.
#[derive(Debug, Clone)]
pub struct FailingGenerator(pub GenerationError);

impl Default for FailingGenerator {
    fn default() -> Self {
        Self(GenerationError::Unavailable("connection refused".to_owned()))
    }
}

#[async_trait]
impl ContentGenerator for FailingGenerator {
    async fn generate(
        &self,
        _context_document: &str,
        _shape: &OutputShape,
    ) -> Result<StructuredContent, GenerationError> {
        Err(self.0.clone())
    }
}
