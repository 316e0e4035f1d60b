// Output writer
//
// Best-effort persistence: a failed write is logged and reported through
// `SaveOutcome`, never returned as an error, so one lost artifact does not
// stop generation for later records.

use std::sync::Arc;

use super::artifact::{ArtifactKey, ArtifactStore};
use crate::data::Persona;

/// Result of one save attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { location: String },
    Failed { location: String, error: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

pub struct OutputWriter {
    store: Arc<dyn ArtifactStore>,
    model_name: String,
}

impl OutputWriter {
    /// `model_name` is the raw identifier; it is sanitized per key.
    pub fn new(store: Arc<dyn ArtifactStore>, model_name: impl Into<String>) -> Self {
        Self {
            store,
            model_name: model_name.into(),
        }
    }

    pub fn save(&self, content: &str, persona: Persona, record_id: i64) -> SaveOutcome {
        let key = ArtifactKey::new(record_id, persona, &self.model_name);
        let location = self.store.location(&key);

        match self.store.write(&key, content) {
            Ok(()) => {
                tracing::info!("Content saved to file: {}", location);
                SaveOutcome::Saved { location }
            }
            Err(e) => {
                tracing::error!(
                    record_id,
                    persona = %persona,
                    "Error occurred while writing to {}: {:#}",
                    location,
                    e
                );
                SaveOutcome::Failed {
                    location,
                    error: format!("{:#}", e),
                }
            }
        }
    }
}
