// Eligibility filtering and the record source
//
// Progress is never stored separately: a record is done as soon as any of its
// persona artifacts exists, and the source re-derives that from the artifact
// store each time it is iterated.

use std::sync::Arc;

use super::dataset::Record;
use super::persona::Persona;
use crate::storage::{ArtifactKey, ArtifactStore};

/// Whether `record_id` still needs generation.
///
/// Resume granularity is the whole record: if the artifact for any persona
/// exists, every persona of that record is skipped.
pub fn is_eligible(
    record_id: i64,
    personas: &[Persona],
    model_name: &str,
    store: &dyn ArtifactStore,
) -> bool {
    for persona in personas {
        let key = ArtifactKey::new(record_id, *persona, model_name);
        if store.exists(&key) {
            tracing::info!("Response already exist for index: {}", record_id);
            return false;
        }
    }
    true
}

/// Map a record cap where any non-positive value means "no cap"
pub fn max_count_from_sentinel(total: i64) -> Option<usize> {
    if total > 0 {
        usize::try_from(total).ok()
    } else {
        None
    }
}

/// Ordered, lazily filtered view over the loaded dataset
pub struct RecordSource {
    records: Vec<Record>,
    personas: Vec<Persona>,
    model_name: String,
    store: Arc<dyn ArtifactStore>,
}

impl RecordSource {
    pub fn new(
        records: Vec<Record>,
        personas: &[Persona],
        model_name: impl Into<String>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            records,
            personas: personas.to_vec(),
            model_name: model_name.into(),
            store,
        }
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    /// Total number of loaded records, eligible or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Eligible records in dataset order, stopping after `max_count` if set.
    ///
    /// Eligibility is checked as each record is pulled, against the store's
    /// state at that moment. Calling this again starts a fresh scan.
    pub fn records(&self, max_count: Option<usize>) -> impl Iterator<Item = &Record> + '_ {
        let eligible = self.records.iter().filter(move |record| {
            is_eligible(
                record.id,
                &self.personas,
                &self.model_name,
                self.store.as_ref(),
            )
        });
        eligible.take(max_count.unwrap_or(usize::MAX))
    }
}
