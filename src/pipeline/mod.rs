// Generation pipeline
//
// Drives one run: pulls eligible records, builds a prompt per persona, calls
// the backend, persists the response and updates the cost ledger.
//
// Each (record, persona) pair moves Pending -> Prompted -> Responded -> Saved,
// or ends in Failed when the backend call errors. Failed pairs are logged and
// skipped, never retried within the run; since nothing was written for them,
// the next run picks them up again.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::config::{ConfigError, Settings};
use crate::cost::{CostAccountant, CostLedger, PricingTable};
use crate::data::{load_records, Persona, Record, RecordSource, PERSONAS};
use crate::prompts::{builder_for_style, PromptBuilder, PromptVersion};
use crate::providers::{create_backend, ModelBackend};
use crate::storage::{ArtifactStore, FsArtifactStore, OutputWriter, SaveOutcome};

/// Lifecycle of one (record, persona) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    Pending,
    Prompted,
    Responded,
    Saved,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome {
    pub record_id: i64,
    pub persona: Persona,
    pub state: PairState,
    /// Backend or write error, when there was one
    pub error: Option<String>,
}

/// What a run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub records: usize,
    pub attempted: usize,
    pub saved: usize,
    pub failed_calls: usize,
    pub failed_writes: usize,
    pub ledger: CostLedger,
    /// Pairs that ended short of `Saved`; saved pairs are only counted
    pub incomplete: Vec<PairOutcome>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after this many eligible records
    pub max_count: Option<usize>,
    pub show_progress: bool,
}

pub struct Orchestrator {
    source: RecordSource,
    builder: Box<dyn PromptBuilder>,
    backend: Box<dyn ModelBackend>,
    writer: OutputWriter,
    version: PromptVersion,
    accountant: Option<CostAccountant>,
}

impl Orchestrator {
    pub fn new(
        source: RecordSource,
        builder: Box<dyn PromptBuilder>,
        backend: Box<dyn ModelBackend>,
        writer: OutputWriter,
        version: PromptVersion,
    ) -> Result<Self> {
        if !backend.accepts(builder.style()) {
            return Err(ConfigError::IncompatiblePromptStyle {
                backend: backend.name().to_string(),
                style: builder.style(),
            }
            .into());
        }

        Ok(Self {
            source,
            builder,
            backend,
            writer,
            version,
            accountant: None,
        })
    }

    /// Assemble the on-disk pipeline described by `settings`
    pub fn from_settings(settings: &Settings, calculate_cost: bool) -> Result<Self> {
        let store: Arc<dyn ArtifactStore> =
            Arc::new(FsArtifactStore::new(&settings.storage_folder_path));
        let records = load_records(&settings.emotion_data_path)?;
        let source = RecordSource::new(records, &PERSONAS, settings.model.clone(), store.clone());
        let backend = create_backend(settings)?;

        tracing::info!("Model name: {}", settings.model);

        let orchestrator = Self::new(
            source,
            builder_for_style(settings.prompt_style, settings.pinned_prompt_version()),
            backend,
            OutputWriter::new(store, settings.model.clone()),
            settings.prompt_version(),
        )?;

        Ok(if calculate_cost {
            orchestrator.with_cost_tracking(CostAccountant::new(
                settings.model.clone(),
                PricingTable::with_overrides(&settings.pricing),
            ))
        } else {
            orchestrator
        })
    }

    /// Track cost of every call that reports usage
    pub fn with_cost_tracking(mut self, accountant: CostAccountant) -> Self {
        self.accountant = Some(accountant);
        self
    }

    pub async fn run(&self, options: RunOptions) -> Result<RunSummary> {
        // Without usage there is nothing to price
        if let Some(accountant) = &self.accountant {
            if self.backend.reports_usage() {
                accountant.ensure_priced()?;
            } else {
                tracing::warn!(
                    "{} reports no token usage; cost will not be tracked",
                    self.backend.name()
                );
            }
        }

        let progress = progress_bar(options.show_progress);
        let mut summary = RunSummary::default();

        for record in self.source.records(options.max_count) {
            tracing::info!("Current index: {}", record.id);
            summary.records += 1;

            for persona in self.source.personas() {
                let outcome = self.process_pair(record, *persona, &mut summary).await?;
                if outcome.state != PairState::Saved {
                    summary.incomplete.push(outcome);
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(summary)
    }

    async fn process_pair(
        &self,
        record: &Record,
        persona: Persona,
        summary: &mut RunSummary,
    ) -> Result<PairOutcome> {
        tracing::info!("Current persona: {}", persona);
        let mut outcome = PairOutcome {
            record_id: record.id,
            persona,
            state: PairState::Pending,
            error: None,
        };

        let message = self
            .builder
            .build(&record.text, Some(persona), &record.domain, self.version)
            .with_context(|| format!("Failed to build prompt for index {}", record.id))?;
        outcome.state = PairState::Prompted;
        summary.attempted += 1;

        let response = match self.backend.create_response(&message).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "Error in creating response for index {} and persona {}: {:#}",
                    record.id,
                    persona,
                    e
                );
                summary.failed_calls += 1;
                outcome.state = PairState::Failed;
                outcome.error = Some(format!("{:#}", e));
                return Ok(outcome);
            }
        };
        outcome.state = PairState::Responded;

        match self.writer.save(&response.content, persona, record.id) {
            SaveOutcome::Saved { .. } => {
                summary.saved += 1;
                outcome.state = PairState::Saved;
            }
            SaveOutcome::Failed { error, .. } => {
                summary.failed_writes += 1;
                outcome.error = Some(error);
            }
        }

        if let Some(accountant) = &self.accountant {
            match response.usage {
                Some(usage) => {
                    let cost = summary.ledger.record(accountant, usage)?;
                    tracing::info!(
                        "Cost for index {}: {}, Total cost: {}",
                        record.id,
                        cost,
                        summary.ledger.total_cost
                    );
                }
                None => tracing::debug!(
                    "{} reported no token usage; cost not tracked",
                    self.backend.name()
                ),
            }
        }

        Ok(outcome)
    }
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} records") {
        pb.set_style(style);
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{ModelPricing, PricingTable};
    use crate::data::PERSONAS;
    use crate::prompts::{ChatPromptBuilder, GeneratedMessage, InstructionPromptBuilder};
    use crate::providers::{ModelResponse, TokenUsage};
    use crate::storage::{ArtifactStore, MemoryArtifactStore};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers every call, failing for one persona label
    struct ScriptedBackend {
        fail_for: Option<&'static str>,
        usage: Option<TokenUsage>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn create_response(&self, message: &GeneratedMessage) -> Result<ModelResponse> {
            *self.calls.lock().unwrap() += 1;
            let system = &message.as_chat().unwrap()[0].content;
            if let Some(label) = self.fail_for {
                if system.contains(&format!("role of a {}.", label)) {
                    anyhow::bail!("connection reset");
                }
            }
            let response = ModelResponse::new("আনন্দ");
            Ok(match self.usage {
                Some(usage) => response.with_usage(usage),
                None => response,
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn reports_usage(&self) -> bool {
            self.usage.is_some()
        }
    }

    fn records() -> Vec<Record> {
        (1..=3)
            .map(|id| Record {
                id,
                text: format!("text {}", id),
                domain: "social".to_string(),
            })
            .collect()
    }

    fn orchestrator(store: Arc<MemoryArtifactStore>, backend: ScriptedBackend) -> Orchestrator {
        let source = RecordSource::new(records(), &PERSONAS, "gpt-4o", store.clone());
        Orchestrator::new(
            source,
            Box::new(ChatPromptBuilder::new()),
            Box::new(backend),
            OutputWriter::new(store, "gpt-4o"),
            PromptVersion::ClosedVocabulary,
        )
        .unwrap()
    }

    fn backend(fail_for: Option<&'static str>, usage: Option<TokenUsage>) -> ScriptedBackend {
        ScriptedBackend {
            fail_for,
            usage,
            calls: Mutex::new(0),
        }
    }

    #[tokio::test]
    async fn test_every_pair_saved() {
        let store = Arc::new(MemoryArtifactStore::new());
        let summary = orchestrator(store.clone(), backend(None, None))
            .run(RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.saved, 6);
        assert_eq!(store.len(), 6);
        assert!(summary.incomplete.is_empty());
    }

    #[tokio::test]
    async fn test_failed_call_does_not_stop_other_persona() {
        let store = Arc::new(MemoryArtifactStore::new());
        let summary = orchestrator(store.clone(), backend(Some("man"), None))
            .run(RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.attempted, 6);
        assert_eq!(summary.failed_calls, 3);
        assert_eq!(summary.saved, 3);
        assert_eq!(summary.incomplete.len(), 3);
        for outcome in &summary.incomplete {
            assert_eq!(outcome.persona, Persona::Man);
            assert_eq!(outcome.state, PairState::Failed);
            assert!(outcome.error.as_deref().unwrap().contains("connection reset"));
        }
        let key = crate::storage::ArtifactKey::new(1, Persona::Man, "gpt-4o");
        assert!(!store.exists(&key));
    }

    #[tokio::test]
    async fn test_max_count_caps_records() {
        let store = Arc::new(MemoryArtifactStore::new());
        let summary = orchestrator(store.clone(), backend(None, None))
            .run(RunOptions {
                max_count: Some(2),
                show_progress: false,
            })
            .await
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(store.write_count(), 4);
    }

    #[tokio::test]
    async fn test_cost_ledger_tracks_usage() {
        let store = Arc::new(MemoryArtifactStore::new());
        let mut table = PricingTable::empty();
        table.insert("gpt-4o", ModelPricing::new(0.5e-6, 1.5e-6));

        let summary = orchestrator(store, backend(None, Some(TokenUsage::new(100, 50))))
            .with_cost_tracking(CostAccountant::new("gpt-4o", table))
            .run(RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.ledger.calls, 6);
        assert_eq!(summary.ledger.input_tokens, 600);
        assert!((summary.ledger.total_cost - 6.0 * 125e-6).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unpriced_model_fails_before_any_call() {
        let store = Arc::new(MemoryArtifactStore::new());
        let orchestrator = orchestrator(store.clone(), backend(None, Some(TokenUsage::new(1, 1))))
            .with_cost_tracking(CostAccountant::new("gpt-4o", PricingTable::empty()));

        let err = orchestrator.run(RunOptions::default()).await.unwrap_err();

        assert!(err.downcast_ref::<crate::cost::CostError>().is_some());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_usage_less_backend_runs_with_unpriced_model() {
        let store = Arc::new(MemoryArtifactStore::new());
        let summary = orchestrator(store.clone(), backend(None, None))
            .with_cost_tracking(CostAccountant::new("local-llama", PricingTable::empty()))
            .run(RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.saved, 6);
        assert_eq!(store.write_count(), 6);
        assert!(summary.incomplete.is_empty());
        assert_eq!(summary.ledger.calls, 0);
        assert_eq!(summary.ledger.total_cost, 0.0);
    }

    #[tokio::test]
    async fn test_usage_less_backend_leaves_ledger_empty() {
        let store = Arc::new(MemoryArtifactStore::new());
        let mut table = PricingTable::empty();
        table.insert("gpt-4o", ModelPricing::new(0.5e-6, 1.5e-6));

        let summary = orchestrator(store, backend(None, None))
            .with_cost_tracking(CostAccountant::new("gpt-4o", table))
            .run(RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.saved, 6);
        assert_eq!(summary.ledger.calls, 0);
        assert_eq!(summary.ledger.input_tokens, 0);
    }

    #[test]
    fn test_incompatible_builder_rejected() {
        let store = Arc::new(MemoryArtifactStore::new());
        let source = RecordSource::new(records(), &PERSONAS, "gpt-4o", store.clone());
        let result = Orchestrator::new(
            source,
            Box::new(InstructionPromptBuilder::new()),
            Box::new(backend(None, None)),
            OutputWriter::new(store, "gpt-4o"),
            PromptVersion::ClosedVocabulary,
        );

        assert!(result.is_err());
    }
}
