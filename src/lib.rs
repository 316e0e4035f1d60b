// Emogen - persona-conditioned emotion generation
// Library exports

pub mod config;
pub mod cost;
pub mod data;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod storage;

pub use pipeline::{Orchestrator, PairOutcome, PairState, RunOptions, RunSummary};
