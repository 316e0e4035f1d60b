// Storage module
// Artifact addressing, stores, and the best-effort output writer

mod artifact;
mod writer;

pub use artifact::{
    sanitize_model_name, ArtifactKey, ArtifactStore, FsArtifactStore, MemoryArtifactStore,
};
pub use writer::{OutputWriter, SaveOutcome};
