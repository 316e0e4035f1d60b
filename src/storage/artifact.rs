// Output artifact addressing and stores
//
// An artifact is the persisted response for one (record, persona, model)
// triple. Its presence is what resume logic checks, so the key -> location
// mapping must stay deterministic across runs.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::data::Persona;

/// Make a model identifier safe to embed in a file name.
///
/// Keeps the last path segment (dropping any vendor prefix), then maps `.`
/// and `-` to `_`: `vendor/model-name.v1` becomes `model_name_v1`.
pub fn sanitize_model_name(model_name: &str) -> String {
    let base = model_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(model_name);
    base.replace(['.', '-'], "_")
}

/// Address of one output artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub record_id: i64,
    pub persona: Persona,
    /// Already sanitized with [`sanitize_model_name`]
    pub model_name: String,
}

impl ArtifactKey {
    pub fn new(record_id: i64, persona: Persona, raw_model_name: &str) -> Self {
        Self {
            record_id,
            persona,
            model_name: sanitize_model_name(raw_model_name),
        }
    }

    /// `<record_id>/<persona>_<model>_response.txt`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.record_id.to_string()).join(self.file_name())
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}_response.txt", self.persona.label(), self.model_name)
    }
}

/// Checkpoint substrate for generated responses
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact already exists for `key`
    fn exists(&self, key: &ArtifactKey) -> bool;

    /// Persist `content` for `key`, replacing any previous content
    fn write(&self, key: &ArtifactKey, content: &str) -> Result<()>;

    /// Human-readable location, used in log events
    fn location(&self, key: &ArtifactKey) -> String;
}

/// Artifact store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, key: &ArtifactKey) -> bool {
        self.path_for(key).exists()
    }

    fn write(&self, key: &ArtifactKey, content: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write artifact: {}", path.display()))
    }

    fn location(&self, key: &ArtifactKey) -> String {
        self.path_for(key).display().to_string()
    }
}

/// In-memory artifact store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<ArtifactKey, String>>,
    write_count: Mutex<usize>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an artifact without counting it as a write
    pub fn insert(&self, key: ArtifactKey, content: impl Into<String>) {
        if let Ok(mut artifacts) = self.artifacts.lock() {
            artifacts.insert(key, content.into());
        }
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<String> {
        self.artifacts.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `write` calls served so far
    pub fn write_count(&self) -> usize {
        self.write_count.lock().map(|c| *c).unwrap_or(0)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn exists(&self, key: &ArtifactKey) -> bool {
        self.artifacts
            .lock()
            .map(|a| a.contains_key(key))
            .unwrap_or(false)
    }

    fn write(&self, key: &ArtifactKey, content: &str) -> Result<()> {
        let mut artifacts = self
            .artifacts
            .lock()
            .map_err(|_| anyhow::anyhow!("Artifact store lock poisoned"))?;
        artifacts.insert(key.clone(), content.to_string());
        if let Ok(mut count) = self.write_count.lock() {
            *count += 1;
        }
        Ok(())
    }

    fn location(&self, key: &ArtifactKey) -> String {
        format!("memory://{}", key.relative_path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_model_name() {
        assert_eq!(sanitize_model_name("vendor/model-name.v1"), "model_name_v1");
        assert_eq!(sanitize_model_name("gpt-3.5-turbo"), "gpt_3_5_turbo");
        assert_eq!(sanitize_model_name("gpt-4o"), "gpt_4o");
        assert_eq!(sanitize_model_name("plain"), "plain");
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        let first = sanitize_model_name("vendor/model-name.v1");
        for _ in 0..3 {
            assert_eq!(sanitize_model_name("vendor/model-name.v1"), first);
        }
    }

    #[test]
    fn test_artifact_relative_path() {
        let key = ArtifactKey::new(42, Persona::Woman, "gpt-4o");
        assert_eq!(
            key.relative_path(),
            PathBuf::from("42").join("woman_gpt_4o_response.txt")
        );
    }

    #[test]
    fn test_fs_store_creates_directories_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let key = ArtifactKey::new(5, Persona::Man, "gpt-4o");

        assert!(!store.exists(&key));
        store.write(&key, "partial").unwrap();
        store.write(&key, "আনন্দ").unwrap();

        assert!(store.exists(&key));
        let written = fs::read_to_string(dir.path().join("5/man_gpt_4o_response.txt")).unwrap();
        assert_eq!(written, "আনন্দ");
    }

    #[test]
    fn test_memory_store_counts_writes_not_seeds() {
        let store = MemoryArtifactStore::new();
        let key = ArtifactKey::new(1, Persona::Man, "m");

        store.insert(key.clone(), "seeded");
        assert!(store.exists(&key));
        assert_eq!(store.write_count(), 0);

        store.write(&key, "fresh").unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get(&key).as_deref(), Some("fresh"));
    }
}
