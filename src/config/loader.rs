// Configuration loader
// Reads run settings from a config file (YAML, TOML or JSON) with EMOGEN_*
// environment overrides

use std::path::Path;

use super::settings::{ConfigError, Settings};

/// Prefix for environment overrides, e.g. `EMOGEN_MODEL`
pub const ENV_PREFIX: &str = "EMOGEN";

/// Load and validate settings from `path`.
///
/// The file format follows the extension. Environment variables with the
/// `EMOGEN_` prefix override file values.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    tracing::debug!(
        "Loaded settings from {} (model: {}, backend: {})",
        path.display(),
        settings.model,
        settings.backend.as_str()
    );
    Ok(settings)
}
