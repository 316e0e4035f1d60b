// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{load_settings, ENV_PREFIX};
pub use settings::{ConfigError, Settings, API_KEY_ENV};
