//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, TOML persistence via
//! `AppConfig::load` / `AppConfig::save`, and the `ConfigStore` seam used by
//! the service registry.

pub mod paths;
pub mod settings;
pub mod store;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AudioConfig, DictationConfig, RuntimeConfig, StartupBehavior,
    DEFAULT_ACTION_VERBS,
};
pub use store::{ConfigStore, TomlConfigStore};
