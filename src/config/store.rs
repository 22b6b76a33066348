//! The Configuration Store seam.
//!
//! Behind a trait so a host embedding this crate can substitute a richer
//! store (e.g. one backed by a platform keychain for `openai_api_key`)
//! without touching the rest of the pipeline.

use anyhow::Result;

use super::{AppConfig, AppPaths};

/// Loads and persists [`AppConfig`]. The default adapter, [`TomlConfigStore`],
/// round-trips through the platform config directory exactly as
/// [`AppConfig::load`]/[`AppConfig::save`] do.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<AppConfig>;
    fn save(&self, config: &AppConfig) -> Result<()>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ConfigStore>) {}
};

/// Reads and writes `config.toml` under the platform config directory.
pub struct TomlConfigStore {
    paths: AppPaths,
}

impl TomlConfigStore {
    pub fn new() -> Self {
        Self {
            paths: AppPaths::new(),
        }
    }

    pub fn with_paths(paths: AppPaths) -> Self {
        Self { paths }
    }
}

impl Default for TomlConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig> {
        AppConfig::load_from(&self.paths.settings_file)
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        config.save_to(&self.paths.settings_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_store() {
        let dir = tempdir().expect("temp dir");
        let mut paths = AppPaths::new();
        paths.settings_file = dir.path().join("config.toml");
        let store = TomlConfigStore::with_paths(paths);

        let mut config = store.load().expect("load default");
        config.dictation.ai_model = "gpt-4o".into();
        store.save(&config).expect("save");

        let reloaded = store.load().expect("reload");
        assert_eq!(reloaded.dictation.ai_model, "gpt-4o");
    }
}
