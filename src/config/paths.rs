//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout (per the persistent state layout in the specification):
//!
//!   Config dir:
//!     Windows: %APPDATA%\juno-dictation\
//!     macOS:   ~/Library/Application Support/juno-dictation/
//!     Linux:   ~/.config/juno-dictation/
//!
//!   Data dir (logs, cache, temp bookkeeping):
//!     Windows: %LOCALAPPDATA%\juno-dictation\
//!     macOS:   ~/Library/Application Support/juno-dictation/
//!     Linux:   ~/.local/share/juno-dictation/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `config.toml` and `.encryption-key`.
    pub config_dir: PathBuf,
    /// Full path to `config.toml`.
    pub settings_file: PathBuf,
    /// Full path to the `.encryption-key` marker file (mode 0600, 64 hex chars).
    pub encryption_key_file: PathBuf,
    /// Directory for rotated log files.
    pub logs_dir: PathBuf,
    /// Directory used solely by the Transcription Orchestrator's cache.
    pub cache_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "juno-dictation";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("config.toml");
        let encryption_key_file = config_dir.join(".encryption-key");
        let logs_dir = data_dir.join("logs");
        let cache_dir = data_dir.join("audio-processing").join("cache");

        Self {
            config_dir,
            settings_file,
            encryption_key_file,
            logs_dir,
            cache_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "config.toml"));
        assert!(paths
            .encryption_key_file
            .file_name()
            .is_some_and(|n| n == ".encryption-key"));
    }

    #[test]
    fn cache_dir_matches_orchestrator_layout() {
        let paths = AppPaths::new();
        assert!(paths.cache_dir.ends_with("audio-processing/cache"));
    }
}
