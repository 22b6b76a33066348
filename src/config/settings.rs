//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StartupBehavior
// ---------------------------------------------------------------------------

/// How the daemon presents itself immediately after launch.
///
/// The daemon is headless, so the only observable effect today is whether a
/// startup notification is shown; the variant stays because it is part of
/// the fixed configuration schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupBehavior {
    Minimized,
    Normal,
}

impl Default for StartupBehavior {
    fn default() -> Self {
        Self::Minimized
    }
}

// ---------------------------------------------------------------------------
// DictationConfig
// ---------------------------------------------------------------------------

/// Default action verbs recognized by the command classifier.
pub const DEFAULT_ACTION_VERBS: &[&str] = &[
    "summarize",
    "explain",
    "analyze",
    "rewrite",
    "translate",
    "improve",
    "simplify",
    "elaborate",
    "fix",
    "check",
    "shorten",
    "expand",
    "clarify",
    "lengthen",
    "write",
    "update",
    "modify",
    "edit",
    "revise",
    "make",
];

fn default_action_verbs() -> Vec<String> {
    DEFAULT_ACTION_VERBS.iter().map(|s| s.to_string()).collect()
}

fn default_trigger_word() -> String {
    "juno".into()
}

fn default_ai_model() -> String {
    "gpt-4".into()
}

fn default_ai_temperature() -> f32 {
    0.7
}

fn default_keyboard_shortcut() -> String {
    "CommandOrControl+Shift+Space".into()
}

/// Settings for the trigger-word classifier and the AI command processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationConfig {
    /// Provider API key. Never logged — see [`DictationConfig::api_key_redacted`].
    pub openai_api_key: String,
    pub ai_trigger_word: String,
    pub ai_model: String,
    /// Sampling temperature sent to the AI provider (0.0 - 2.0).
    pub ai_temperature: f32,
    /// Free-form rules prepended to every AI command prompt.
    pub ai_rules: Vec<String>,
    pub startup_behavior: StartupBehavior,
    /// Capture device name — `None` means the system default.
    pub default_microphone: Option<String>,
    /// Verbs that, spoken first, are treated as command openers.
    pub action_verbs: Vec<String>,
    pub action_verbs_enabled: bool,
    pub keyboard_shortcut: String,
    pub pause_background_audio: bool,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            ai_trigger_word: default_trigger_word(),
            ai_model: default_ai_model(),
            ai_temperature: default_ai_temperature(),
            ai_rules: Vec::new(),
            startup_behavior: StartupBehavior::default(),
            default_microphone: None,
            action_verbs: default_action_verbs(),
            action_verbs_enabled: true,
            keyboard_shortcut: default_keyboard_shortcut(),
            pause_background_audio: false,
        }
    }
}

impl DictationConfig {
    /// Rejects schema violations that `serde` defaults can't express.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.ai_temperature) {
            anyhow::bail!("ai_temperature {} out of range [0.0, 2.0]", self.ai_temperature);
        }
        if self.ai_trigger_word.trim().is_empty() {
            anyhow::bail!("ai_trigger_word must be non-empty");
        }
        Ok(())
    }

    /// A display-safe stand-in for the API key, for log lines.
    pub fn api_key_redacted(&self) -> &'static str {
        if self.openai_api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture-side settings. The wire format handed to the STT provider
/// (mono, 16-bit PCM, 16 kHz) is fixed and not user-configurable; these
/// knobs only affect how capture is buffered locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub ring_buffer_chunks: usize,
    /// Recordings longer than this are force-finalized.
    pub max_recording_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            ring_buffer_chunks: 128,
            max_recording_secs: 600.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Timeouts and cache sizing shared by the orchestrator and AI processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub transcription_timeout_secs: u64,
    pub ai_timeout_secs: u64,
    pub selection_timeout_ms: u64,
    pub paste_ack_timeout_ms: u64,
    pub transcription_cache_capacity: usize,
    pub transcription_cache_ttl_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            transcription_timeout_secs: 10,
            ai_timeout_secs: 5,
            selection_timeout_ms: 400,
            paste_ack_timeout_ms: 300,
            transcription_cache_capacity: 500,
            transcription_cache_ttl_secs: 3_600,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `config.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use juno_dictation::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dictation: DictationConfig,
    pub audio: AudioConfig,
    pub runtime: RuntimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dictation: DictationConfig::default(),
            audio: AudioConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `config.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.dictation.validate()?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `config.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `config.toml` file exists yet — first-run
    /// detection used during startup.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
