//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Missing sections or keys fall back to their defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Transport-level timeout of the HTTP client, in seconds.
    pub timeout_secs: u64,
    /// Upper bound on generated tokens per request.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.4,
            timeout_secs: 30,
            max_tokens: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// CurriculumConfig
// ---------------------------------------------------------------------------

/// Settings for the remote curriculum service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumConfig {
    /// When `false` the local fallback curriculum is always used.
    pub enabled: bool,
    /// Base URL exposing `GET /health` and `POST /generate-curriculum`.
    pub base_url: String,
    /// Budget for the liveness probe, in seconds.
    pub health_timeout_secs: u64,
    /// Budget for the generation request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:8000".into(),
            health_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackConfig
// ---------------------------------------------------------------------------

/// Settings for feedback generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Overall budget for one feedback request, in seconds.
    pub timeout_secs: u64,
    /// Number of recent turns included as conversation context.
    pub history_window: usize,
    /// Language used for explanations.
    pub native_language: String,
    /// Request feedback for the latest user turn when the assistant replies
    /// and that turn has none yet.
    pub feedback_on_assistant_turn: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            history_window: 4,
            native_language: "English".into(),
            feedback_on_assistant_turn: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// What the learner is practising.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub target_language: String,
    pub scenario: String,
    /// Persona system prompt; a generic tutor persona is used when `None`.
    pub persona_prompt: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_language: "French".into(),
            scenario: "Cafe".into(),
            persona_prompt: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use lingua_feedback::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub curriculum: CurriculumConfig,
    pub feedback: FeedbackConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.llm.base_url, loaded.llm.base_url);
        assert_eq!(original.llm.api_key, loaded.llm.api_key);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.max_tokens, loaded.llm.max_tokens);
        assert_eq!(original.curriculum.base_url, loaded.curriculum.base_url);
        assert_eq!(
            original.curriculum.health_timeout_secs,
            loaded.curriculum.health_timeout_secs
        );
        assert_eq!(original.feedback.timeout_secs, loaded.feedback.timeout_secs);
        assert_eq!(original.session.target_language, loaded.session.target_language);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.session.scenario, "Cafe");
        assert_eq!(config.feedback.history_window, 4);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.curriculum.base_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.curriculum.health_timeout_secs, 5);
        assert_eq!(cfg.curriculum.request_timeout_secs, 10);
        assert_eq!(cfg.feedback.timeout_secs, 12);
        assert_eq!(cfg.feedback.native_language, "English");
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.session.target_language, "French");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[session]\ntarget_language = \"Spanish\"\n\n[feedback]\ntimeout_secs = 3\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.session.target_language, "Spanish");
        assert_eq!(cfg.session.scenario, "Cafe");
        assert_eq!(cfg.feedback.timeout_secs, 3);
        assert_eq!(cfg.feedback.history_window, 4);
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.llm.base_url = "https://api.openai.com".into();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.curriculum.enabled = false;
        cfg.session.persona_prompt = Some("You are Amélie, a Parisian barista.".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.llm.base_url, "https://api.openai.com");
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert!(!loaded.curriculum.enabled);
        assert_eq!(
            loaded.session.persona_prompt.as_deref(),
            Some("You are Amélie, a Parisian barista.")
        );
    }
}
