use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CHAT_MODEL, DEFAULT_MAX_HISTORY_TURNS, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OPENAI_KEY_ENV, DEFAULT_RETAINED_TURNS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL,
    HTTP_REQUEST_TIMEOUT_SECS,
};
use crate::utils::WaiterError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// OpenAI-compatible provider configuration
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Conversation history limits
    #[serde(default)]
    pub history: HistoryConfig,

    /// Behavior when no model credential is available
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

/// OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Environment variable containing API key
    pub api_key_env: String,
    /// API root, without a trailing `/chat/completions`
    pub base_url: String,
    /// Model used for chat completions
    pub chat_model: String,
    /// Model used for audio transcription
    pub transcription_model: String,
    /// Upper bound on a single provider round trip
    pub request_timeout_secs: u64,
    /// Temperature for generation
    pub temperature: Option<f32>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_OPENAI_KEY_ENV.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            request_timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }
}

impl OpenAIConfig {
    /// Read the API key from the configured environment variable
    ///
    /// Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of turns kept per session, system preamble included
    pub max_turns: usize,
    /// Number of most recent turns kept after the system preamble on compaction
    pub retained_turns: usize,
    /// Drop sessions idle for longer than this; `None` keeps them for the process lifetime
    pub idle_ttl_secs: Option<u64>,
    /// How often the idle sweeper runs
    pub sweep_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_HISTORY_TURNS,
            retained_turns: DEFAULT_RETAINED_TURNS,
            idle_ttl_secs: None,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

/// What the chat endpoint does when no model credential is configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingModelPolicy {
    /// Fail with `NotConfigured` before touching any history
    #[default]
    FailFast,
    /// Reply with the user's text behind a fixed marker
    Echo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub policy: MissingModelPolicy,
}

impl Config {
    /// Reject limit combinations the history store cannot honor
    pub fn validate(&self) -> Result<(), WaiterError> {
        let history = &self.history;
        if history.max_turns < 3 {
            return Err(WaiterError::ConfigError(format!(
                "history.max_turns must be at least 3, got {}",
                history.max_turns
            )));
        }
        // Compaction keeps the preamble plus `retained_turns`, then the new turn lands
        if history.retained_turns == 0 || history.retained_turns > history.max_turns - 2 {
            return Err(WaiterError::ConfigError(format!(
                "history.retained_turns must be between 1 and {} (max_turns - 2), got {}",
                history.max_turns - 2,
                history.retained_turns
            )));
        }
        if self.openai.request_timeout_secs == 0 {
            return Err(WaiterError::ConfigError(
                "openai.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".waiterbot/config.toml");

    // Build figment configuration
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Environment variables (WAITERBOT_ prefix, `__` for nesting)
    figment = figment.merge(Env::prefixed("WAITERBOT_").split("__"));

    let config: Config = figment.extract().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a single TOML file on top of the defaults
pub fn load_config_from(path: &Path) -> Result<Config> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Configuration for this run: the file passed on the command line, else the layered sources
///
/// A config that fails validation is an error either way.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "waiterbot") {
        Ok(proj_dirs.config_dir().to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".config").join("waiterbot"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
///
/// Returns the path of the config file.
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
    }

    Ok(config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_observed_limits() {
        let config = Config::default();
        assert_eq!(config.history.max_turns, 20);
        assert_eq!(config.history.retained_turns, 18);
        assert_eq!(config.openai.chat_model, "gpt-4o");
        assert_eq!(config.openai.transcription_model, "whisper-1");
        assert_eq!(config.fallback.policy, MissingModelPolicy::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9100

[history]
max_turns = 10
retained_turns = 8

[fallback]
policy = "echo"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, DEFAULT_SERVER_HOST);
        assert_eq!(config.history.max_turns, 10);
        assert_eq!(config.history.retained_turns, 8);
        assert_eq!(config.fallback.policy, MissingModelPolicy::Echo);
        assert_eq!(config.openai.chat_model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_validate_rejects_retained_without_room_for_new_turn() {
        let mut config = Config::default();
        config.history.retained_turns = config.history.max_turns - 1;
        assert!(matches!(
            config.validate(),
            Err(WaiterError::ConfigError(_))
        ));

        config.history.max_turns = 2;
        config.history.retained_turns = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_config_round_trips_through_loader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.history.idle_ttl_secs = Some(900);
        save_config(&config, Some(path.clone())).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.history.idle_ttl_secs, Some(900));
    }

    #[test]
    fn test_resolve_config_rejects_invalid_limits() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[history]\nmax_turns = 2\nretained_turns = 1\n").unwrap();
        assert!(resolve_config(Some(&path)).is_err());

        std::env::set_var("WAITERBOT_HISTORY__MAX_TURNS", "2");
        let layered = resolve_config(None);
        std::env::remove_var("WAITERBOT_HISTORY__MAX_TURNS");
        let err = layered.unwrap_err();
        assert!(format!("{err:#}").contains("max_turns"));
    }

    #[test]
    fn test_api_key_treats_blank_as_missing() {
        let mut openai = OpenAIConfig::default();
        openai.api_key_env = "WAITERBOT_TEST_BLANK_KEY".to_string();
        std::env::set_var("WAITERBOT_TEST_BLANK_KEY", "   ");
        assert!(openai.api_key().is_none());

        openai.api_key_env = "WAITERBOT_TEST_UNSET_KEY".to_string();
        assert!(openai.api_key().is_none());
    }
}
