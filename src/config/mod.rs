//! Configuration management
//!
//! Sources, lowest priority first: built-in defaults, `config/default.toml`,
//! the file named by `MESA_CONFIG`, `MESA__*` environment variables, and
//! finally the conventional `DATABASE_URL` and `GEMINI_API_KEY` variables.

use crate::domain::conversation::Capabilities;
use crate::domain::language::Language;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub dialogue: DialogueConfig,
    pub llm: LlmConfig,
    pub telephony: TelephonyConfig,
    pub lexicon: LexiconConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Empty keeps reservations in memory
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub capabilities: Capabilities,
    pub persist_timeout_secs: u64,
    /// Delay before a finished call's session is dropped
    pub session_cleanup_secs: u64,
    /// Sessions untouched for this long are dropped by the sweeper
    pub session_idle_ttl_secs: u64,
    pub session_sweep_secs: u64,
}

impl DialogueConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_secs(self.persist_timeout_secs)
    }

    pub fn session_cleanup(&self) -> Duration {
        Duration::from_secs(self.session_cleanup_secs)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            persist_timeout_secs: 5,
            session_cleanup_secs: 60,
            session_idle_ttl_secs: 900,
            session_sweep_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Key present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            timeout_ms: 4000,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub action_path: String,
    pub speech_timeout: String,
    pub gather_timeout_secs: u32,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            action_path: "/voice".to_string(),
            speech_timeout: "auto".to_string(),
            gather_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Directory of `<lang>.toml` overrides; embedded packs otherwise
    pub dir: Option<PathBuf>,
    pub default_language: Language,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            dir: None,
            default_language: Language::Es,
        }
    }
}

impl Config {
    /// Load configuration from files and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("MESA_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix("MESA").separator("__").try_parsing(true))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(key) = var("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
