//! Configuration management for the ATS scoring engine

use crate::error::{AtsError, Result};
use crate::processing::analyzer::EngineOptions;
use crate::processing::cache::{CacheSettings, EvictionPolicy};
use crate::processing::scoring::{PolicyPreset, ScoringPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub dictionary: DictionaryConfig,
    pub feedback: FeedbackConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// HuggingFace repo id, or the name of a directory under `models_dir`.
    pub model: String,
    pub models_dir: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
    pub eviction: EvictionPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub policy: PolicyPreset,
    /// A fully specified policy that replaces the preset when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<ScoringPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Skill dictionary JSON; the built-in one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub enabled: bool,
    pub api_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ats")
            .join("models");

        Self {
            model: "minishlab/potion-base-8M".to_string(),
            models_dir,
            timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let defaults = CacheSettings::default();
        Self {
            capacity: defaults.capacity,
            ttl_secs: defaults.ttl.as_secs(),
            eviction: defaults.eviction,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 8,
            temperature: 0.7,
            max_tokens: 650,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl FeedbackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Loads the user config, writing the defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::read(&config_path)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads from an explicit path without writing anything.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AtsError::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ats")
            .join("config.toml")
    }

    /// `OPENAI_BASE_URL` and `OPENAI_MODEL` win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.feedback.api_base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.feedback.model = Some(model);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(AtsError::Configuration("cache.capacity must be at least 1".to_string()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AtsError::Configuration("cache.ttl_secs must be at least 1".to_string()));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(AtsError::Configuration(
                "embedding.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(AtsError::Configuration("embedding.model cannot be empty".to_string()));
        }
        if self.feedback.timeout_secs == 0 {
            return Err(AtsError::Configuration(
                "feedback.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.feedback.temperature) {
            return Err(AtsError::Configuration(
                "feedback.temperature must be within 0.0..=2.0".to_string(),
            ));
        }
        self.scoring_policy().validate()
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        match &self.scoring.custom {
            Some(custom) => custom.clone(),
            None => self.scoring.policy.policy(),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            capacity: self.cache.capacity,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            eviction: self.cache.eviction,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            cache: self.cache_settings(),
            embed_timeout: Duration::from_secs(self.embedding.timeout_secs),
            policy: self.scoring_policy(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.embedding.models_dir
    }
}
