//! Service configuration
//!
//! Layered with the `config` crate: an optional YAML file, then `POCLASS__*`
//! environment variables (`POCLASS__LLM__MODEL` sets `llm.model`), then CLI
//! flags applied by the caller.

use poclass_classifiers::{CascadeConfig, LlmConfig, Rule, SupplierHint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Taxonomy document; required
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,

    /// Result cache document
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Classification records log
    #[serde(default = "default_records_path")]
    pub records_path: PathBuf,

    /// Statistical model artifact; the stage is disabled when absent
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default)]
    pub cascade: CascadeSection,

    #[serde(default)]
    pub llm: LlmSection,

    /// Replaces the built-in keyword rules
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,

    /// Replaces the built-in supplier hints, in priority order
    #[serde(default)]
    pub suppliers: Option<Vec<SupplierHint>>,
}

impl AppConfig {
    /// Load from an optional file plus the environment
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("POCLASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            taxonomy_path: default_taxonomy_path(),
            cache_path: default_cache_path(),
            records_path: default_records_path(),
            model_path: default_model_path(),
            cascade: CascadeSection::default(),
            llm: LlmSection::default(),
            rules: None,
            suppliers: None,
        }
    }
}

/// Acceptance thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeSection {
    #[serde(default = "default_rule_threshold")]
    pub rule_acceptance_threshold: f64,

    #[serde(default = "default_min_model_confidence")]
    pub min_model_confidence: f64,
}

impl Default for CascadeSection {
    fn default() -> Self {
        Self {
            rule_acceptance_threshold: default_rule_threshold(),
            min_model_confidence: default_min_model_confidence(),
        }
    }
}

impl From<&CascadeSection> for CascadeConfig {
    fn from(section: &CascadeSection) -> Self {
        CascadeConfig {
            rule_acceptance_threshold: section.rule_acceptance_threshold,
            min_model_confidence: section.min_model_confidence,
        }
    }
}

/// Language model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Disable to run the cascade without a language model stage
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Bound on each attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl LlmSection {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> LlmConfig {
        LlmConfig {
            max_attempts: self.max_attempts.max(1),
            timeout: self.timeout(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("config/taxonomy.yaml")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/po_cache.json")
}

fn default_records_path() -> PathBuf {
    PathBuf::from("data/po_records.jsonl")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/po_model.json")
}

fn default_rule_threshold() -> f64 {
    0.9
}

fn default_min_model_confidence() -> f64 {
    0.55
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.cascade.rule_acceptance_threshold, 0.9);
        assert_eq!(config.cascade.min_model_confidence, 0.55);
        assert_eq!(config.llm.max_attempts, 2);
        assert!(config.rules.is_none());
    }

    #[test]
    fn test_yaml_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poclass.yaml");
        std::fs::write(
            &path,
            r#"
port: 9090
taxonomy_path: /etc/poclass/taxonomy.yaml
llm:
  model: llama-3.1-8b-instant
  timeout_secs: 5
suppliers:
  - fragment: zoom
    result: { l1: IT, l2: Software, l3: Subscription }
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.taxonomy_path, PathBuf::from("/etc/poclass/taxonomy.yaml"));
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.timeout(), Duration::from_secs(5));
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.suppliers.unwrap()[0].fragment, "zoom");
    }

    #[test]
    fn test_retry_config_needs_one_attempt() {
        let section = LlmSection {
            max_attempts: 0,
            ..LlmSection::default()
        };
        assert_eq!(section.retry_config().max_attempts, 1);
    }

    #[test]
    fn test_sampling_temperature_is_not_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poclass.yaml");
        std::fs::write(&path, "llm:\n  max_attempts: 3\n  temperature: 0.7\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.llm.retry_config().max_attempts, 3);
        let rendered = serde_json::to_string(&config.llm).unwrap();
        assert!(!rendered.contains("temperature"));
    }
}
