//! Environment-driven configuration.
//!
//! Binaries call `dotenv::dotenv()` first, so a local `.env` file works the
//! same as exported variables.

use crate::error::{AnalyticsError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATASET_PATH: &str = "RCM_Analytics_10k_Sample_Data.xlsx";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AnalyticsError::Config("GROQ_API_KEY (or LLM_API_KEY) is not set".to_string())
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    pub bind_addr: String,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmConfig {
            api_key: var("GROQ_API_KEY").or_else(|| var("LLM_API_KEY")),
            model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: var("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_var(
                "LLM_TIMEOUT_SECS",
                var("LLM_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_retries: parse_var("LLM_MAX_RETRIES", var("LLM_MAX_RETRIES"), DEFAULT_MAX_RETRIES)?,
        };

        Ok(Self {
            dataset_path: var("RCM_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH)),
            bind_addr: var("RCM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            llm,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AnalyticsError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.llm.max_retries, 2);
        assert!(config.llm.api_key.is_none());
        assert!(matches!(
            config.llm.require_api_key(),
            Err(AnalyticsError::Config(_))
        ));
    }

    #[test]
    fn test_overrides_and_key_fallback() {
        let config = config_from(&[
            ("RCM_DATASET_PATH", "/data/rcm.xlsx"),
            ("LLM_API_KEY", "secret"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("LLM_TIMEOUT_SECS", "5"),
            ("LLM_MAX_RETRIES", "0"),
        ])
        .unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("/data/rcm.xlsx"));
        assert_eq!(config.llm.require_api_key().unwrap(), "secret");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout, Duration::from_secs(5));
        assert_eq!(config.llm.max_retries, 0);
    }

    #[test]
    fn test_groq_key_preferred_and_blank_ignored() {
        let config = config_from(&[("GROQ_API_KEY", "groq"), ("LLM_API_KEY", "other")]).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("groq"));

        let config = config_from(&[("GROQ_API_KEY", "  "), ("LLM_API_KEY", "other")]).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("other"));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = config_from(&[("LLM_MAX_RETRIES", "three")]).unwrap_err();
        match err {
            AnalyticsError::Config(msg) => assert!(msg.contains("LLM_MAX_RETRIES")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
