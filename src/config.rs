use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::LLMConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub llm: LLMConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/recettes_africaines.csv"),
            llm: LLMConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let data_path = lookup("RECIPES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let llm = LLMConfig {
            base_url: lookup("OLLAMA_URL").unwrap_or(defaults.llm.base_url),
            model: lookup("OLLAMA_MODEL").unwrap_or(defaults.llm.model),
            timeout: parse(&lookup, "LLM_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm.timeout),
            max_tokens: parse(&lookup, "LLM_MAX_TOKENS")?.unwrap_or(defaults.llm.max_tokens),
            temperature: parse(&lookup, "LLM_TEMPERATURE")?.unwrap_or(defaults.llm.temperature),
            top_p: parse(&lookup, "LLM_TOP_P")?.unwrap_or(defaults.llm.top_p),
            repeat_penalty: parse(&lookup, "LLM_REPEAT_PENALTY")?
                .unwrap_or(defaults.llm.repeat_penalty),
        };

        Ok(Settings { data_path, llm })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Rejected("model name must not be empty".to_string()));
        }
        if self.llm.timeout.is_zero() {
            return Err(ConfigError::Rejected("LLM timeout must be positive".to_string()));
        }
        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://")) {
            return Err(ConfigError::Rejected(format!(
                "Ollama URL must be http(s), got {:?}",
                self.llm.base_url
            )));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
