use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GenerationError;

/// Produces the final answer text from an assembled prompt.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LLMConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3:latest".to_string(),
            timeout: Duration::from_secs(120),
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: usize,
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama server. One instance is created at start-up
/// and reused for every question.
pub struct OllamaGenerator {
    client: Client,
    config: LLMConfig,
}

impl OllamaGenerator {
    pub fn new(mut config: LLMConfig) -> Result<Self, GenerationError> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenerationError::Setup)?;

        Ok(OllamaGenerator { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Whether the server is reachable and has the configured model pulled.
    pub fn check_model(&self) -> Result<bool, GenerationError> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.transport_error(&url, e))?;

        let tags: TagsResponse = self.read_json(&url, response)?;
        Ok(tags.models.iter().any(|m| m.name == self.config.model))
    }

    fn transport_error(&self, url: &str, source: reqwest::Error) -> GenerationError {
        if source.is_timeout() {
            GenerationError::Timeout(self.config.timeout)
        } else {
            GenerationError::Unreachable {
                url: url.to_string(),
                source,
            }
        }
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<T, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("{} answered HTTP {}", url, status);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // the client timeout also covers reading the body
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.config.timeout)
            } else {
                GenerationError::Malformed(e.to_string())
            }
        })?;
        serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.config.max_tokens,
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                repeat_penalty: self.config.repeat_penalty,
            },
        };

        debug!(
            "Sending {} char prompt to {} ({})",
            prompt.chars().count(),
            url,
            self.config.model
        );
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(&url, e))?;

        let payload: GenerateResponse = self.read_json(&url, response)?;
        Ok(payload.response)
    }
}
