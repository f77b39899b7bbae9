use super::{build_http_client, ensure_success, join_url, map_send_error, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
    error: Option<String>,
}

/// Local Ollama server, non-streaming `/api/generate`.
pub struct OllamaClient {
    client: reqwest::Client,
    config: LLMConfig,
}

impl OllamaClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }
}

fn response_text(body: OllamaResponse) -> Result<String> {
    if let Some(error) = body.error {
        return Err(AppError::LLMError(error));
    }
    body.response
        .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = join_url(self.config.resolved_base_url(), "api/generate");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(map_send_error)?;

        let body: OllamaResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        response_text(body)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
