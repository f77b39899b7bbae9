use super::{build_http_client, ensure_success, join_url, map_send_error, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::json;

/// Any server speaking the OpenAI chat completions protocol.
pub struct OpenAIClient {
    client: reqwest::Client,
    config: LLMConfig,
}

impl OpenAIClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }
}

fn message_content(json: &serde_json::Value) -> Result<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = join_url(self.config.resolved_base_url(), "chat/completions");

        let mut request = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(api_key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(map_send_error)?;

        let json: serde_json::Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        message_content(&json)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;

    #[test]
    fn test_request_body_carries_fixed_settings() {
        let client = OpenAIClient::new(LLMConfig {
            provider: LLMProvider::OpenAI,
            base_url: LLMConfig::default_base_url(LLMProvider::OpenAI).to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(2048),
            ..LLMConfig::default()
        })
        .unwrap();

        let body = client.request_body("Generate");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "Generate");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_message_content() {
        let json = json!({"choices": [{"message": {"content": "Scenario: X"}}]});
        assert_eq!(message_content(&json).unwrap(), "Scenario: X");

        let missing = json!({"choices": []});
        assert!(matches!(
            message_content(&missing),
            Err(AppError::LLMError(_))
        ));
    }
}
