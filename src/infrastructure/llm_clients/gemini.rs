use super::{build_http_client, ensure_success, map_send_error, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: LLMConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::AuthError("Missing API key for Google provider".to_string()))?;

        Ok(Self {
            client: build_http_client(&config)?,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.resolved_base_url().trim_end_matches('/'),
            self.config.model.trim()
        )
    }

    fn request_body(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
                role: Some("user".to_string()),
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature.map(f64::from),
                max_output_tokens: self.config.max_tokens,
            }),
        }
    }
}

fn first_candidate_text(response: GeminiResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))?;

    if text.trim().is_empty() {
        return Err(AppError::LLMError("Model returned an empty response".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(map_send_error)?;

        let json: GeminiResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        first_candidate_text(json)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;

    fn config() -> LLMConfig {
        LLMConfig {
            provider: LLMProvider::Google,
            api_key: Some("secret".to_string()),
            max_tokens: Some(4096),
            temperature: Some(0.3),
            ..LLMConfig::default()
        }
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = LLMConfig {
            api_key: None,
            ..config()
        };
        assert!(matches!(
            GeminiClient::new(config),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_endpoint_and_body() {
        let client = GeminiClient::new(config()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );

        let body = serde_json::to_value(client.request_body("hello")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert!(body["generationConfig"]["temperature"].as_f64().is_some());
    }

    #[test]
    fn test_first_candidate_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Scenario: A\n"},{"text":"Given b"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).unwrap(), "Scenario: A\nGiven b");
    }

    #[test]
    fn test_no_candidates_is_llm_error() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            first_candidate_text(response),
            Err(AppError::LLMError(_))
        ));
    }
}
