pub mod gemini;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub(crate) mod testing;

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use gemini::GeminiClient;
use ollama::OllamaClient;
use openai::OpenAIClient;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const ERROR_BODY_PREVIEW: usize = 400;

/// A generation backend bound to one provider/model configuration.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}

/// Builds the configured provider client wrapped with the configured retry count.
pub fn build_llm_client(config: &LLMConfig) -> Result<Arc<dyn LLMClient>> {
    let inner: Arc<dyn LLMClient> = match config.provider {
        LLMProvider::Google => Arc::new(GeminiClient::new(config.clone())?),
        LLMProvider::OpenAI => Arc::new(OpenAIClient::new(config.clone())?),
        LLMProvider::Ollama => Arc::new(OllamaClient::new(config.clone())?),
    };

    Ok(Arc::new(RetryingClient::new(inner, config.max_retries)))
}

pub(crate) fn build_http_client(config: &LLMConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn map_send_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("Request timed out: {}", err))
    } else if err.is_connect() || err.is_request() {
        AppError::Unavailable(format!("Request failed: {}", err))
    } else {
        AppError::LLMError(format!("Request failed: {}", err))
    }
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> AppError {
    let body: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    let message = format!("API error ({}): {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::AuthError(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AppError::Timeout(message),
        status if status.is_server_error() => AppError::Unavailable(message),
        _ => AppError::LLMError(message),
    }
}

pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(classify_status(status, &text))
}

/// Re-sends a prompt when the failure is transient, up to `max_retries` extra attempts.
pub struct RetryingClient {
    inner: Arc<dyn LLMClient>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LLMClient>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: RETRY_BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[async_trait]
impl LLMClient for RetryingClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        error = %err,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying model call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    debug!(error = %err, attempts = attempt + 1, "Model call failed");
                    return Err(err);
                }
            }
        }
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedClient;
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key"),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::GATEWAY_TIMEOUT, ""),
            AppError::Timeout(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            AppError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "invalid model"),
            AppError::LLMError(msg) if msg.contains("invalid model")
        ));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://host/v1/", "/models"), "http://host/v1/models");
        assert_eq!(
            join_url("http://host/v1", "chat/completions"),
            "http://host/v1/chat/completions"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let inner = Arc::new(ScriptedClient::new(vec![
            Err(AppError::RateLimited("429".into())),
            Err(AppError::Unavailable("503".into())),
            Ok("generated".to_string()),
        ]));
        let client = RetryingClient::new(inner.clone(), 2);

        let output = client.generate("prompt").await.unwrap();
        assert_eq!(output, "generated");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(ScriptedClient::new(vec![
            Err(AppError::Timeout("1".into())),
            Err(AppError::Timeout("2".into())),
            Err(AppError::Timeout("3".into())),
            Ok("too late".to_string()),
        ]));
        let client = RetryingClient::new(inner.clone(), 2);

        let err = client.generate("prompt").await.unwrap_err();
        assert_eq!(err, AppError::Timeout("3".into()));
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_errors_are_not_retried() {
        let inner = Arc::new(ScriptedClient::new(vec![
            Err(AppError::AuthError("401".into())),
            Ok("unreachable".to_string()),
        ]));
        let client = RetryingClient::new(inner.clone(), 5);

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let inner = Arc::new(ScriptedClient::new(vec![
            Err(AppError::RateLimited("1".into())),
            Err(AppError::RateLimited("2".into())),
            Ok("done".to_string()),
        ]));
        let client = RetryingClient::new(inner, 2).with_base_delay(Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        client.generate("prompt").await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }
}
