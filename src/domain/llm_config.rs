use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    #[serde(alias = "google", alias = "gemini")]
    Google,
    #[serde(alias = "openai")]
    OpenAI,
    #[serde(alias = "ollama", alias = "local")]
    Ollama,
}

/// Everything a model client needs. Fixed when the client is built.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    /// Empty selects the provider's default endpoint.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// `None` leaves the request unbounded.
    pub timeout_secs: Option<u64>,
    pub max_retries: u32,
}

impl LLMConfig {
    pub fn default_base_url(provider: LLMProvider) -> &'static str {
        match provider {
            LLMProvider::Google => "https://generativelanguage.googleapis.com/v1beta/models",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Ollama => "http://localhost:11434",
        }
    }

    pub fn resolved_base_url(&self) -> &str {
        match self.base_url.trim() {
            "" => Self::default_base_url(self.provider),
            base_url => base_url,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Google,
            base_url: String::new(),
            model: "gemini-1.5-pro".to_string(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.7),
            timeout_secs: None,
            max_retries: 2,
        }
    }
}
