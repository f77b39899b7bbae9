use super::LLMClient;
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Replays a fixed list of outcomes, then the fallback (if any).
pub(crate) struct ScriptedClient {
    outcomes: Mutex<Vec<Result<String>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn new(mut outcomes: Vec<Result<String>>) -> Self {
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn repeating(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.prompts.lock().unwrap().len() as u32
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.outcomes.lock().unwrap().pop() {
            Some(outcome) => outcome,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AppError::Internal("script exhausted".into())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
