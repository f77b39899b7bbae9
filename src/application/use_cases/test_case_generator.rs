use crate::application::use_cases::prompt_builder::{
    build_gherkin_markdown_prompt, build_test_case_prompt,
};
use crate::domain::error::{AppError, Result};
use crate::domain::story::StoryInput;
use crate::domain::test_case::GeneratedTestCases;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use crate::infrastructure::storage::{ensure_dir, write_numbered_output};
use crate::shared::token_counter::TokenCounter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Single-call generation of the full test case document for one story.
pub struct TestCaseGenerationUseCase {
    llm_client: Arc<dyn LLMClient>,
}

impl TestCaseGenerationUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient>) -> Self {
        Self { llm_client }
    }

    pub async fn execute(&self, story: &StoryInput) -> Result<GeneratedTestCases> {
        let prompt = build_test_case_prompt(story);
        self.complete(story, &prompt).await
    }

    /// Same as [`execute`](Self::execute), then writes a numbered run log to `dir`.
    pub async fn execute_to_file(
        &self,
        story: &StoryInput,
        dir: &Path,
    ) -> Result<(GeneratedTestCases, PathBuf)> {
        let prompt = build_test_case_prompt(story);
        let generated = self.complete(story, &prompt).await?;
        let path = save_run_log(dir, &prompt, &generated)?;
        Ok((generated, path))
    }

    /// Whole-story Gherkin scenarios as markdown.
    pub async fn execute_gherkin_markdown(&self, story: &StoryInput) -> Result<GeneratedTestCases> {
        let prompt = build_gherkin_markdown_prompt(&story.user_story);
        self.complete(story, &prompt).await
    }

    async fn complete(&self, story: &StoryInput, prompt: &str) -> Result<GeneratedTestCases> {
        info!(jira_id = %story.jira_id, model = self.llm_client.model(), "Generating test cases");

        let raw_result = self.llm_client.generate(prompt).await?;
        let content = clean_llm_response(&raw_result);
        let token_count = TokenCounter::estimate_tokens(&content);

        info!(jira_id = %story.jira_id, token_count, "Test cases generated");

        Ok(GeneratedTestCases {
            jira_id: story.jira_id.clone(),
            content,
            token_count,
        })
    }
}

fn run_log(prompt: &str, generated: &GeneratedTestCases) -> String {
    let rule = "-".repeat(75);
    format!(
        "Generated at: {}\n\nUser Prompt:\n{}\n{}\n LLM output\n{}\n\n{}\n\nTokens Outputed: {}\n\nEnd of Iteration\n{}\n",
        chrono::Local::now().to_rfc3339(),
        prompt.trim(),
        rule,
        rule,
        generated.content,
        generated.token_count,
        rule,
    )
}

/// Writes `{dir}/{jira_id}_output{N}.md` with the next free `N`.
pub fn save_run_log(dir: &Path, prompt: &str, generated: &GeneratedTestCases) -> Result<PathBuf> {
    ensure_dir(dir)
        .map_err(|e| AppError::IoError(format!("Failed to create {}: {}", dir.display(), e)))?;
    let path = write_numbered_output(dir, &generated.jira_id, &run_log(prompt, generated))
        .map_err(|e| {
            AppError::IoError(format!("Failed to write run log in {}: {}", dir.display(), e))
        })?;
    info!(path = %path.display(), "Saved run log");
    Ok(path)
}
