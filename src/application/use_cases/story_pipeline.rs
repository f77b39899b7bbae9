//! Tracker story to exported scenarios: look the story up, ask the model for
//! testable requirements, turn each requirement into one Gherkin scenario and
//! write `.feature` and `.json` exports.

use crate::application::use_cases::exporter::{to_gherkin, to_json};
use crate::application::use_cases::gherkin_parser::parse_scenario;
use crate::application::use_cases::prompt_builder::{
    build_gherkin_prompt, build_requirements_prompt,
};
use crate::domain::error::{AppError, Result};
use crate::domain::story::Story;
use crate::domain::test_case::TestCaseRecord;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use crate::infrastructure::storage::{ensure_dir, sanitize_identifier};
use crate::infrastructure::tracker::StoryTracker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct StoryExport {
    pub story_key: String,
    pub test_cases: Vec<TestCaseRecord>,
    pub gherkin: String,
    pub json: String,
    pub feature_path: PathBuf,
    pub json_path: PathBuf,
}

pub struct StoryPipelineUseCase {
    tracker: Arc<dyn StoryTracker>,
    llm_client: Arc<dyn LLMClient>,
}

impl StoryPipelineUseCase {
    pub fn new(tracker: Arc<dyn StoryTracker>, llm_client: Arc<dyn LLMClient>) -> Self {
        Self {
            tracker,
            llm_client,
        }
    }

    /// One requirement per non-blank line of the model's answer. A model
    /// failure is logged and gives no requirements.
    pub async fn extract_requirements(&self, story: &Story) -> Vec<String> {
        let prompt = build_requirements_prompt(story);
        match self.llm_client.generate(&prompt).await {
            Ok(raw) => {
                let requirements: Vec<String> = clean_llm_response(&raw)
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                info!(key = %story.key, count = requirements.len(), "Extracted requirements");
                requirements
            }
            Err(err) => {
                error!(error = %err, key = %story.key, "Failed to extract requirements");
                Vec::new()
            }
        }
    }

    /// One scenario per requirement, in requirement order. Requirements whose
    /// generation fails or yields no scenario are skipped.
    pub async fn generate_test_cases(&self, requirements: &[String]) -> Vec<TestCaseRecord> {
        let mut test_cases = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let prompt = build_gherkin_prompt(requirement);
            match self.llm_client.generate(&prompt).await {
                Ok(raw) => match parse_scenario(&clean_llm_response(&raw)) {
                    Some(test_case) => {
                        info!(title = %test_case.title, "Generated test case");
                        test_cases.push(test_case);
                    }
                    None => warn!(requirement = %requirement, "No scenario in model output"),
                },
                Err(err) => {
                    error!(error = %err, requirement = %requirement, "Failed to generate test case");
                }
            }
        }
        test_cases
    }

    pub async fn execute(&self, story_key: &str, out_dir: &Path) -> Result<StoryExport> {
        let story = self.tracker.get_story(story_key).await.ok_or_else(|| {
            error!(key = story_key, "Failed to retrieve story");
            AppError::NotFound(format!("Story {} not found", story_key))
        })?;

        let requirements = self.extract_requirements(&story).await;
        if requirements.is_empty() {
            error!(key = %story.key, "No requirements extracted from story");
            return Err(AppError::ValidationError(format!(
                "No requirements extracted from story {}",
                story.key
            )));
        }

        let test_cases = self.generate_test_cases(&requirements).await;
        if test_cases.is_empty() {
            error!(key = %story.key, "No test cases generated");
            return Err(AppError::ValidationError(format!(
                "No test cases generated for story {}",
                story.key
            )));
        }

        ensure_dir(out_dir).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", out_dir.display(), e))
        })?;
        let stem = sanitize_identifier(&story.key);
        let feature_path = out_dir.join(format!("{}_test_cases.feature", stem));
        let json_path = out_dir.join(format!("{}_test_cases.json", stem));

        let gherkin = to_gherkin(&test_cases, Some(&feature_path));
        let json = to_json(&test_cases, Some(&json_path));

        Ok(StoryExport {
            story_key: story.key,
            test_cases,
            gherkin,
            json,
            feature_path,
            json_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm_clients::testing::ScriptedClient;
    use async_trait::async_trait;

    struct FakeTracker {
        story: Option<Story>,
    }

    #[async_trait]
    impl StoryTracker for FakeTracker {
        async fn get_story(&self, key: &str) -> Option<Story> {
            self.story.clone().filter(|story| story.key == key)
        }
    }

    fn tracker() -> Arc<FakeTracker> {
        Arc::new(FakeTracker {
            story: Some(Story {
                key: "RD-294".to_string(),
                summary: "Manage assessments".to_string(),
                description: "As an admin\r\nI manage assessments".to_string(),
                acceptance_criteria: "Assessments can be archived".to_string(),
            }),
        })
    }

    #[tokio::test]
    async fn test_full_pipeline_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("1. Admin can create an assessment\n\n2. Admin can archive an assessment\n".to_string()),
            Ok("Scenario: Create assessment\nGiven an admin\nWhen they create one\nThen it is listed".to_string()),
            Ok("Scenario: Archive assessment\nGiven an assessment\nWhen archived\nThen it is hidden".to_string()),
        ]));
        let pipeline = StoryPipelineUseCase::new(tracker(), client.clone());

        let export = pipeline.execute("RD-294", dir.path()).await.unwrap();

        assert_eq!(client.calls(), 3);
        assert!(client.prompts()[0].contains("Description: As an admin\nI manage assessments"));
        assert!(client.prompts()[2].contains("2. Admin can archive an assessment"));
        assert_eq!(export.test_cases.len(), 2);
        assert_eq!(export.test_cases[1].title, "Archive assessment");
        assert_eq!(export.feature_path, dir.path().join("RD-294_test_cases.feature"));
        assert_eq!(std::fs::read_to_string(&export.feature_path).unwrap(), export.gherkin);
        assert_eq!(std::fs::read_to_string(&export.json_path).unwrap(), export.json);
    }

    #[tokio::test]
    async fn test_failed_and_unparseable_requirements_skipped() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(AppError::Unavailable("503".into())),
            Ok("I could not produce a scenario.".to_string()),
            Ok("Scenario: Third\nGiven x".to_string()),
        ]));
        let pipeline = StoryPipelineUseCase::new(tracker(), client);
        let requirements: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let test_cases = pipeline.generate_test_cases(&requirements).await;
        assert_eq!(test_cases.len(), 1);
        assert_eq!(test_cases[0].title, "Third");
    }

    #[tokio::test]
    async fn test_missing_story_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::repeating("unused"));
        let pipeline = StoryPipelineUseCase::new(tracker(), client.clone());

        let err = pipeline.execute("RD-999", dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_requirement_failure_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![Err(AppError::Timeout(
            "slow".into(),
        ))]));
        let pipeline = StoryPipelineUseCase::new(tracker(), client);

        let err = pipeline.execute("RD-294", dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(!dir.path().join("RD-294_test_cases.feature").exists());
    }

    #[tokio::test]
    async fn test_no_test_cases_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("Only requirement".to_string()),
            Ok("no gherkin here".to_string()),
        ]));
        let pipeline = StoryPipelineUseCase::new(tracker(), client);

        let err = pipeline.execute("RD-294", dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("No test cases")));
    }

    #[tokio::test]
    async fn test_export_names_use_safe_key() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(FakeTracker {
            story: Some(Story {
                key: "../RD 294".to_string(),
                summary: "Manage assessments".to_string(),
                description: "As an admin".to_string(),
                acceptance_criteria: String::new(),
            }),
        });
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("Admin can archive an assessment".to_string()),
            Ok("Scenario: Archive\nGiven an assessment\nWhen archived\nThen it is hidden".to_string()),
        ]));
        let pipeline = StoryPipelineUseCase::new(tracker, client);

        let export = pipeline.execute("../RD 294", dir.path()).await.unwrap();

        assert_eq!(export.story_key, "../RD 294");
        assert_eq!(export.feature_path, dir.path().join("___RD_294_test_cases.feature"));
        assert_eq!(export.json_path, dir.path().join("___RD_294_test_cases.json"));
        assert!(export.feature_path.exists());
    }
}
