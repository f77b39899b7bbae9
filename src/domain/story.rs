use serde::{Deserialize, Serialize};
use validator::Validate;

/// A story as stored in the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Story {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub acceptance_criteria: String,
}

/// Free-form story text as a user submits it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct StoryInput {
    #[validate(length(min = 1, message = "User story is required"))]
    pub user_story: String,
    #[validate(length(min = 1, message = "Jira id is required"))]
    pub jira_id: String,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
}

impl StoryInput {
    pub fn new(
        user_story: impl Into<String>,
        jira_id: impl Into<String>,
        acceptance_criteria: Option<String>,
    ) -> Self {
        Self {
            user_story: user_story.into(),
            jira_id: jira_id.into(),
            acceptance_criteria,
        }
    }

    pub fn criteria_or_empty(&self) -> &str {
        self.acceptance_criteria.as_deref().unwrap_or("")
    }
}

impl From<&Story> for StoryInput {
    fn from(story: &Story) -> Self {
        let user_story = match (story.summary.trim(), story.description.trim()) {
            (summary, "") => summary.to_string(),
            ("", description) => description.to_string(),
            (summary, description) => format!("{}\n\n{}", summary, description),
        };
        let criteria = story.acceptance_criteria.trim();
        Self {
            user_story,
            jira_id: story.key.clone(),
            acceptance_criteria: (!criteria.is_empty()).then(|| criteria.to_string()),
        }
    }
}

/// One batch of the multi-call workflow.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub story: &'a StoryInput,
    /// 1-based.
    pub batch_index: u32,
    pub scenario_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub batch_index: u32,
    pub content: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchFailure {
    pub batch_index: u32,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchReport {
    /// In generation order.
    pub results: Vec<GenerationResult>,
    pub failures: Vec<BatchFailure>,
    pub planned_batches: u32,
    /// Scenarios left over by integer division and not requested.
    pub dropped_scenarios: u32,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn combined_content(&self) -> String {
        self.results
            .iter()
            .map(|result| result.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_input_from_tracker_story() {
        let story = Story {
            key: "RD-294".to_string(),
            summary: "Manage assessments".to_string(),
            description: "As an admin I manage assessments".to_string(),
            acceptance_criteria: "  ".to_string(),
        };
        let input = StoryInput::from(&story);
        assert_eq!(input.jira_id, "RD-294");
        assert_eq!(
            input.user_story,
            "Manage assessments\n\nAs an admin I manage assessments"
        );
        assert_eq!(input.acceptance_criteria, None);
        assert_eq!(input.criteria_or_empty(), "");
    }

    #[test]
    fn test_story_input_validation() {
        let valid = StoryInput::new("As a user...", "PROJ-1", None);
        assert!(valid.validate().is_ok());

        let missing_story = StoryInput::new("", "PROJ-1", None);
        assert!(missing_story.validate().is_err());

        let missing_id = StoryInput::new("As a user...", "", None);
        assert!(missing_id.validate().is_err());
    }

    #[test]
    fn test_batch_report_combined_content_keeps_order() {
        let report = BatchReport {
            results: vec![
                GenerationResult {
                    batch_index: 1,
                    content: "first".to_string(),
                    word_count: 1,
                },
                GenerationResult {
                    batch_index: 3,
                    content: "third".to_string(),
                    word_count: 1,
                },
            ],
            failures: vec![BatchFailure {
                batch_index: 2,
                error: "boom".to_string(),
            }],
            planned_batches: 3,
            dropped_scenarios: 0,
        };
        assert_eq!(report.combined_content(), "first\n\nthird");
        assert_eq!(report.attempted(), 3);
    }
}
