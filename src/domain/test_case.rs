use serde::{Deserialize, Serialize};

/// A scenario recovered from Gherkin text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCaseRecord {
    pub title: String,
    pub preconditions: Vec<String>,
    pub steps: Vec<String>,
    pub expected_results: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedTestCases {
    pub jira_id: String,
    pub content: String,
    pub token_count: usize,
}
