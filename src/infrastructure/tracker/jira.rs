use super::StoryTracker;
use crate::domain::error::{AppError, Result};
use crate::domain::story::Story;
use crate::infrastructure::config::TrackerSettings;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct JiraField {
    id: String,
    name: String,
}

/// Jira REST v2 with basic auth (account email + API token).
pub struct JiraClient {
    client: reqwest::Client,
    base_url: Url,
    email: String,
    token: String,
    acceptance_field_fallback: String,
}

impl JiraClient {
    pub fn new(settings: &TrackerSettings) -> Result<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("tracker.base_url is required".to_string()))?;
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| AppError::ConfigError(format!("Invalid tracker.base_url: {}", e)))?;
        let email = settings
            .email
            .clone()
            .ok_or_else(|| AppError::ConfigError("JIRA_EMAIL is not set".to_string()))?;
        let token = settings
            .token
            .clone()
            .ok_or_else(|| AppError::ConfigError("JIRA_TOKEN is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(server = %base_url, "Jira client configured");

        Ok(Self {
            client,
            base_url,
            email,
            token,
            acceptance_field_fallback: settings.acceptance_field_fallback.clone(),
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::ConfigError("tracker.base_url cannot carry a path".to_string())
            })?;
            path.pop_if_empty()
                .extend(["rest", "api", "2"])
                .extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::TrackerError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::TrackerError(format!("API error ({}): {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TrackerError(format!("Failed to parse JSON: {}", e)))
    }

    pub async fn fetch_story(&self, key: &str) -> Result<Story> {
        let issue: JiraIssue = self.get_json(self.api_url(&["issue", key])?).await?;
        let fields: Vec<JiraField> = self.get_json(self.api_url(&["field"])?).await?;
        let criteria_field = acceptance_criteria_field(&fields, &self.acceptance_field_fallback);
        Ok(story_from_issue(issue, &criteria_field))
    }
}

fn acceptance_criteria_field(fields: &[JiraField], fallback: &str) -> String {
    fields
        .iter()
        .find(|field| field.name.to_lowercase().contains("acceptance criteria"))
        .map(|field| field.id.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn field_text(fields: &serde_json::Map<String, serde_json::Value>, name: &str) -> String {
    match fields.get(name) {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn story_from_issue(issue: JiraIssue, criteria_field: &str) -> Story {
    Story {
        summary: field_text(&issue.fields, "summary"),
        description: field_text(&issue.fields, "description"),
        acceptance_criteria: field_text(&issue.fields, criteria_field),
        key: issue.key,
    }
}

#[async_trait]
impl StoryTracker for JiraClient {
    async fn get_story(&self, key: &str) -> Option<Story> {
        match self.fetch_story(key).await {
            Ok(story) => {
                info!(key = %story.key, "Retrieved Jira story");
                Some(story)
            }
            Err(err) => {
                error!(error = %err, key, "Failed to retrieve Jira story");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> TrackerSettings {
        TrackerSettings {
            base_url: Some(base_url.to_string()),
            email: Some("qa@example.com".to_string()),
            token: Some("token".to_string()),
            acceptance_field_fallback: "customfield_10000".to_string(),
        }
    }

    #[test]
    fn test_api_url_with_and_without_trailing_slash() {
        let client = JiraClient::new(&settings("https://example.atlassian.net/")).unwrap();
        assert_eq!(
            client.api_url(&["issue", "RD-294"]).unwrap().as_str(),
            "https://example.atlassian.net/rest/api/2/issue/RD-294"
        );

        let client = JiraClient::new(&settings("https://example.atlassian.net")).unwrap();
        assert_eq!(
            client.api_url(&["field"]).unwrap().as_str(),
            "https://example.atlassian.net/rest/api/2/field"
        );
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut missing = settings("https://example.atlassian.net");
        missing.token = None;
        assert!(matches!(
            JiraClient::new(&missing),
            Err(AppError::ConfigError(_))
        ));

        let mut no_url = settings("");
        no_url.base_url = None;
        assert!(JiraClient::new(&no_url).is_err());
    }

    #[test]
    fn test_acceptance_criteria_field_lookup() {
        let fields: Vec<JiraField> = serde_json::from_str(
            r#"[{"id":"summary","name":"Summary"},{"id":"customfield_10035","name":"Acceptance Criteria"}]"#,
        )
        .unwrap();
        assert_eq!(
            acceptance_criteria_field(&fields, "customfield_10000"),
            "customfield_10035"
        );
        assert_eq!(
            acceptance_criteria_field(&fields[..1], "customfield_10000"),
            "customfield_10000"
        );
    }

    #[test]
    fn test_story_from_issue_defaults_missing_fields() {
        let issue: JiraIssue = serde_json::from_str(
            r#"{"key":"RD-294","fields":{"summary":"Manage assessments","description":null}}"#,
        )
        .unwrap();
        let story = story_from_issue(issue, "customfield_10000");
        assert_eq!(story.key, "RD-294");
        assert_eq!(story.summary, "Manage assessments");
        assert_eq!(story.description, "");
        assert_eq!(story.acceptance_criteria, "");
    }

    #[tokio::test]
    async fn test_unreachable_tracker_yields_none() {
        let client = JiraClient::new(&settings("http://127.0.0.1:1")).unwrap();
        assert!(client.get_story("RD-294").await.is_none());
    }
}
