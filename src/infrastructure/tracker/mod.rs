pub mod jira;

use crate::domain::story::Story;
use async_trait::async_trait;

/// Source of stories. Lookup failures are logged by the implementation and
/// surface as `None`; callers must check for absence.
#[async_trait]
pub trait StoryTracker: Send + Sync {
    async fn get_story(&self, key: &str) -> Option<Story>;
}
