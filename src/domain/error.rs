use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    ConfigError(String),
    /// Provider rejected the request or returned something unusable. Not retried.
    LLMError(String),
    AuthError(String),
    RateLimited(String),
    Timeout(String),
    Unavailable(String),
    TrackerError(String),
    IoError(String),
}

impl AppError {
    /// Whether a model call that failed this way may succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited(_) | AppError::Timeout(_) | AppError::Unavailable(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::AuthError(msg) => write!(f, "Auth error: {}", msg),
            AppError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            AppError::TrackerError(msg) => write!(f, "Tracker error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(AppError::RateLimited("429".into()).is_retryable());
        assert!(AppError::Timeout("slow".into()).is_retryable());
        assert!(AppError::Unavailable("503".into()).is_retryable());

        assert!(!AppError::AuthError("401".into()).is_retryable());
        assert!(!AppError::LLMError("bad request".into()).is_retryable());
        assert!(!AppError::ParseError("x".into()).is_retryable());
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            AppError::LLMError("Invalid response format".into()).to_string(),
            "LLM error: Invalid response format"
        );
        assert_eq!(
            AppError::RateLimited("quota".into()).to_string(),
            "Rate limited: quota"
        );
    }

    #[test]
    fn test_from_io_error() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::IoError(msg) if msg.contains("gone")));
    }
}
