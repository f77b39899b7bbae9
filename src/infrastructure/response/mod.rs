use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static INTERNAL_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<internal>[\s\S]*?</internal>").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleans model output before it is returned or exported.
///
/// Reasoning models (deepseek-r1 and friends) prepend their chain of thought
/// in tags; none of it belongs in a test case document.
pub fn clean_llm_response(response: &str) -> String {
    let normalized = response.replace("\r\n", "\n");

    let cleaned = THINK_TAG_PATTERN.replace_all(&normalized, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    let cleaned = INTERNAL_TAG_PATTERN.replace_all(&cleaned, "");

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(cleaned.trim(), "\n\n")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_think_tags() {
        let input = "<think>Let me list scenarios</think>### **User Story**";
        assert_eq!(clean_llm_response(input), "### **User Story**");
    }

    #[test]
    fn test_clean_self_closing_think() {
        assert_eq!(clean_llm_response("<think />Scenario: A"), "Scenario: A");
    }

    #[test]
    fn test_clean_reasoning_and_internal_tags() {
        let input = "<reasoning>x</reasoning><internal>y</internal>Given a user";
        assert_eq!(clean_llm_response(input), "Given a user");
    }

    #[test]
    fn test_clean_multiple_newlines_and_crlf() {
        let input = "Scenario: A\r\n\r\n\r\n\r\nGiven b";
        assert_eq!(clean_llm_response(input), "Scenario: A\n\nGiven b");
    }

    #[test]
    fn test_clean_preserves_markdown() {
        let input = "| ID | Title |\n|----|-------|\n| TC_01 | Login |";
        assert_eq!(clean_llm_response(input), input);
    }
}
