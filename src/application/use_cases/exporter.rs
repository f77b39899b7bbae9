use crate::domain::test_case::TestCaseRecord;
use crate::infrastructure::storage::write_file;
use std::path::Path;
use tracing::{error, info};

/// Renders records as `.feature` text. Each record becomes its own
/// `Feature:` block titled after the scenario.
pub fn to_gherkin(records: &[TestCaseRecord], output_file: Option<&Path>) -> String {
    let mut lines: Vec<String> = Vec::new();
    for record in records {
        lines.push(format!("Feature: {}", record.title));
        lines.push(format!("Scenario: {}\n", record.title));
        lines.extend(record.preconditions.iter().map(|p| format!("  Given {}", p)));
        lines.extend(record.steps.iter().map(|s| format!("  When {}", s)));
        lines.extend(record.expected_results.iter().map(|r| format!("  Then {}", r)));
        lines.push("\n".to_string());
    }
    let text = lines.join("\n");

    if let Some(path) = output_file {
        write_export(path, &text, "Gherkin");
    }
    text
}

/// Pretty JSON array (2-space indent). Serialisation failure is logged and
/// yields an empty string.
pub fn to_json(records: &[TestCaseRecord], output_file: Option<&Path>) -> String {
    let text = match serde_json::to_string_pretty(records) {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "Failed to convert test cases to JSON");
            return String::new();
        }
    };

    if let Some(path) = output_file {
        write_export(path, &text, "JSON");
    }
    text
}

fn write_export(path: &Path, text: &str, kind: &str) {
    match write_file(path, text) {
        Ok(()) => info!(path = %path.display(), kind, "Wrote export"),
        Err(err) => error!(error = %err, path = %path.display(), kind, "Failed to write export"),
    }
}
