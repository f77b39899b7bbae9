//! Fixed prompt templates and the renderer that fills them.
//!
//! Every builder is a pure function of its inputs. Placeholders are written
//! `{name}` and substituted in a single pass, so story text that happens to
//! contain `{jira_id}` is copied verbatim rather than expanded.

use crate::domain::story::{BatchRequest, Story, StoryInput};

pub(crate) const TEST_CASE_TEMPLATE: &str = r#"
### Task: AI Test Case Generator

#### **Objective**
You are an AI test case generator. Your job is to analyze JIRA user stories and create **detailed, structured, and exhaustive** test scenarios and test cases.

---
#### **Instructions**
1. **Extract key details** from the user story.
2. **Generate the same output for the same input.** The scenarios and test cases must not change, not even in number, when the same user story is provided multiple times.
3. **Derive acceptance criteria** from the provided input when none are given.
4. **Identify all possible test scenarios**, covering positive, negative, and edge cases, with at least 95% coverage.
5. **Generate test cases** for each scenario, following the given format.
6. **Ensure strict format consistency** to maintain readability and usability.
7. **The response must contain at least 11-15 test scenarios.**

---
#### **Example Output Format**
(Use this exact format in your response)

---
### **User Story**
**Story Title:** [Extracted from JIRA]
**Description:** [Extracted from JIRA]
**JIRA Issue ID:** {jira_id}

### **Acceptance Criteria**
{acceptance_criteria}

---
### **Test Scenarios & Test Cases**

#### **Test Scenario ID: TS_01**
**Test Scenario:** [Purpose of this scenario, starting with "validate whether"]

##### **Test Case ID: TC_01**
- **Test Case:** [Purpose of this test case, starting with "validate whether"]
- **Preconditions:** [Any necessary setup before execution]
- **Test Data:** [Example test data if applicable, with the disclaimer "The test data is just for guidance and the actual test data is to be determined by the user."]
- **Test Execution Steps:**
  1. Step 1
  2. Step 2
  3. Step 3
  4. Provide as many steps as the test case needs.
- **Expected Outcome:** [Expected results]
- **Pass/Fail Criteria:**
  - **Pass:** [Conditions under which the test case passes]
  - **Fail:** [Conditions under which the test case fails]
- **Priority:** [Low | Medium | High]
- **References:** {jira_id}

---
#### **Now generate test scenarios and test cases for the following user story:**

**User Story:**
{user_story}

**JIRA Issue ID:** {jira_id}

**Expected Acceptance Criteria:**
{acceptance_criteria}

---
### **Response Format Requirements**
1. **Maintain structure exactly as shown above.**
2. **Include at least 11-15 test scenarios; provide more when the story requires them.**
3. **Generate 2-3 test cases per scenario, depending on the scenario.**
4. **Avoid unnecessary explanations; the output must be directly usable by QA engineers.**
5. **Cover the cases an experienced QA engineer might miss.**

Now generate the response.
"#;

pub(crate) const BATCH_TEMPLATE: &str = r#"
### Task: AI Test Case Generator - Batch {batch_number}

#### **Objective**
You are an AI test case generator. Your job is to analyze JIRA user stories and create **detailed, structured, and exhaustive** test scenarios and test cases.

---
### **User Story**
**Story Title:** Extracted from JIRA
**Description:** {user_story}
**JIRA Issue ID:** {jira_id}

### **Acceptance Criteria**
{acceptance_criteria}

---
### **Test Scenarios & Test Cases**
#### **Generate unique test cases in this batch. Ensure there is no duplication from previous batches.**
1. Generate exactly {scenario_count} unique test scenarios in this batch.
2. Each scenario should contain at least 2 detailed test cases.
3. Follow the structured format as shown in the provided example.
4. Ensure at least 95% coverage of the user story.
5. Cover positive, negative, boundary, security, usability, and performance cases.

---
**Now generate test scenarios and test cases for this batch:**
"#;

pub(crate) const REQUIREMENTS_TEMPLATE: &str = r#"
Please analyze this user story and extract key testable requirements:

Story: {summary}
Description: {description}
Acceptance Criteria: {acceptance_criteria}

Format your response as a list of clear, testable requirements.
Each requirement should be atomic and independently verifiable.
"#;

pub(crate) const GHERKIN_TEMPLATE: &str = r#"
Generate a test case in Gherkin format for this requirement:
{requirement}

Use this format:
Scenario: [Clear title describing the test case]
Given [precondition]
When [action]
Then [expected result]

Make sure to include all necessary steps and validations.
"#;

pub(crate) const GHERKIN_MARKDOWN_TEMPLATE: &str = r#"
You are a QA Engineer expert in generating test cases for any provided user story. Provide the Test Scenarios for the given user story in easy to understand but descriptive Gherkin syntax. Provide no additional helping text, only the Gherkin documentation. Cover every positive and negative scenario. Format the output as markdown with Gherkin highlighting.

Here is the user story.
{user_story}
"#;

/// Substitutes `{name}` placeholders in one left-to-right pass.
/// Unknown placeholders and unmatched braces are copied as-is.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let replacement = after_open.find('}').and_then(|close| {
            let name = &after_open[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                output.push_str(value);
                rest = &after_open[close + 1..];
            }
            None => {
                output.push('{');
                rest = after_open;
            }
        }
    }
    output.push_str(rest);
    output
}

/// `\r\n` and `\r` become `\n`; surrounding whitespace is dropped.
pub fn normalize_text(text: &str) -> String {
    text.trim().replace("\r\n", "\n").replace('\r', "\n")
}

pub fn build_test_case_prompt(story: &StoryInput) -> String {
    render_template(
        TEST_CASE_TEMPLATE,
        &[
            ("user_story", story.user_story.as_str()),
            ("jira_id", story.jira_id.as_str()),
            ("acceptance_criteria", story.criteria_or_empty()),
        ],
    )
}

pub fn build_batch_prompt(request: &BatchRequest<'_>) -> String {
    let batch_number = request.batch_index.to_string();
    let scenario_count = request.scenario_count.to_string();
    render_template(
        BATCH_TEMPLATE,
        &[
            ("batch_number", batch_number.as_str()),
            ("scenario_count", scenario_count.as_str()),
            ("user_story", request.story.user_story.as_str()),
            ("jira_id", request.story.jira_id.as_str()),
            ("acceptance_criteria", request.story.criteria_or_empty()),
        ],
    )
}

pub fn build_requirements_prompt(story: &Story) -> String {
    let description = normalize_text(&story.description);
    let criteria = normalize_text(&story.acceptance_criteria);
    render_template(
        REQUIREMENTS_TEMPLATE,
        &[
            ("summary", story.summary.as_str()),
            ("description", description.as_str()),
            ("acceptance_criteria", criteria.as_str()),
        ],
    )
}

pub fn build_gherkin_prompt(requirement: &str) -> String {
    render_template(GHERKIN_TEMPLATE, &[("requirement", requirement)])
}

pub fn build_gherkin_markdown_prompt(user_story: &str) -> String {
    render_template(GHERKIN_MARKDOWN_TEMPLATE, &[("user_story", user_story)])
}
