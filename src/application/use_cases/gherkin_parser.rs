//! Line-oriented Gherkin reader.
//!
//! Model output is rarely clean Gherkin: it arrives wrapped in code fences,
//! preceded by a `Feature:` line or prose, and uses `And`/`But` freely. The
//! reader keeps an explicit state per line and only records steps that belong
//! to a scenario.

use crate::domain::test_case::TestCaseRecord;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingScenario,
    InScenario,
    InGiven,
    InWhen,
    InThen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Scenario(&'a str),
    Given(&'a str),
    When(&'a str),
    Then(&'a str),
    /// `And` or `But`.
    Continuation(&'a str),
    Ignored,
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with("```") || line.starts_with("Feature:") {
        return Line::Ignored;
    }
    if let Some(title) = line.strip_prefix("Scenario:") {
        return Line::Scenario(title.trim());
    }

    let (keyword, rest) = match line.find(char::is_whitespace) {
        Some(split) => (&line[..split], line[split..].trim()),
        None => (line, ""),
    };
    match keyword.to_ascii_lowercase().as_str() {
        "given" => Line::Given(rest),
        "when" => Line::When(rest),
        "then" => Line::Then(rest),
        "and" | "but" => Line::Continuation(rest),
        _ => Line::Ignored,
    }
}

struct GherkinParser {
    state: ParseState,
    current: TestCaseRecord,
}

impl GherkinParser {
    fn new() -> Self {
        Self {
            state: ParseState::SeekingScenario,
            current: TestCaseRecord::default(),
        }
    }

    /// Consumes one line; returns the previous scenario when a new one starts.
    fn feed(&mut self, raw: &str) -> Option<TestCaseRecord> {
        let line = classify(raw);

        if let Line::Scenario(title) = line {
            let finished = self.take_current();
            self.current.title = title.to_string();
            self.state = ParseState::InScenario;
            return finished;
        }
        if self.state == ParseState::SeekingScenario {
            return None;
        }

        let (target, text) = match (line, self.state) {
            (Line::Given(text), _) => (ParseState::InGiven, text),
            (Line::When(text), _) => (ParseState::InWhen, text),
            (Line::Then(text), _) => (ParseState::InThen, text),
            (
                Line::Continuation(text),
                state @ (ParseState::InGiven | ParseState::InWhen | ParseState::InThen),
            ) => (state, text),
            _ => return None,
        };

        self.state = target;
        if !text.is_empty() {
            let section = match target {
                ParseState::InGiven => &mut self.current.preconditions,
                ParseState::InWhen => &mut self.current.steps,
                _ => &mut self.current.expected_results,
            };
            section.push(text.to_string());
        }
        None
    }

    fn take_current(&mut self) -> Option<TestCaseRecord> {
        if self.state == ParseState::SeekingScenario {
            return None;
        }
        self.state = ParseState::SeekingScenario;
        Some(std::mem::take(&mut self.current))
    }
}

/// Every scenario in `text`, in order.
pub fn parse_scenarios(text: &str) -> Vec<TestCaseRecord> {
    let mut parser = GherkinParser::new();
    let mut scenarios: Vec<TestCaseRecord> =
        text.lines().filter_map(|line| parser.feed(line)).collect();
    scenarios.extend(parser.take_current());

    if scenarios.is_empty() {
        warn!("No Gherkin scenario found in text");
    }
    scenarios
}

/// The first scenario in `text`; anything after a second `Scenario:` is ignored.
pub fn parse_scenario(text: &str) -> Option<TestCaseRecord> {
    let mut parser = GherkinParser::new();
    let mut first = text.lines().find_map(|line| parser.feed(line));
    if first.is_none() {
        first = parser.take_current();
    }

    if first.is_none() {
        warn!("No Gherkin scenario found in text");
    }
    first
}
