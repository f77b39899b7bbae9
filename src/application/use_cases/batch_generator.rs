//! Multi-call generation: a target number of scenarios split into batches that
//! run one after another, each paced by the rate limiter.

use crate::application::use_cases::prompt_builder::build_batch_prompt;
use crate::application::use_cases::rate_limiter::RateLimiter;
use crate::domain::error::{AppError, Result};
use crate::domain::story::{BatchFailure, BatchReport, BatchRequest, GenerationResult, StoryInput};
use crate::infrastructure::config::BatchSettings;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use crate::infrastructure::storage::append_to_file;
use crate::shared::token_counter::TokenCounter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub total_scenarios: u32,
    pub batch_size: u32,
    pub include_remainder: bool,
}

impl From<&BatchSettings> for BatchConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            total_scenarios: settings.total_scenarios,
            batch_size: settings.batch_size,
            include_remainder: settings.include_remainder,
        }
    }
}

/// `(batch_index, scenario_count)` for every batch to request, plus the
/// scenarios left out.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchPlan {
    batches: Vec<(u32, u32)>,
    dropped_scenarios: u32,
}

impl BatchPlan {
    fn new(config: &BatchConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(AppError::ValidationError(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        let full_batches = config.total_scenarios / config.batch_size;
        let remainder = config.total_scenarios % config.batch_size;

        let mut batches: Vec<(u32, u32)> = (1..=full_batches)
            .map(|index| (index, config.batch_size))
            .collect();
        let mut dropped_scenarios = 0;

        if remainder > 0 {
            if config.include_remainder {
                batches.push((full_batches + 1, remainder));
            } else {
                warn!(
                    total_scenarios = config.total_scenarios,
                    batch_size = config.batch_size,
                    dropped = remainder,
                    "Total is not a multiple of batch size; remainder will not be requested"
                );
                dropped_scenarios = remainder;
            }
        }

        Ok(Self {
            batches,
            dropped_scenarios,
        })
    }
}

/// Durable, append-only record of finished batches.
pub trait BatchSink: Send + Sync {
    fn append(&self, result: &GenerationResult) -> Result<()>;
}

/// Appends each batch to one markdown file under a `### Batch N` header.
pub struct AppendFileSink {
    path: PathBuf,
}

impl AppendFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BatchSink for AppendFileSink {
    fn append(&self, result: &GenerationResult) -> Result<()> {
        let text = format!(
            "\n### Batch {} Generated Test Cases:\n{}\n\n",
            result.batch_index, result.content
        );
        append_to_file(&self.path, &text).map_err(|e| {
            AppError::IoError(format!("Failed to append to {}: {}", self.path.display(), e))
        })
    }
}

pub struct BatchGenerationUseCase {
    llm_client: Arc<dyn LLMClient>,
    limiter: Arc<dyn RateLimiter>,
    sink: Option<Arc<dyn BatchSink>>,
}

impl BatchGenerationUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            llm_client,
            limiter,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn BatchSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs every planned batch in order. A failed batch is recorded and
    /// skipped; only an invalid configuration fails the whole run.
    pub async fn execute(&self, story: &StoryInput, config: &BatchConfig) -> Result<BatchReport> {
        let plan = BatchPlan::new(config)?;
        let planned_batches = plan.batches.len() as u32;

        info!(
            jira_id = %story.jira_id,
            batches = planned_batches,
            model = self.llm_client.model(),
            "Starting batch generation"
        );

        let mut report = BatchReport {
            planned_batches,
            dropped_scenarios: plan.dropped_scenarios,
            ..BatchReport::default()
        };

        for (batch_index, scenario_count) in plan.batches {
            self.limiter.acquire().await;

            let request = BatchRequest {
                story,
                batch_index,
                scenario_count,
            };
            let prompt = build_batch_prompt(&request);

            info!(batch = batch_index, of = planned_batches, "Generating batch");
            match self.llm_client.generate(&prompt).await {
                Ok(raw) => {
                    let content = clean_llm_response(&raw);
                    let result = GenerationResult {
                        batch_index,
                        word_count: TokenCounter::estimate_tokens(&content),
                        content,
                    };
                    self.persist(&result);
                    report.results.push(result);
                }
                Err(err) => {
                    error!(error = %err, batch = batch_index, "Batch generation failed, continuing");
                    report.failures.push(BatchFailure {
                        batch_index,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.results.len(),
            failed = report.failures.len(),
            "Batch generation finished"
        );
        Ok(report)
    }

    fn persist(&self, result: &GenerationResult) {
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.append(result) {
                error!(error = %err, batch = result.batch_index, "Failed to persist batch");
            }
        }
    }
}
