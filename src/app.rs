use crate::application::use_cases::prompt_builder::build_gherkin_markdown_prompt;
use crate::application::use_cases::table_export::convert_markdown_file;
use crate::application::use_cases::test_case_generator::save_run_log;
use crate::application::{
    AppendFileSink, BatchConfig, BatchGenerationUseCase, StoryPipelineUseCase,
    TestCaseGenerationUseCase, TokenBucket,
};
use crate::domain::error::{AppError, Result};
use crate::domain::story::StoryInput;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::build_llm_client;
use crate::infrastructure::tracker::jira::JiraClient;
use crate::interfaces::cli::{
    BatchArgs, Cli, Command, FetchStoryArgs, GenerateArgs, ServeArgs, StoryArgs, StoryTextArgs,
    TableCsvArgs,
};
use crate::interfaces::http::{start_server, HttpState};
use crate::shared::token_counter::TokenCounter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_filter);

    match cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Batch(args) => batch(config, args).await,
        Command::Generate(args) => generate(config, args).await,
        Command::Story(args) => story(config, args).await,
        Command::FetchStory(args) => fetch_story(config, args).await,
        Command::TableCsv(args) => table_csv(args),
    }
}

fn story_input(args: &StoryTextArgs) -> Result<StoryInput> {
    let user_story = match (&args.user_story, &args.story_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?,
        (None, None) => String::new(),
    };

    let story = StoryInput::new(
        user_story.trim(),
        args.jira_id.trim(),
        args.criteria.clone().filter(|c| !c.trim().is_empty()),
    );
    story
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    Ok(story)
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let save_outputs = config.server.save_outputs || args.save_outputs;

    let client = build_llm_client(&config.llm)?;
    let state = HttpState {
        generator: Arc::new(TestCaseGenerationUseCase::new(client)),
        output_dir: save_outputs.then(|| config.output.dir.clone()),
    };

    start_server(&config.server, state)?.await?;
    Ok(())
}

async fn batch(config: AppConfig, args: BatchArgs) -> Result<()> {
    let story = story_input(&args.story)?;

    let mut settings = config.batch.clone();
    if let Some(total) = args.total {
        settings.total_scenarios = total;
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(interval_secs) = args.interval_secs {
        settings.interval_secs = interval_secs;
    }
    settings.include_remainder |= args.include_remainder;

    let output = args.output.unwrap_or_else(|| config.output.batch_file.clone());
    let client = build_llm_client(&config.llm)?;
    let limiter = Arc::new(TokenBucket::per_interval(Duration::from_secs(
        settings.interval_secs,
    )));
    let use_case = BatchGenerationUseCase::new(client, limiter)
        .with_sink(Arc::new(AppendFileSink::new(&output)));

    let report = use_case
        .execute(&story, &BatchConfig::from(&settings))
        .await?;

    if report.planned_batches > 0 && report.results.is_empty() {
        return Err(AppError::LLMError(format!(
            "All {} batches failed",
            report.planned_batches
        )));
    }

    let words = TokenCounter::estimate_total(report.results.iter().map(|r| r.content.as_str()));
    println!(
        "Generated {}/{} batches ({} words) into {}",
        report.results.len(),
        report.planned_batches,
        words,
        output.display()
    );
    for failure in &report.failures {
        println!("Batch {} failed: {}", failure.batch_index, failure.error);
    }
    if report.dropped_scenarios > 0 {
        println!(
            "{} scenarios not requested (use --include-remainder)",
            report.dropped_scenarios
        );
    }
    Ok(())
}

async fn generate(config: AppConfig, args: GenerateArgs) -> Result<()> {
    let story = story_input(&args.story)?;
    let dir = args.output_dir.unwrap_or_else(|| config.output.dir.clone());
    let use_case = TestCaseGenerationUseCase::new(build_llm_client(&config.llm)?);

    let (generated, path) = if args.gherkin {
        let generated = use_case.execute_gherkin_markdown(&story).await?;
        let prompt = build_gherkin_markdown_prompt(&story.user_story);
        let path = save_run_log(&dir, &prompt, &generated)?;
        (generated, path)
    } else {
        use_case.execute_to_file(&story, &dir).await?
    };

    println!("{}", generated.content);
    info!(path = %path.display(), token_count = generated.token_count, "Generation saved");
    Ok(())
}

async fn story(config: AppConfig, args: StoryArgs) -> Result<()> {
    let tracker = Arc::new(JiraClient::new(&config.tracker)?);
    let pipeline = StoryPipelineUseCase::new(tracker, build_llm_client(&config.llm)?);
    let out_dir = args.out_dir.unwrap_or_else(|| config.output.exports_dir.clone());

    let export = pipeline.execute(&args.key, &out_dir).await?;

    println!("\nGenerated Test Cases (Gherkin format):");
    println!("{}", export.gherkin);
    println!("\nGenerated Test Cases (JSON format):");
    println!("{}", export.json);
    Ok(())
}

async fn fetch_story(config: AppConfig, args: FetchStoryArgs) -> Result<()> {
    let tracker = JiraClient::new(&config.tracker)?;
    let story = tracker.fetch_story(&args.key).await?;
    let text = serde_json::to_string_pretty(&story)
        .map_err(|e| AppError::Internal(format!("Failed to render story: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn table_csv(args: TableCsvArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("csv"));
    let rows = convert_markdown_file(&args.input, &output)?;
    if rows == 0 {
        warn!(input = %args.input.display(), "No table rows found");
    }
    println!("CSV file saved as {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn text_args(user_story: Option<&str>, story_file: Option<PathBuf>) -> StoryTextArgs {
        StoryTextArgs {
            user_story: user_story.map(str::to_string),
            story_file,
            jira_id: " RD-409 ".to_string(),
            criteria: Some("   ".to_string()),
        }
    }

    #[test]
    fn test_story_input_inline() {
        let story = story_input(&text_args(Some("  As a user  "), None)).unwrap();
        assert_eq!(story.user_story, "As a user");
        assert_eq!(story.jira_id, "RD-409");
        assert_eq!(story.acceptance_criteria, None);
    }

    #[test]
    fn test_story_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.md");
        std::fs::write(&path, "As a shopper\nI want a cart\n").unwrap();

        let story = story_input(&text_args(None, Some(path))).unwrap();
        assert_eq!(story.user_story, "As a shopper\nI want a cart");
    }

    #[test]
    fn test_story_input_rejects_blank_story() {
        let err = story_input(&text_args(Some("   "), None)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("User story is required")));
    }

    #[test]
    fn test_table_csv_defaults_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cases.md");
        std::fs::write(&input, "| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();

        table_csv(TableCsvArgs {
            input: input.clone(),
            output: None,
        })
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("cases.csv")).unwrap(),
            "a,b\n1,2\n"
        );
    }
}
