//! Command-line surface of `casegen`.
//!
//! Argument parsing only; the commands are carried out in `app`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Generate QA test scenarios and test cases from user stories with an LLM.
#[derive(Parser, Debug)]
#[command(name = "casegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to `casegen.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the landing page and the test case generation API.
    Serve(ServeArgs),

    /// Generate scenarios in paced batches, appending each batch to a file.
    Batch(BatchArgs),

    /// Generate the full test case document with a single model call.
    Generate(GenerateArgs),

    /// Fetch a tracker story and export one Gherkin scenario per requirement.
    Story(StoryArgs),

    /// Print a tracker story.
    FetchStory(FetchStoryArgs),

    /// Convert the tables of a markdown file to CSV.
    TableCsv(TableCsvArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write every generation to a numbered file in the output directory.
    #[arg(long)]
    pub save_outputs: bool,
}

/// Story text given inline or read from a file.
#[derive(Args, Debug)]
pub struct StoryTextArgs {
    #[arg(long, conflicts_with = "story_file", required_unless_present = "story_file")]
    pub user_story: Option<String>,

    /// Read the user story from this file.
    #[arg(long)]
    pub story_file: Option<PathBuf>,

    #[arg(long)]
    pub jira_id: String,

    /// Acceptance criteria; derived by the model when omitted.
    #[arg(long)]
    pub criteria: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub story: StoryTextArgs,

    /// Total scenarios to request across all batches.
    #[arg(long)]
    pub total: Option<u32>,

    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Minimum seconds between model calls.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Request `total % batch_size` leftover scenarios in one extra batch.
    #[arg(long)]
    pub include_remainder: bool,

    /// File the batches are appended to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub story: StoryTextArgs,

    /// Directory for the numbered run log.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Ask for whole-story Gherkin in markdown instead of the test case document.
    #[arg(long)]
    pub gherkin: bool,
}

#[derive(Args, Debug)]
pub struct StoryArgs {
    /// Tracker key, e.g. RD-294.
    pub key: String,

    /// Directory for the `.feature` and `.json` exports.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FetchStoryArgs {
    pub key: String,
}

#[derive(Args, Debug)]
pub struct TableCsvArgs {
    pub input: PathBuf,

    /// Defaults to the input path with a `.csv` extension.
    pub output: Option<PathBuf>,
}
