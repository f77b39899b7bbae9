//! Markdown tables to CSV.
//!
//! The markdown is rendered to HTML first (GFM tables enabled) and the tables
//! are read back from the HTML tree, so cell text comes out exactly as a
//! browser would show it. Header and body cells are treated alike.

use crate::domain::error::{AppError, Result};
use crate::infrastructure::storage::write_file;
use csv::WriterBuilder;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use tracing::{error, info, warn};

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

pub type TableRows = Vec<Vec<String>>;

pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

/// Every table in document order, each as its rows of cell text.
pub fn extract_tables(markdown: &str) -> Vec<TableRows> {
    let document = Html::parse_document(&markdown_to_html(markdown));
    document
        .select(&TABLE_SELECTOR)
        .map(|table| {
            table
                .select(&ROW_SELECTOR)
                .map(row_cells)
                .filter(|cells| !cells.is_empty())
                .collect()
        })
        .collect()
}

fn write_csv(tables: &[TableRows]) -> Result<String> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in tables.iter().flatten() {
        writer
            .write_record(row)
            .map_err(|e| AppError::ParseError(format!("Failed to write CSV row: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::ParseError(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::ParseError(format!("CSV is not UTF-8: {}", e)))
}

/// All table rows of `markdown` as CSV. Rows may differ in length. Errors are
/// logged and produce an empty string.
pub fn markdown_to_csv(markdown: &str) -> String {
    let tables = extract_tables(markdown);
    if tables.is_empty() {
        warn!("No tables found in markdown");
        return String::new();
    }

    match write_csv(&tables) {
        Ok(csv) => csv,
        Err(err) => {
            error!(error = %err, "Failed to convert markdown tables to CSV");
            String::new()
        }
    }
}

/// Reads a markdown file and writes its tables to `output`. Returns the number
/// of CSV rows written.
pub fn convert_markdown_file(input: &Path, output: &Path) -> Result<usize> {
    let markdown = std::fs::read_to_string(input)
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", input.display(), e)))?;

    let csv = markdown_to_csv(&markdown);
    let rows = csv.lines().count();
    write_file(output, &csv)
        .map_err(|e| AppError::IoError(format!("Failed to write {}: {}", output.display(), e)))?;

    info!(input = %input.display(), output = %output.display(), rows, "CSV file saved");
    Ok(rows)
}
