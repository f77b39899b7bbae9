use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Suffix used when the output directory cannot be scanned.
pub const DEFAULT_OUTPUT_ID: u32 = 1;

static OUTPUT_SUFFIX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"output(\d+)(?:\.[^.]*)?$").unwrap());

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// One past the highest `…output<N>.<ext>` suffix in `dir`.
///
/// Names without a numeric suffix are skipped. An empty directory yields
/// [`DEFAULT_OUTPUT_ID`], as does a directory that cannot be read.
pub fn next_output_id(dir: &Path) -> u32 {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, dir = %dir.display(), "Cannot scan output dir, using default id");
            return DEFAULT_OUTPUT_ID;
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            OUTPUT_SUFFIX_PATTERN
                .captures(name)
                .and_then(|caps| caps[1].parse::<u32>().ok())
        })
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(DEFAULT_OUTPUT_ID)
}

/// Writes `text` to `{dir}/{identifier}_output{N}.md` with the next free `N`.
///
/// The file is created exclusively, so a concurrent writer that picked the
/// same `N` pushes this one to the following suffix instead of being
/// overwritten.
pub fn write_numbered_output(dir: &Path, identifier: &str, text: &str) -> std::io::Result<PathBuf> {
    let stem = sanitize_identifier(identifier);
    write_numbered_from(dir, &stem, next_output_id(dir), text)
}

fn write_numbered_from(dir: &Path, stem: &str, first_id: u32, text: &str) -> std::io::Result<PathBuf> {
    let mut id = first_id;
    loop {
        let path = dir.join(format!("{}_output{}.md", stem, id));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(text.as_bytes())?;
                file.flush()?;
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists && id < u32::MAX => id += 1,
            Err(err) => return Err(err),
        }
    }
}

/// Appends `text`, creating the file (and its parent directory) on first use.
pub fn append_to_file(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

pub fn write_file(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, text)
}

/// File-name-safe form of a story key; anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_identifier(identifier: &str) -> String {
    let cleaned: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "story".to_string()
    } else {
        cleaned
    }
}
