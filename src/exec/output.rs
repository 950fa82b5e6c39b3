// src/exec/output.rs

//! Helpers for looking at captured output files.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

/// Longest line (in characters) we echo into logs and reports.
pub const MAX_LINE_CHARS: usize = 500;

/// Shorten `line` to `max_chars` characters plus a `... (skipped N chars)`
/// note, unless the note would make it longer than the input.
pub fn truncate_line(line: &str, max_chars: usize) -> String {
    let total = line.chars().count();
    if total <= max_chars {
        return line.to_string();
    }

    let head: String = line.chars().take(max_chars).collect();
    let candidate = format!("{head}... (skipped {} chars)", total - max_chars);

    if total <= candidate.chars().count() {
        line.to_string()
    } else {
        candidate
    }
}

/// Last `n_lines` lines of the file plus its total line count.
///
/// Invalid UTF-8 is replaced rather than rejected: harness output is not
/// guaranteed to be clean text.
pub fn last_lines(path: &Path, n_lines: usize) -> io::Result<(Vec<String>, usize)> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let total = lines.len();
    let start = total.saturating_sub(n_lines);

    Ok((
        lines[start..].iter().map(|l| l.to_string()).collect(),
        total,
    ))
}

/// Log the last `n_lines` lines of `path` (or all of it if shorter).
pub fn show_last_lines(path: &Path, n_lines: usize) {
    if !path.exists() {
        warn!(
            path = %path.display(),
            n_lines,
            "file does not exist, cannot show last lines"
        );
        return;
    }

    match last_lines(path, n_lines) {
        Ok((lines, total)) => {
            let heading = if total > n_lines {
                format!("Last {n_lines} lines")
            } else {
                "Contents".to_string()
            };
            let body = lines
                .iter()
                .map(|l| truncate_line(l, MAX_LINE_CHARS))
                .collect::<Vec<_>>()
                .join("\n");
            info!("{} of file {}:\n{}", heading, path.display(), body);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read output file");
        }
    }
}
