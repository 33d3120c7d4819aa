pub mod completions;
pub mod deps;
pub mod fmt;
pub mod hash;
pub mod man_pages;
pub mod update;
pub mod verify;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use zonpin_core::{DependencyOutcome, DependencyStatus, LocalFetcher};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
/// Hash mismatch during verify, or a tree that could not be hashed.
pub const EXIT_HASH_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

pub fn colorize_status(status: DependencyStatus) -> String {
    use console::Style;
    let label = status_label(status);
    match status {
        DependencyStatus::Updated => Style::new().green().apply_to(label).to_string(),
        DependencyStatus::Unchanged => Style::new().dim().apply_to(label).to_string(),
        DependencyStatus::Mismatch | DependencyStatus::Failed => {
            Style::new().red().bold().apply_to(label).to_string()
        }
        DependencyStatus::Missing => Style::new().yellow().apply_to(label).to_string(),
    }
}

pub fn status_label(status: DependencyStatus) -> &'static str {
    match status {
        DependencyStatus::Updated => "updated",
        DependencyStatus::Unchanged => "ok",
        DependencyStatus::Mismatch => "mismatch",
        DependencyStatus::Missing => "missing",
        DependencyStatus::Failed => "failed",
    }
}

pub fn local_fetcher(sources: &[String]) -> Result<LocalFetcher, String> {
    let fetcher = LocalFetcher::from_specs(sources).map_err(|e| e.to_string())?;
    if fetcher.is_empty() {
        return Err("no dependency sources given (use --source NAME=DIR)".to_owned());
    }
    Ok(fetcher)
}

pub fn print_outcome(outcome: &DependencyOutcome) {
    let detail = match (&outcome.error, &outcome.computed) {
        (Some(err), _) => err.clone(),
        (None, Some(hash)) => hash.to_string(),
        (None, None) => String::new(),
    };
    println!(
        "  {:<10} {} {detail}",
        colorize_status(outcome.status),
        outcome.name
    );
    if outcome.status == DependencyStatus::Mismatch {
        if let Some(stored) = &outcome.stored {
            println!("             stored   {stored}");
        }
    }
}
