//! Colored terminal output and download progress.
//!
//! Uses owo-colors for severity-prefixed lines and indicatif for progress
//! bars. Purely cosmetic; nothing in the crate depends on what gets printed.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Print a detail line (dimmed).
/// Example: "     downloaded tool-1.2.tar.gz (8192 bytes)"
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a warning (yellow, to stderr).
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Spinner shown while a download's size is still unknown.
pub fn download_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Switch a spinner to a sized bar once Content-Length is known.
pub fn download_bar(pb: &ProgressBar, total_size: u64) {
    pb.set_length(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("━╸━"),
    );
}
