//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::Result;
use tokio::sync::broadcast;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::gateway;
use crate::core::{Config, NoticeLevel, Portfolio, PortfolioEvent};

/// Effective configuration: files, environment, then command-line flags
pub fn load_config(global: &GlobalOpts) -> Config {
    Config::load().with_overrides(global.backend_url.clone(), global.demo)
}

/// Resolve `--format auto` for a command whose natural format is `fallback`
pub fn output_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    global
        .format
        .resolve(config.default_format.as_deref(), fallback)
}

/// Connect to the configured backend and load the portfolio.
///
/// A failed load is returned as the classified diagnosis, so the user sees
/// the remediation checklist.
pub async fn open_portfolio(global: &GlobalOpts) -> Result<Portfolio> {
    let config = load_config(global);
    let gateway = gateway::connect(&config).map_err(|e| miette::miette!("{}", e))?;

    if gateway.is_demo() && !global.quiet {
        eprintln!(
            "{} Demo mode: no backend configured, changes are kept in memory only",
            style("ℹ").blue()
        );
    }

    let mut portfolio = Portfolio::new(gateway);
    portfolio.load().await.map_err(miette::Report::new)?;
    Ok(portfolio)
}

/// Print queued info and success notices without waiting for more.
///
/// Error notices are skipped: one-shot commands report failures through
/// their returned error.
pub fn drain_notices(events: &mut broadcast::Receiver<PortfolioEvent>, quiet: bool) {
    loop {
        match events.try_recv() {
            Ok(PortfolioEvent::Notice { level, .. }) if level == NoticeLevel::Error => {}
            Ok(PortfolioEvent::Notice { level, message }) => print_notice(level, &message, quiet),
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "notice receiver lagged");
            }
            Err(_) => break,
        }
    }
}

/// Print a notice; errors go to stderr and are shown even when quiet
pub fn print_notice(level: NoticeLevel, message: &str, quiet: bool) {
    match level {
        NoticeLevel::Error => eprintln!("{} {}", style("✗").red(), message),
        NoticeLevel::Success if !quiet => println!("{} {}", style("✓").green(), message),
        NoticeLevel::Info if !quiet => println!("{} {}", style("ℹ").blue(), message),
        _ => {}
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Whole currency units with thousands separators, e.g. `150,000`
pub fn format_revenue(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Five-cell bar for a 0..=5 score, e.g. `●●●○○`
pub fn score_bar(score: u8) -> String {
    let filled = usize::from(score.min(crate::core::catalog::MAX_SCORE));
    let empty = usize::from(crate::core::catalog::MAX_SCORE) - filled;
    format!("{}{}", "●".repeat(filled), "○".repeat(empty))
}
