// Colored terminal output for scan results.
//
// This module handles all terminal-specific formatting: colors, tables,
// summaries. The main.rs display paths delegate here.

use colored::Colorize;

use crate::page::PageMode;
use crate::ratio::{self, RatioTier};
use crate::scan::ScanSummary;
use crate::stats::VideoStat;

/// Display the scan result table in the terminal.
pub fn display_results(stats: &[VideoStat]) {
    if stats.is_empty() {
        println!("No results yet. Run `ratioed scan <snapshot> --url <page-url>` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Like Ratios ({} videos) ===", stats.len()).bold()
    );
    println!();

    // Header
    println!(
        "  {:>4}  {:<14} {:>8}  {:<6}  {:>14}  {:>12}",
        "Rank".dimmed(),
        "Video".dimmed(),
        "Ratio".dimmed(),
        "Tier".dimmed(),
        "Views".dimmed(),
        "Likes".dimmed(),
    );
    println!("  {}", "-".repeat(70).dimmed());

    for (i, stat) in stats.iter().enumerate() {
        let display = ratio::display_for(stat);
        let ratio_cell = display.prefix.trim().to_string();
        let views_cell = if stat.views >= 0 {
            ratio::group_thousands(stat.views)
        } else {
            "-".to_string()
        };
        let likes_cell = if stat.likes >= 0 {
            ratio::group_thousands(stat.likes)
        } else {
            "-".to_string()
        };

        println!(
            "  {:>4}. {:<14} {:>8}  {:<6}  {:>14}  {:>12}",
            i + 1,
            stat.video_id,
            colorize_tier(&ratio_cell, display.tier),
            colorize_tier(display.tier.as_str(), display.tier),
            views_cell,
            likes_cell,
        );
        if let Some(message) = &stat.message {
            println!("        {}", super::truncate_chars(message, 60).dimmed());
        }
    }

    println!();

    // Summary
    let counts = |tier: RatioTier| {
        stats
            .iter()
            .filter(|s| ratio::display_for(s).tier == tier)
            .count()
    };
    let high = counts(RatioTier::High);
    let medium = counts(RatioTier::Medium);
    let low = counts(RatioTier::Low);
    let errors = counts(RatioTier::Error);

    if high > 0 {
        println!("  {} {} high-ratio videos (>= 10%)", "+".green().bold(), high);
    }
    if medium > 0 {
        println!("  {} {} medium-ratio videos (5-10%)", "~".yellow(), medium);
    }
    if low > 0 {
        println!("  {} {} low-ratio videos (< 5%)", "-".red(), low);
    }
    if errors > 0 {
        println!("  {} {} videos without usable stats", "?".dimmed(), errors);
    }
}

/// One-line wrap-up after a CLI scan pass.
pub fn display_scan_summary(summary: &ScanSummary) {
    println!("\n{}", "Scan complete.".bold());
    println!("  Page mode: {}", page_mode_label(summary.mode));
    println!("  Candidates found: {}", summary.candidates);
    println!("  Titles annotated: {}", summary.annotated);
    if summary.suppressed > 0 {
        println!("  Below threshold: {}", summary.suppressed);
    }
    if summary.errors > 0 {
        println!(
            "  {} {} candidates failed (see log)",
            "Warning:".yellow(),
            summary.errors
        );
    }
}

fn page_mode_label(mode: PageMode) -> &'static str {
    match mode {
        PageMode::Homepage => "YouTube homepage",
        PageMode::Search => "YouTube search results",
        PageMode::Watch => "YouTube watch page",
        PageMode::GoogleResults => "Google search results",
        PageMode::Unsupported => "unsupported",
    }
}

/// Colorize a table cell by ratio tier.
fn colorize_tier(text: &str, tier: RatioTier) -> colored::ColoredString {
    match tier {
        RatioTier::High => text.green().bold(),
        RatioTier::Medium => text.yellow(),
        RatioTier::Low => text.red(),
        RatioTier::Error => text.dimmed(),
    }
}
