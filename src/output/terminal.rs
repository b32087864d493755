// Colored terminal output for one-shot commands (crawl, draft).
//
// Long-running mode reports through tracing only; these helpers are for
// summaries a person reads right after a command finishes.

use colored::Colorize;

use crate::pipeline::{CrawlReport, CycleReport};
use crate::reply::Draft;

/// Display the results of one pass over all groups.
pub fn display_cycle_report(report: &CycleReport) {
    println!("\n{}", "=== Crawl Summary ===".bold());
    println!();

    if report.crawls.is_empty() && report.failed_groups.is_empty() {
        println!("No groups crawled.");
        return;
    }

    println!(
        "  {:<16} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8}",
        "Group".dimmed(),
        "New".dimmed(),
        "Matched".dimmed(),
        "Updated".dimmed(),
        "Skipped".dimmed(),
        "Failed".dimmed(),
        "Comments".dimmed(),
    );
    println!("  {}", "-".repeat(68).dimmed());
    for crawl in &report.crawls {
        display_crawl_row(crawl);
    }

    for group_id in &report.failed_groups {
        println!("  {} {} failed this cycle", "!".red().bold(), group_id);
    }

    let drafts: Vec<&Draft> = report.replies.iter().flat_map(|r| &r.drafts).collect();
    if !drafts.is_empty() {
        println!(
            "\n{}",
            format!("=== Drafted Replies ({}) ===", drafts.len()).bold()
        );
        for draft in drafts {
            display_draft(draft);
        }
    }
    println!();
}

fn display_crawl_row(crawl: &CrawlReport) {
    let matched = if crawl.matched > 0 {
        crawl.matched.to_string().green().bold()
    } else {
        crawl.matched.to_string().normal()
    };
    let failed = if crawl.failed + crawl.pages_failed as usize > 0 {
        (crawl.failed + crawl.pages_failed as usize).to_string().red()
    } else {
        "0".normal()
    };
    println!(
        "  {:<16} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8}",
        crawl.group_id,
        crawl.created,
        matched,
        crawl.updated,
        crawl.excluded + crawl.duplicate_titles,
        failed,
        crawl.comments,
    );
}

/// Display a single drafted reply.
pub fn display_draft(draft: &Draft) {
    let title = super::truncate_chars(&draft.title, 60);
    println!("\n  {} {}", format!("[{}]", draft.post_id).cyan(), title.bold());
    for line in draft.text.lines() {
        println!("    {line}");
    }
}
