// Poll loop: crawl every configured group, then draft replies, then idle.
//
// One group at a time, strictly sequential. A group whose crawl fails is
// logged and retried on the next cycle, and its reply pass still runs over
// what earlier cycles stored; no error stops the loop.

pub mod ingest;

pub use ingest::{group_url, CrawlReport, CrawlState, Ingestor, ThreadOutcome};

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::reply::{ReplyEngine, ReplyReport};

/// Results of one pass over all groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub crawls: Vec<CrawlReport>,
    pub replies: Vec<ReplyReport>,
    /// Groups whose crawl or reply pass returned an error.
    pub failed_groups: Vec<String>,
}

impl CycleReport {
    fn mark_failed(&mut self, group_id: &str) {
        if !self.failed_groups.iter().any(|g| g == group_id) {
            self.failed_groups.push(group_id.to_string());
        }
    }
}

/// Crawl each group once, running the reply engine after each group's
/// crawl when one is given. A failed crawl does not skip the reply pass.
pub async fn run_cycle(
    ingestor: &Ingestor,
    replies: Option<&ReplyEngine>,
    groups: &[String],
) -> CycleReport {
    let mut report = CycleReport::default();

    for group_id in groups {
        match ingestor.crawl_group(group_id).await {
            Ok(crawl) => report.crawls.push(crawl),
            Err(e) => {
                warn!(group_id = group_id.as_str(), error = %format!("{e:#}"), "Group crawl failed");
                report.mark_failed(group_id);
            }
        }

        if let Some(engine) = replies {
            match engine.process_group(group_id).await {
                Ok(reply) => report.replies.push(reply),
                Err(e) => {
                    warn!(group_id = group_id.as_str(), error = %format!("{e:#}"), "Reply pass failed");
                    report.mark_failed(group_id);
                }
            }
        }
    }

    report
}

/// Run cycles forever, sleeping `idle` between them.
pub async fn run_forever(
    ingestor: &Ingestor,
    replies: Option<&ReplyEngine>,
    groups: &[String],
    idle: Duration,
) -> Result<()> {
    if groups.is_empty() {
        anyhow::bail!("No groups to crawl");
    }

    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        let report = run_cycle(ingestor, replies, groups).await;
        let created: usize = report.crawls.iter().map(|c| c.created).sum();
        let drafted: usize = report.replies.iter().map(|r| r.drafts.len()).sum();
        info!(
            cycle,
            groups = groups.len(),
            created,
            drafted,
            failed_groups = report.failed_groups.len(),
            idle_secs = idle.as_secs(),
            "Cycle complete, sleeping"
        );
        tokio::time::sleep(idle).await;
    }
}
