// Ingestion: crawl one group's listing pages into the store.
//
// Per group the crawl moves through:
//
//   Unknown -> GroupResolved -> (ListingFetched -> ThreadsProcessed) x pages -> Done
//
// Resolving the group is the only fatal step: if the group can't be loaded
// or created, the crawl returns Err and the caller moves on to the next
// group. Everything after that is best effort. A failed listing page is
// skipped, a failed thread is skipped, a failed comment is skipped.
//
// Identity rules for each listing row, in order:
//   1. fetch the detail page (no detail, no thread)
//   2. exclude terms in title or body drop the row entirely
//   3. a known post_id only refreshes title + updated
//   4. a new post_id whose title is already stored is a duplicate
//   5. otherwise match keywords, store the thread, then its comments

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::db::models::{now_local, parse_datetime_or_now, AuthorInfo, Comment, Group, Thread};
use crate::db::Database;
use crate::extract::{
    self, listing::listing_url, ExtractedComment, ListingRow, ThreadDetail,
};
use crate::fetch::{PaceWindow, Pacer, PageFetcher};
use crate::matching::{self, KeywordMatcher};

/// Where a group's crawl currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Unknown,
    GroupResolved,
    ListingFetched { page: u32 },
    ThreadsProcessed { page: u32 },
    Done,
}

/// What happened to one listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// New thread stored, with this many new comments.
    Created { matched: bool, comments: usize },
    /// Known thread; title and updated time refreshed.
    Updated,
    /// Title or body contained an exclude term.
    Excluded,
    /// A different thread with the same title is already stored.
    DuplicateTitle,
    /// Fetch or storage failure; the row was skipped.
    Failed,
}

/// Tally of one group crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub group_id: String,
    pub state: CrawlState,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub created: usize,
    pub matched: usize,
    pub updated: usize,
    pub excluded: usize,
    pub duplicate_titles: usize,
    pub failed: usize,
    pub comments: usize,
}

impl CrawlReport {
    fn new(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            state: CrawlState::Unknown,
            pages_fetched: 0,
            pages_failed: 0,
            created: 0,
            matched: 0,
            updated: 0,
            excluded: 0,
            duplicate_titles: 0,
            failed: 0,
            comments: 0,
        }
    }

    fn advance(&mut self, state: CrawlState) {
        debug!(group_id = self.group_id.as_str(), from = ?self.state, to = ?state, "Crawl state");
        self.state = state;
    }

    fn record(&mut self, outcome: ThreadOutcome) {
        match outcome {
            ThreadOutcome::Created { matched, comments } => {
                self.created += 1;
                self.matched += usize::from(matched);
                self.comments += comments;
            }
            ThreadOutcome::Updated => self.updated += 1,
            ThreadOutcome::Excluded => self.excluded += 1,
            ThreadOutcome::DuplicateTitle => self.duplicate_titles += 1,
            ThreadOutcome::Failed => self.failed += 1,
        }
    }
}

/// Crawls groups into the store.
pub struct Ingestor {
    db: Arc<dyn Database>,
    fetcher: Arc<dyn PageFetcher>,
    pacer: Arc<Pacer>,
    base_url: String,
    config: CrawlConfig,
    matcher: KeywordMatcher,
}

impl Ingestor {
    /// Build an ingestor, compiling the configured keywords.
    pub fn new(
        db: Arc<dyn Database>,
        fetcher: Arc<dyn PageFetcher>,
        pacer: Arc<Pacer>,
        base_url: &str,
        config: CrawlConfig,
    ) -> Result<Self> {
        let matcher = KeywordMatcher::new(&config.keywords)?;
        Ok(Self {
            db,
            fetcher,
            pacer,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            matcher,
        })
    }

    /// Crawl `config.pages` listing pages of one group.
    pub async fn crawl_group(&self, group_id: &str) -> Result<CrawlReport> {
        let mut report = CrawlReport::new(group_id);
        info!(group_id, pages = self.config.pages, "Crawling group");

        let group = self
            .resolve_group(group_id)
            .await
            .with_context(|| format!("Failed to resolve group {group_id}"))?;
        report.advance(CrawlState::GroupResolved);

        for page in 0..self.config.pages {
            let rows = match self.fetch_listing(group_id, page).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(group_id, page, error = %e, "Listing page failed, skipping");
                    report.pages_failed += 1;
                    continue;
                }
            };
            report.pages_fetched += 1;
            report.advance(CrawlState::ListingFetched { page });
            debug!(group_id, page, rows = rows.len(), "Listing page parsed");

            for row in &rows {
                let outcome = self.process_row(&group, row).await;
                report.record(outcome);
            }
            report.advance(CrawlState::ThreadsProcessed { page });
        }

        report.advance(CrawlState::Done);
        info!(
            group_id,
            created = report.created,
            matched = report.matched,
            updated = report.updated,
            excluded = report.excluded,
            duplicates = report.duplicate_titles,
            failed = report.failed,
            comments = report.comments,
            "Group crawl complete"
        );
        Ok(report)
    }

    /// Route one listing row through the identity rules.
    /// Failures are logged and reported as [`ThreadOutcome::Failed`].
    pub async fn process_row(&self, group: &Group, row: &ListingRow) -> ThreadOutcome {
        match self.try_process_row(group, row).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(post_id = row.post_id.as_str(), error = %e, "Thread skipped");
                ThreadOutcome::Failed
            }
        }
    }

    async fn try_process_row(&self, group: &Group, row: &ListingRow) -> Result<ThreadOutcome> {
        let html = self.fetch_html(&row.url, self.config.detail_delay).await?;
        let detail: ThreadDetail = extract::parse_thread_detail(&html)?;

        if matching::is_excluded(&self.config.exclude, &row.title, &detail.content) {
            debug!(post_id = row.post_id.as_str(), "Excluded");
            return Ok(ThreadOutcome::Excluded);
        }

        if let Some(mut existing) = self.db.get_thread(&row.post_id).await? {
            existing.title = row.title.clone();
            existing.updated = parse_datetime_or_now(&row.updated);
            self.db.update_thread(&existing).await?;
            debug!(post_id = row.post_id.as_str(), "Updated thread");
            return Ok(ThreadOutcome::Updated);
        }

        if self.db.title_exists(&row.title).await? {
            info!(post_id = row.post_id.as_str(), title = row.title.as_str(), "Duplicate title, ignoring");
            return Ok(ThreadOutcome::DuplicateTitle);
        }

        let hits = self.matcher.check(&row.title, &detail.content);
        let thread = Thread {
            post_id: row.post_id.clone(),
            group_id: group.id.clone(),
            author: author_info(&row.author_name, &row.author_url),
            url: row.url.clone(),
            title: row.title.clone(),
            content: detail.content,
            photos: detail.photos,
            is_matched: hits.matched,
            keywords: hits.keywords,
            created: parse_datetime_or_now(&detail.created),
            updated: parse_datetime_or_now(&row.updated),
            first_seen_at: now_local(),
        };
        self.db.create_thread(&thread).await?;
        info!(
            post_id = thread.post_id.as_str(),
            matched = thread.is_matched,
            keywords = ?thread.keywords,
            "Stored thread"
        );

        let comments = match self.store_comments(&thread).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(post_id = thread.post_id.as_str(), error = %e, "Comments skipped");
                0
            }
        };
        Ok(ThreadOutcome::Created {
            matched: thread.is_matched,
            comments,
        })
    }

    /// Load the group, fetching and storing it on first sight.
    async fn resolve_group(&self, group_id: &str) -> Result<Group> {
        if let Some(group) = self.db.get_group(group_id).await? {
            return Ok(group);
        }

        let url = group_url(&self.base_url, group_id);
        let page = self.fetcher.fetch(&url).await?;
        if !page.is_ok() {
            anyhow::bail!("Group page {url} returned status {}", page.status);
        }
        let info = extract::parse_group_info(&page.body, group_id)?;

        let group = Group {
            id: group_id.to_string(),
            name: info.name,
            url,
            member_count: info.member_count,
            created: info.created,
            first_seen_at: now_local(),
        };
        self.db.create_group(&group).await?;
        info!(group_id, name = group.name.as_str(), members = group.member_count, "Stored group");
        Ok(group)
    }

    async fn fetch_listing(&self, group_id: &str, page: u32) -> Result<Vec<ListingRow>> {
        let url = listing_url(&self.base_url, group_id, page);
        let html = self.fetch_html(&url, self.config.listing_delay).await?;
        extract::parse_listing(&html, &self.base_url, now_local().date())
    }

    /// Fetch a thread's page again and store its comments in page order.
    /// Returns how many were new.
    async fn store_comments(&self, thread: &Thread) -> Result<usize> {
        let html = self.fetch_html(&thread.url, self.config.comment_delay).await?;
        let extracted = extract::parse_comments(&html, &thread.post_id)?;

        let mut stored = 0;
        for item in extracted {
            if item.synthetic_id {
                debug!(post_id = thread.post_id.as_str(), comment_id = item.comment_id.as_str(), "Comment has no site ID");
            }
            let comment = to_comment(item, thread);
            match self.db.create_comment(&comment).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(comment_id = comment.comment_id.as_str(), error = %e, "Failed to store comment");
                }
            }
        }
        debug!(post_id = thread.post_id.as_str(), stored, "Comments stored");
        Ok(stored)
    }

    /// Pace, then GET. Non-200 is an error for the caller's unit of work.
    async fn fetch_html(&self, url: &str, window: PaceWindow) -> Result<String> {
        self.pacer.pace(window).await;
        let page = self.fetcher.fetch(url).await?;
        if !page.is_ok() {
            anyhow::bail!("{url} returned status {}", page.status);
        }
        Ok(page.body)
    }
}

/// Landing page URL of a group.
pub fn group_url(base_url: &str, group_id: &str) -> String {
    format!("{}/group/{group_id}/", base_url.trim_end_matches('/'))
}

fn author_info(name: &str, url: &str) -> AuthorInfo {
    let mut author = AuthorInfo::new();
    if !name.is_empty() {
        author.insert("name".to_string(), name.to_string());
    }
    if !url.is_empty() {
        author.insert("url".to_string(), url.to_string());
    }
    author
}

fn to_comment(item: ExtractedComment, thread: &Thread) -> Comment {
    Comment {
        comment_id: item.comment_id,
        post_id: thread.post_id.clone(),
        group_id: thread.group_id.clone(),
        author: author_info(&item.author_name, &item.author_url),
        content: item.content,
        reply_to_id: item.reply_to_id,
        like_count: item.like_count,
        created: parse_datetime_or_now(&item.created),
        inserted_at: now_local(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_url() {
        assert_eq!(
            group_url("https://www.douban.com/", "abc123"),
            "https://www.douban.com/group/abc123/"
        );
    }

    #[test]
    fn test_author_info_skips_empty_fields() {
        assert!(author_info("", "").is_empty());
        let author = author_info("alice", "");
        assert_eq!(author.get("name").map(String::as_str), Some("alice"));
        assert!(!author.contains_key("url"));
    }

    #[test]
    fn test_report_tallies_outcomes() {
        let mut report = CrawlReport::new("g");
        report.record(ThreadOutcome::Created { matched: true, comments: 3 });
        report.record(ThreadOutcome::Created { matched: false, comments: 1 });
        report.record(ThreadOutcome::Updated);
        report.record(ThreadOutcome::DuplicateTitle);
        report.record(ThreadOutcome::Failed);
        assert_eq!(report.created, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.comments, 4);
        assert_eq!(report.updated, 1);
        assert_eq!(report.duplicate_titles, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.excluded, 0);
    }
}
