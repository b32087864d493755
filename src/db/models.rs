// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Timestamp format used by the site and by the database.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date-only format (group creation dates).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Free-form author metadata (e.g. `name`, `url`).
///
/// Stored as a JSON object. A BTreeMap keeps the key order canonical so the
/// same author always encodes to the same text.
pub type AuthorInfo = BTreeMap<String, String>;

/// Current local wall-clock time, truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse a site-reported timestamp in [`DATETIME_FORMAT`].
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).ok()
}

/// Parse a timestamp, substituting the current time when it doesn't parse.
pub fn parse_datetime_or_now(text: &str) -> NaiveDateTime {
    parse_datetime(text).unwrap_or_else(now_local)
}

/// A forum group (board). Created once when first discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Site-assigned identifier (stable string, e.g. "abc123").
    pub id: String,
    pub name: String,
    pub url: String,
    pub member_count: i64,
    /// Site-reported creation date.
    pub created: NaiveDate,
    /// When we first saw this group.
    pub first_seen_at: NaiveDateTime,
}

/// A discussion thread inside a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    /// External identifier (globally unique).
    pub post_id: String,
    pub group_id: String,
    pub author: AuthorInfo,
    pub url: String,
    pub title: String,
    pub content: String,
    pub photos: Vec<String>,
    pub is_matched: bool,
    /// Which configured keywords matched, verbatim.
    pub keywords: Vec<String>,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub first_seen_at: NaiveDateTime,
}

/// A comment on a thread, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub comment_id: String,
    /// External identifier of the owning thread.
    pub post_id: String,
    pub group_id: String,
    pub author: AuthorInfo,
    pub content: String,
    pub reply_to_id: Option<String>,
    pub like_count: i64,
    pub created: NaiveDateTime,
    pub inserted_at: NaiveDateTime,
}

/// Row counts for the status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub groups: i64,
    pub threads: i64,
    pub matched_threads: i64,
    pub comments: i64,
}
