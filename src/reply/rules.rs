// Eligibility rules and reply cleanup.

use chrono::{Duration, NaiveDateTime};

use crate::db::models::Thread;
use crate::matching;
use crate::output::truncate_chars;

/// Threads with more comments than this are left alone.
pub const MAX_EXISTING_COMMENTS: usize = 20;

/// Threads created longer ago than this are left alone.
pub const MAX_THREAD_AGE_DAYS: i64 = 7;

/// Generated replies longer than this (in chars) are cut.
pub const MAX_REPLY_CHARS: usize = 500;

const QUOTE_CHARS: [char; 6] = ['"', '\'', '“', '”', '‘', '’'];

/// Why a thread is or isn't a reply candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotMatched,
    MissingReplyKeyword,
    TooManyComments,
    TooOld,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decide whether `thread` should get a drafted reply.
///
/// Rules run in order: the thread must be matched, must contain a reply
/// keyword when an allowlist is configured, must have at most
/// [`MAX_EXISTING_COMMENTS`] comments, and must be at most
/// [`MAX_THREAD_AGE_DAYS`] old.
pub fn check_eligibility(
    thread: &Thread,
    comment_count: usize,
    now: NaiveDateTime,
    reply_keywords: &[String],
) -> Eligibility {
    if !thread.is_matched {
        return Eligibility::NotMatched;
    }
    if !matching::contains_any(reply_keywords, &thread.title, &thread.content) {
        return Eligibility::MissingReplyKeyword;
    }
    if comment_count > MAX_EXISTING_COMMENTS {
        return Eligibility::TooManyComments;
    }
    if now - thread.created > Duration::days(MAX_THREAD_AGE_DAYS) {
        return Eligibility::TooOld;
    }
    Eligibility::Eligible
}

/// Tidy raw model output: trim whitespace, drop one layer of surrounding
/// quote characters, and cap the length.
pub fn clean_reply(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(QUOTE_CHARS) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(QUOTE_CHARS) {
        text = rest;
    }
    truncate_chars(text, MAX_REPLY_CHARS)
}
