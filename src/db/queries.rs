// Database queries: CRUD operations for groups, threads, and comments.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// Author metadata, photo lists, and keyword lists are JSON text in the
// database; they're encoded and decoded here and nowhere else.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{
    AuthorInfo, Comment, Group, StoreCounts, Thread, DATETIME_FORMAT, DATE_FORMAT,
};

fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Stored timestamps are written by us, but a hand-edited row shouldn't
/// make a whole listing query fail.
fn read_datetime(text: &str) -> NaiveDateTime {
    super::models::parse_datetime_or_now(text)
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(text: &str) -> T {
    serde_json::from_str(text).unwrap_or_default()
}

// --- Groups ---

/// Look up a group by its site-assigned ID.
pub fn get_group(conn: &Connection, id: &str) -> Result<Option<Group>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, url, member_count, created, first_seen_at FROM groups WHERE id = ?1",
    )?;
    let result = stmt
        .query_row(params![id], |row| {
            let created: String = row.get(4)?;
            let first_seen: String = row.get(5)?;
            Ok(Group {
                id: row.get(0)?,
                name: row.get(1)?,
                url: row.get(2)?,
                member_count: row.get(3)?,
                created: NaiveDate::parse_from_str(&created, DATE_FORMAT)
                    .unwrap_or_else(|_| read_datetime(&created).date()),
                first_seen_at: read_datetime(&first_seen),
            })
        })
        .optional()?;
    Ok(result)
}

/// Insert a newly discovered group.
pub fn create_group(conn: &Connection, group: &Group) -> Result<()> {
    conn.execute(
        "INSERT INTO groups (id, name, url, member_count, created, first_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            group.id,
            group.name,
            group.url,
            group.member_count,
            group.created.format(DATE_FORMAT).to_string(),
            fmt_datetime(&group.first_seen_at),
        ],
    )
    .with_context(|| format!("Failed to insert group {}", group.id))?;
    Ok(())
}

// --- Threads ---

const THREAD_COLUMNS: &str = "post_id, group_id, author_info, url, title, content, photo_list,
     is_matched, keyword_list, created, updated, first_seen_at";

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<Thread> {
    let author_json: String = row.get(2)?;
    let photos_json: String = row.get(6)?;
    let keywords_json: String = row.get(8)?;
    let created: String = row.get(9)?;
    let updated: String = row.get(10)?;
    let first_seen: String = row.get(11)?;
    Ok(Thread {
        post_id: row.get(0)?,
        group_id: row.get(1)?,
        author: decode_json::<AuthorInfo>(&author_json),
        url: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        photos: decode_json(&photos_json),
        is_matched: row.get(7)?,
        keywords: decode_json(&keywords_json),
        created: read_datetime(&created),
        updated: read_datetime(&updated),
        first_seen_at: read_datetime(&first_seen),
    })
}

/// Look up a thread by its external ID.
pub fn get_thread(conn: &Connection, post_id: &str) -> Result<Option<Thread>> {
    let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE post_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![post_id], thread_from_row).optional()?;
    Ok(result)
}

/// Insert a new thread.
pub fn create_thread(conn: &Connection, thread: &Thread) -> Result<()> {
    let author_json = serde_json::to_string(&thread.author)?;
    let photos_json = serde_json::to_string(&thread.photos)?;
    let keywords_json = serde_json::to_string(&thread.keywords)?;
    conn.execute(
        "INSERT INTO threads (post_id, group_id, author_info, url, title, content, photo_list,
                              is_matched, keyword_list, created, updated, first_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            thread.post_id,
            thread.group_id,
            author_json,
            thread.url,
            thread.title,
            thread.content,
            photos_json,
            thread.is_matched,
            keywords_json,
            fmt_datetime(&thread.created),
            fmt_datetime(&thread.updated),
            fmt_datetime(&thread.first_seen_at),
        ],
    )
    .with_context(|| format!("Failed to insert thread {}", thread.post_id))?;
    Ok(())
}

/// Refresh a thread on re-sight. Only the title and updated time change;
/// body, match flag, and keyword list are fixed at creation.
pub fn update_thread(conn: &Connection, thread: &Thread) -> Result<()> {
    conn.execute(
        "UPDATE threads SET title = ?1, updated = ?2 WHERE post_id = ?3",
        params![thread.title, fmt_datetime(&thread.updated), thread.post_id],
    )?;
    Ok(())
}

/// Whether any stored thread already has exactly this title.
pub fn title_exists(conn: &Connection, title: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM threads WHERE title = ?1)",
        params![title],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Most recent threads in a group, newest first.
pub fn list_threads_by_group(conn: &Connection, group_id: &str, limit: u32) -> Result<Vec<Thread>> {
    let sql = format!(
        "SELECT {THREAD_COLUMNS} FROM threads WHERE group_id = ?1
         ORDER BY created DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![group_id, limit], thread_from_row)?;

    let mut threads = Vec::new();
    for row in rows {
        threads.push(row?);
    }
    Ok(threads)
}

// --- Comments ---

const COMMENT_COLUMNS: &str =
    "comment_id, post_id, group_id, author_info, content, reply_to_id, like_count, created, inserted_at";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let author_json: String = row.get(3)?;
    let created: String = row.get(7)?;
    let inserted: String = row.get(8)?;
    Ok(Comment {
        comment_id: row.get(0)?,
        post_id: row.get(1)?,
        group_id: row.get(2)?,
        author: decode_json::<AuthorInfo>(&author_json),
        content: row.get(4)?,
        reply_to_id: row.get(5)?,
        like_count: row.get(6)?,
        created: read_datetime(&created),
        inserted_at: read_datetime(&inserted),
    })
}

/// Look up a comment by its external ID.
pub fn get_comment(conn: &Connection, comment_id: &str) -> Result<Option<Comment>> {
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![comment_id], comment_from_row).optional()?;
    Ok(result)
}

/// Insert a comment unless one with the same external ID already exists.
///
/// Returns true if a row was written.
pub fn create_comment(conn: &Connection, comment: &Comment) -> Result<bool> {
    let author_json = serde_json::to_string(&comment.author)?;
    let written = conn
        .execute(
            "INSERT OR IGNORE INTO comments (comment_id, post_id, group_id, author_info, content,
                                             reply_to_id, like_count, created, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                comment.comment_id,
                comment.post_id,
                comment.group_id,
                author_json,
                comment.content,
                comment.reply_to_id,
                comment.like_count,
                fmt_datetime(&comment.created),
                fmt_datetime(&comment.inserted_at),
            ],
        )
        .with_context(|| format!("Failed to insert comment {}", comment.comment_id))?;
    Ok(written > 0)
}

/// All comments on a thread, oldest first.
pub fn list_comments_by_thread(conn: &Connection, post_id: &str) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY created ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![post_id], comment_from_row)?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

/// Most recent comments across a group, newest first.
pub fn list_comments_by_group(
    conn: &Connection,
    group_id: &str,
    limit: u32,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE group_id = ?1
         ORDER BY created DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![group_id, limit], comment_from_row)?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

// --- Status ---

/// Row counts across all tables.
pub fn counts(conn: &Connection) -> Result<StoreCounts> {
    let counts = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM groups),
            (SELECT COUNT(*) FROM threads),
            (SELECT COUNT(*) FROM threads WHERE is_matched = 1),
            (SELECT COUNT(*) FROM comments)",
        [],
        |row| {
            Ok(StoreCounts {
                groups: row.get(0)?,
                threads: row.get(1)?,
                matched_threads: row.get(2)?,
                comments: row.get(3)?,
            })
        },
    )?;
    Ok(counts)
}
