// Database schema: table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent; safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Groups are written once on discovery and never re-synced
        CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            member_count INTEGER NOT NULL DEFAULT 0,
            created TEXT NOT NULL,             -- site-reported, YYYY-MM-DD
            first_seen_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS threads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id TEXT NOT NULL UNIQUE,      -- external thread ID
            group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            author_info TEXT NOT NULL DEFAULT '{}',
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            photo_list TEXT NOT NULL DEFAULT '[]',
            is_matched INTEGER NOT NULL DEFAULT 0,
            keyword_list TEXT NOT NULL DEFAULT '[]',
            created TEXT NOT NULL,
            updated TEXT NOT NULL,
            first_seen_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id TEXT NOT NULL UNIQUE,   -- external comment ID
            post_id TEXT NOT NULL REFERENCES threads(post_id) ON DELETE CASCADE,
            group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            author_info TEXT NOT NULL DEFAULT '{}',
            content TEXT NOT NULL,
            reply_to_id TEXT,
            like_count INTEGER NOT NULL DEFAULT 0,
            created TEXT NOT NULL,
            inserted_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_threads_group_created
            ON threads(group_id, created);

        CREATE INDEX IF NOT EXISTS idx_threads_title
            ON threads(title);

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id);

        CREATE INDEX IF NOT EXISTS idx_comments_group_created
            ON comments(group_id, created);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: the status counts filter on the matched flag.
    run_migration(conn, 2, |c| {
        c.execute_batch("CREATE INDEX IF NOT EXISTS idx_threads_matched ON threads(is_matched);")
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO groups (id, name, url, member_count, created, first_seen_at)
                VALUES ('g1', 'Group', 'https://example.com/group/g1/', 10, '2020-01-01', '2024-01-01 00:00:00');
             INSERT INTO threads (post_id, group_id, url, title, content, created, updated, first_seen_at)
                VALUES ('t1', 'g1', 'u', 'title', 'body', '2024-01-01 00:00:00', '2024-01-01 00:00:00', '2024-01-01 00:00:00');
             INSERT INTO comments (comment_id, post_id, group_id, content, created, inserted_at)
                VALUES ('c1', 't1', 'g1', 'hello', '2024-01-01 00:00:00', '2024-01-01 00:00:00');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, groups, threads, comments (+ sqlite_sequence is excluded)
        assert_eq!(table_count(&conn).unwrap(), 4);
    }

    #[test]
    fn test_migrations_recorded_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
        let versions: Vec<i64> = conn
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[test]
    fn test_matched_counts_use_matched_index() {
        let conn = seeded();
        let plan: String = conn
            .query_row(
                "EXPLAIN QUERY PLAN SELECT COUNT(*) FROM threads WHERE is_matched = 1",
                [],
                |row| row.get(3),
            )
            .unwrap();
        assert!(plan.contains("idx_threads_matched"), "plan: {plan}");
    }

    #[test]
    fn test_deleting_thread_cascades_to_comments() {
        let conn = seeded();
        conn.execute("DELETE FROM threads WHERE post_id = 't1'", [])
            .unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_deleting_group_cascades_to_threads() {
        let conn = seeded();
        conn.execute("DELETE FROM groups WHERE id = 'g1'", []).unwrap();
        let threads: i64 = conn
            .query_row("SELECT COUNT(*) FROM threads", [], |row| row.get(0))
            .unwrap();
        assert_eq!(threads, 0);
    }

    #[test]
    fn test_duplicate_post_id_rejected() {
        let conn = seeded();
        let result = conn.execute(
            "INSERT INTO threads (post_id, group_id, url, title, content, created, updated, first_seen_at)
             VALUES ('t1', 'g1', 'u', 'other', 'body', '2024-01-01 00:00:00', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
