// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across an .await on anything else.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Comment, Group, StoreCounts, Thread};
use super::queries;
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory database with the schema applied. Used by tests and
    /// dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn.lock().await;
        queries::counts(&conn)
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>> {
        let conn = self.conn.lock().await;
        queries::get_group(&conn, id)
    }

    async fn create_group(&self, group: &Group) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::create_group(&conn, group)
    }

    async fn get_thread(&self, post_id: &str) -> Result<Option<Thread>> {
        let conn = self.conn.lock().await;
        queries::get_thread(&conn, post_id)
    }

    async fn create_thread(&self, thread: &Thread) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::create_thread(&conn, thread)
    }

    async fn update_thread(&self, thread: &Thread) -> Result<()> {
        let conn = self.conn.lock().await;
        queries::update_thread(&conn, thread)
    }

    async fn title_exists(&self, title: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::title_exists(&conn, title)
    }

    async fn list_threads_by_group(&self, group_id: &str, limit: u32) -> Result<Vec<Thread>> {
        let conn = self.conn.lock().await;
        queries::list_threads_by_group(&conn, group_id, limit)
    }

    async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>> {
        let conn = self.conn.lock().await;
        queries::get_comment(&conn, comment_id)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::create_comment(&conn, comment)
    }

    async fn list_comments_by_thread(&self, post_id: &str) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().await;
        queries::list_comments_by_thread(&conn, post_id)
    }

    async fn list_comments_by_group(&self, group_id: &str, limit: u32) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().await;
        queries::list_comments_by_group(&conn, group_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{parse_datetime, AuthorInfo};
    use chrono::NaiveDate;

    fn group() -> Group {
        Group {
            id: "abc123".to_string(),
            name: "Test group".to_string(),
            url: "https://www.douban.com/group/abc123/".to_string(),
            member_count: 5,
            created: NaiveDate::from_ymd_opt(2019, 1, 2).unwrap(),
            first_seen_at: parse_datetime("2024-01-01 00:00:00").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = SqliteDatabase::in_memory().unwrap();
        assert_eq!(db.table_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_trait_group_roundtrip() {
        let db = SqliteDatabase::in_memory().unwrap();
        assert!(db.get_group("abc123").await.unwrap().is_none());
        db.create_group(&group()).await.unwrap();
        assert_eq!(db.get_group("abc123").await.unwrap(), Some(group()));
    }

    #[tokio::test]
    async fn test_trait_create_group_twice_fails() {
        let db = SqliteDatabase::in_memory().unwrap();
        db.create_group(&group()).await.unwrap();
        assert!(db.create_group(&group()).await.is_err());
    }

    #[tokio::test]
    async fn test_trait_comment_requires_thread() {
        let db = SqliteDatabase::in_memory().unwrap();
        db.create_group(&group()).await.unwrap();
        let orphan = Comment {
            comment_id: "c1".to_string(),
            post_id: "no-such-thread".to_string(),
            group_id: "abc123".to_string(),
            author: AuthorInfo::new(),
            content: "hello there".to_string(),
            reply_to_id: None,
            like_count: 0,
            created: parse_datetime("2024-01-01 00:00:00").unwrap(),
            inserted_at: parse_datetime("2024-01-01 00:00:00").unwrap(),
        };
        assert!(db.create_comment(&orphan).await.is_err());
    }
}
