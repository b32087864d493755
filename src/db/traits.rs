// Database trait: backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). The methods are async so a
// sync backend behind a Mutex and a native async backend fit the same
// interface; the ingestion and reply pipelines only ever see
// `Arc<dyn Database>`.
//
// The store is single-writer: one ingestor per database file. The unique
// keys on external thread and comment IDs are the only concurrency backstop.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Comment, Group, StoreCounts, Thread};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Row counts for the status display.
    async fn counts(&self) -> Result<StoreCounts>;

    // --- Groups ---

    async fn get_group(&self, id: &str) -> Result<Option<Group>>;

    async fn create_group(&self, group: &Group) -> Result<()>;

    // --- Threads ---

    /// Look up a thread by its external ID.
    async fn get_thread(&self, post_id: &str) -> Result<Option<Thread>>;

    async fn create_thread(&self, thread: &Thread) -> Result<()>;

    /// Persist a re-sighted thread's title and updated time (nothing else).
    async fn update_thread(&self, thread: &Thread) -> Result<()>;

    /// Whether any stored thread already has exactly this title.
    async fn title_exists(&self, title: &str) -> Result<bool>;

    /// Most recent threads in a group, newest first.
    async fn list_threads_by_group(&self, group_id: &str, limit: u32) -> Result<Vec<Thread>>;

    // --- Comments ---

    async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>>;

    /// Insert a comment; a no-op returning false if the ID already exists.
    async fn create_comment(&self, comment: &Comment) -> Result<bool>;

    /// All comments on a thread, oldest first.
    async fn list_comments_by_thread(&self, post_id: &str) -> Result<Vec<Comment>>;

    /// Most recent comments across a group, newest first.
    async fn list_comments_by_group(&self, group_id: &str, limit: u32) -> Result<Vec<Comment>>;
}
