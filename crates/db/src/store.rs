use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Book, User};

/// User persistence boundary.
///
/// Email and username uniqueness is enforced by the caller as a
/// read-then-write pre-check, not by the store; the race window between the
/// lookup and the insert is an accepted property of the design.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> anyhow::Result<()>;
    async fn user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
}

/// Book persistence boundary.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert_book(&self, book: Book) -> anyhow::Result<()>;
    async fn book_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>>;

    /// Replace the stored record with the same id.
    async fn update_book(&self, book: Book) -> anyhow::Result<()>;

    /// Remove a record; returns whether it existed.
    async fn remove_book(&self, id: Uuid) -> anyhow::Result<bool>;

    /// One page of records ordered by creation time descending, plus the
    /// total record count.
    async fn list_books(&self, skip: u64, limit: u64) -> anyhow::Result<(Vec<Book>, u64)>;

    /// Records owned by `owner`, newest first, capped at `limit`.
    async fn books_by_owner(&self, owner: Uuid, limit: u64) -> anyhow::Result<Vec<Book>>;
}
