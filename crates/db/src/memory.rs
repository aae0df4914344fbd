use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{Book, User};
use crate::store::{BookStore, UserStore};

/// In-memory document store.
///
/// Backs local runs and the test suite. Locks are never held across an await
/// point; every method takes the lock, finishes, and releases before
/// returning.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    books: RwLock<HashMap<Uuid, Book>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_books<F>(&self, filter: F) -> Vec<Book>
    where
        F: Fn(&Book) -> bool,
    {
        let books = self.books.read();
        let mut matched: Vec<Book> = books.values().filter(|b| filter(b)).cloned().collect();
        // Newest first; id (time-ordered v7) breaks created_at ties.
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> anyhow::Result<()> {
        self.users.write().insert(user.id, user);
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert_book(&self, book: Book) -> anyhow::Result<()> {
        self.books.write().insert(book.id, book);
        Ok(())
    }

    async fn book_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>> {
        Ok(self.books.read().get(&id).cloned())
    }

    async fn update_book(&self, book: Book) -> anyhow::Result<()> {
        self.books.write().insert(book.id, book);
        Ok(())
    }

    async fn remove_book(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.books.write().remove(&id).is_some())
    }

    async fn list_books(&self, skip: u64, limit: u64) -> anyhow::Result<(Vec<Book>, u64)> {
        let all = self.sorted_books(|_| true);
        let total = all.len() as u64;
        let page = all
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn books_by_owner(&self, owner: Uuid, limit: u64) -> anyhow::Result<Vec<Book>> {
        Ok(self
            .sorted_books(|b| b.owner_id == owner)
            .into_iter()
            .take(limit as usize)
            .collect())
    }
}
