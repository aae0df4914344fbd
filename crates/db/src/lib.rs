//! Domain models and the document-store boundary.
//!
//! The persistent backend is an external collaborator reachable by id; the
//! [`store`] traits are that boundary and [`memory::MemoryStore`] is the
//! process-local backend used for local runs and tests.

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryStore;
pub use models::{Book, User};
pub use store::{BookStore, UserStore};
