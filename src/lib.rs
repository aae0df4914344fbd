//! bookworm application library
//!
//! Feature modules (auth, books, uploads) and the shared application state.

pub mod modules;
pub mod state;

pub use state::AppState;
