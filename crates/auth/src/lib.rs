//! Credential handling and the request authorization gate.
//!
//! Split into focused submodules:
//! - [`password`] — bcrypt hashing and verification
//! - [`token`] — signed, time-limited identity tokens
//! - [`extract`] — the `Authorization: Bearer` extractor resolving a live user
//! - [`ownership`] — the single-owner mutation predicate

pub mod extract;
pub mod ownership;
pub mod password;
pub mod token;

pub use extract::{AuthState, CurrentUser};
pub use token::{Claims, TokenError, TokenIssuer};
