//! Core types and trait definitions for Atrium accounts.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend implements [`store::AccountStore`]; the request layer calls
//! the operations in [`manager`] and the trait directly.

pub mod account;
pub mod credential;
pub mod email;
pub mod error;
pub mod follow;
pub mod manager;
pub mod slug;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
