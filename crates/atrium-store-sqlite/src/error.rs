//! Error type for `atrium-store-sqlite`.

use atrium_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] atrium_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("an identity with email {0:?} already exists")]
  DuplicateEmail(String),

  #[error("{follower_id} already follows {followed_id}")]
  AlreadyFollowing {
    follower_id: uuid::Uuid,
    followed_id: uuid::Uuid,
  },

  /// A follow edge named an identity that does not exist.
  #[error("unknown identity in follow {follower_id} -> {followed_id}")]
  UnknownIdentity {
    follower_id: uuid::Uuid,
    followed_id: uuid::Uuid,
  },

  /// Every slug candidate was claimed by a concurrent writer.
  #[error("could not claim a slug for base {base:?} after {attempts} attempts")]
  SlugExhausted { base: String, attempts: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::DuplicateEmail(_)
      | Error::AlreadyFollowing { .. }
      | Error::SlugExhausted { .. } => ErrorKind::Constraint,
      Error::UnknownIdentity { .. } => ErrorKind::Reference,
      Error::Database(_) | Error::Uuid(_) | Error::DateParse(_) => {
        ErrorKind::Storage
      }
    }
  }
}
