//! Error types for `atrium-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("the email field must be set")]
  MissingEmail,

  #[error("{field} must be at most {max} characters")]
  NameTooLong { field: &'static str, max: usize },

  #[error("superuser must have {0}=true")]
  PrivilegeContradiction(&'static str),

  #[error("an identity cannot follow itself")]
  SelfFollow,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The caller-facing category of a failure. The request layer translates
/// these into responses; storage backends classify their own errors into the
/// same categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A missing or invalid input field. Not retried.
  Validation,
  /// A uniqueness rule was violated (duplicate email, duplicate follow, slug
  /// space exhausted).
  Constraint,
  /// A reference to an identity that does not exist.
  Reference,
  /// Anything else: I/O, decoding, hashing.
  Storage,
}

/// Implemented by every error that crosses the store boundary.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::MissingEmail
      | Error::NameTooLong { .. }
      | Error::PrivilegeContradiction(_)
      | Error::SelfFollow => ErrorKind::Validation,
      Error::PasswordHash(_) => ErrorKind::Storage,
    }
  }
}
