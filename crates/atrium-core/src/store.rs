//! The `AccountStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `atrium-store-sqlite`).
//! Higher layers (`atrium-api`, `atrium-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Classify,
  account::{Identity, NewIdentity, ProfileUpdate},
  follow::Follow,
};

/// Abstraction over an Atrium account store backend.
///
/// Uniqueness (email, slug, follow pair) and cascading deletes are the
/// backend's responsibility and must be enforced by the storage itself, not
/// by a read-then-write check.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error
    + Classify
    + From<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Persist a new identity, assigning its id, `date_joined` and a unique
  /// slug derived from [`NewIdentity::base_slug`].
  ///
  /// Fails if the email is taken, or if no free slug could be claimed within
  /// the backend's retry budget.
  fn insert_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Retrieve an identity by id. Returns `None` if not found.
  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Look up an identity by its (already normalised) email.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  fn find_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Apply a profile update. The slug is left untouched. Returns `None` if
  /// the identity does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Replace the stored credential. `None` makes the password unusable.
  /// Returns whether the identity exists.
  fn set_password<'a>(
    &'a self,
    id: Uuid,
    password: Option<&'a str>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Stamp `last_login` with the current time and return it.
  fn record_login(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<DateTime<Utc>, Self::Error>> + Send + '_;

  /// Delete an identity and every follow edge that references it. Returns
  /// whether anything was deleted.
  fn delete_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Follow graph ──────────────────────────────────────────────────────

  /// Create the edge `follower_id → followed_id`.
  ///
  /// Fails if the edge already exists or either id does not resolve.
  fn follow(
    &self,
    follower_id: Uuid,
    followed_id: Uuid,
  ) -> impl Future<Output = Result<Follow, Self::Error>> + Send + '_;

  /// Remove the edge if present. Returns whether a removal occurred.
  fn unfollow(
    &self,
    follower_id: Uuid,
    followed_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_following(
    &self,
    follower_id: Uuid,
    followed_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Identities following `id`. Order is unspecified.
  fn followers(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Identities that `id` follows. Order is unspecified.
  fn following(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;
}
