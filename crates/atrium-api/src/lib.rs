//! JSON REST API for Atrium accounts.
//!
//! Exposes an axum [`Router`] backed by any [`atrium_core::store::AccountStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility. Handlers authorise against the caller's
//! [`Identity`](atrium_core::account::Identity), which must be present in
//! the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let api = atrium_api::api_router(store.clone(), FollowPolicy::default())
//!   .route_layer(middleware::from_fn_with_state(state, require_identity));
//! router.nest("/api", api)
//! ```

pub mod error;
pub mod follows;
pub mod identities;

use std::sync::Arc;

use atrium_core::{follow::FollowPolicy, store::AccountStore};
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// State shared by every API handler.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub policy: FollowPolicy,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), policy: self.policy }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, policy: FollowPolicy) -> Router<()>
where
  S: AccountStore + 'static,
{
  Router::new()
    // Identities
    .route("/identities", get(identities::list::<S>).post(identities::create::<S>))
    .route(
      "/identities/{id}",
      get(identities::get_one::<S>)
        .patch(identities::update::<S>)
        .delete(identities::delete::<S>),
    )
    .route("/slugs/{slug}", get(identities::by_slug::<S>))
    // Follow graph
    .route("/follows", post(follows::create::<S>).delete(follows::delete::<S>))
    .route("/identities/{id}/followers", get(follows::followers::<S>))
    .route("/identities/{id}/following", get(follows::following::<S>))
    .with_state(ApiState { store, policy })
}
