//! HTTP surface for Atrium.
//!
//! Combines the public page-metadata routes with the account API, which sits
//! behind HTTP Basic authentication against stored identities.

pub mod auth;
pub mod error;
pub mod pages;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use atrium_core::{follow::FollowPolicy, store::AccountStore};
use axum::{Router, middleware};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ATRIUM_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Whether an identity may follow itself.
  #[serde(default = "allow_self_follow_default")]
  pub allow_self_follow: bool,
}

fn allow_self_follow_default() -> bool { FollowPolicy::default().allow_self_follow }

impl ServerConfig {
  pub fn follow_policy(&self) -> FollowPolicy {
    FollowPolicy { allow_self_follow: self.allow_self_follow }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the auth middleware.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AccountStore + 'static,
{
  let api = atrium_api::api_router(
    Arc::clone(&state.store),
    state.config.follow_policy(),
  )
  .route_layer(middleware::from_fn_with_state(
    state.clone(),
    auth::require_identity::<S>,
  ));

  pages::router()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
