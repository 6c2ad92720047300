//! Handlers for the follow graph.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/follows` | Body: [`EdgeBody`]; 201, 409 if already following |
//! | `DELETE` | `/follows` | Body: [`EdgeBody`]; `{"removed": bool}` |
//! | `GET`    | `/identities/:id/followers` | |
//! | `GET`    | `/identities/:id/following` | |
//!
//! The follower defaults to the caller. Naming another follower requires
//! staff privileges.

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atrium_core::{account::Identity, store::AccountStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// An ordered pair naming one follow edge.
#[derive(Debug, Deserialize)]
pub struct EdgeBody {
  pub follower_id: Option<Uuid>,
  pub followed_id: Uuid,
}

impl EdgeBody {
  /// The `(follower, followed)` pair `caller` is allowed to touch.
  fn edge_for(&self, caller: &Identity) -> Result<(Uuid, Uuid), ApiError> {
    let follower_id = self.follower_id.unwrap_or(caller.identity_id);
    if !caller.may_act_for(follower_id) {
      return Err(ApiError::Forbidden(format!(
        "cannot change follows of identity {follower_id}"
      )));
    }
    Ok((follower_id, self.followed_id))
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Removed {
  pub removed: bool,
}

/// `POST /follows` returns 201 and the stored edge.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Extension(caller): Extension<Identity>,
  Json(body): Json<EdgeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let (follower_id, followed_id) = body.edge_for(&caller)?;
  state
    .policy
    .check(follower_id, followed_id)
    .map_err(ApiError::from_store)?;

  let follow = state
    .store
    .follow(follower_id, followed_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(follow)))
}

/// `DELETE /follows`: removing an absent edge is not an error.
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  Extension(caller): Extension<Identity>,
  Json(body): Json<EdgeBody>,
) -> Result<Json<Removed>, ApiError>
where
  S: AccountStore,
{
  let (follower_id, followed_id) = body.edge_for(&caller)?;
  let removed = state
    .store
    .unfollow(follower_id, followed_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}

/// `GET /identities/:id/followers`
pub async fn followers<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Identity>>, ApiError>
where
  S: AccountStore,
{
  let identities = state
    .store
    .followers(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identities))
}

/// `GET /identities/:id/following`
pub async fn following<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Identity>>, ApiError>
where
  S: AccountStore,
{
  let identities = state
    .store
    .following(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identities))
}
