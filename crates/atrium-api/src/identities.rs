//! Handlers for `/identities` and `/slugs` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/identities` | All identities |
//! | `POST`   | `/identities` | Body: [`CreateBody`]; returns 201; staff only |
//! | `GET`    | `/identities/:id` | 404 if not found |
//! | `PATCH`  | `/identities/:id` | Body: [`ProfileUpdate`]; slug never changes; self or staff |
//! | `DELETE` | `/identities/:id` | 204; follow edges are removed with it; self or staff |
//! | `GET`    | `/slugs/:slug` | Lookup by profile slug |

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atrium_core::{
  account::{ExtraFields, Identity, ProfileUpdate},
  manager,
  store::AccountStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /identities`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Identity>>, ApiError>
where
  S: AccountStore,
{
  let identities = state
    .store
    .list_identities()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(identities))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /identities`. Privilege flags are not
/// accepted here; superusers are created from the command line.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub email:           String,
  pub password:        Option<String>,
  #[serde(default)]
  pub first_name:      String,
  #[serde(default)]
  pub last_name:       String,
  pub bio:             Option<String>,
  pub profile_picture: Option<String>,
}

/// `POST /identities` returns 201 and the stored [`Identity`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Extension(caller): Extension<Identity>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  if !caller.is_privileged() {
    return Err(ApiError::Forbidden("only staff may create identities".into()));
  }

  let extra = ExtraFields {
    first_name: body.first_name,
    last_name: body.last_name,
    bio: body.bio,
    profile_picture: body.profile_picture,
    ..Default::default()
  };
  let identity = manager::create_user(
    state.store.as_ref(),
    &body.email,
    body.password.as_deref(),
    extra,
  )
  .await
  .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(identity)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /identities/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  let identity = state
    .store
    .get_identity(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("identity {id} not found")))?;
  Ok(Json(identity))
}

/// `GET /slugs/:slug`
pub async fn by_slug<S>(
  State(state): State<ApiState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  let identity = state
    .store
    .find_by_slug(&slug)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no identity with slug {slug:?}")))?;
  Ok(Json(identity))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /identities/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Extension(caller): Extension<Identity>,
  Path(id): Path<Uuid>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Identity>, ApiError>
where
  S: AccountStore,
{
  authorize(&caller, id)?;
  let identity = state
    .store
    .update_profile(id, body)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("identity {id} not found")))?;
  Ok(Json(identity))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /identities/:id`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  Extension(caller): Extension<Identity>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: AccountStore,
{
  authorize(&caller, id)?;
  let deleted = state
    .store
    .delete_identity(id)
    .await
    .map_err(ApiError::from_store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("identity {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

fn authorize(caller: &Identity, id: Uuid) -> Result<(), ApiError> {
  if caller.may_act_for(id) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!("cannot modify identity {id}")))
  }
}
