//! HTTP Basic-auth gate for the account API.
//!
//! Credentials are an identity's email and password, checked through
//! [`manager::authenticate`]. The authenticated [`Identity`] is placed in the
//! request extensions for downstream handlers.

use atrium_core::{account::Identity, manager, store::AccountStore};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::{AppState, error::Error};

/// Split a `Basic` authorization header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Resolve the request's credentials to an active identity.
pub async fn verify_auth<S: AccountStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Identity, Error> {
  let (email, password) = basic_credentials(headers)?;

  manager::authenticate(store, &email, &password)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::Unauthorized)
}

/// Middleware rejecting requests without valid credentials.
pub async fn require_identity<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: AccountStore + 'static,
{
  let identity = verify_auth(req.headers(), state.store.as_ref()).await?;
  tracing::debug!(identity_id = %identity.identity_id, "request authenticated");
  req.extensions_mut().insert(identity);
  Ok(next.run(req).await)
}
