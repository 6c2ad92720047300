//! Password hashing and verification.
//!
//! Hashes are argon2 PHC strings (`$argon2id$v=19$…`). An identity created
//! without a password stores an *unusable* marker instead, which no password
//! ever verifies against.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use once_cell::sync::Lazy;
use rand_core::OsRng;

use crate::{Error, Result};

/// Prefix marking a stored credential that can never verify. PHC strings
/// always start with `$`, so the two cannot collide.
const UNUSABLE_PREFIX: char = '!';

/// Hash `password` with a fresh random salt, or produce an unusable marker
/// when there is no password.
pub fn hash_password(password: Option<&str>) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  match password {
    Some(password) => Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::PasswordHash(e.to_string())),
    None => Ok(format!("{UNUSABLE_PREFIX}{}", salt.as_str())),
  }
}

/// Whether `hash` is a real credential rather than the unusable marker.
pub fn is_usable(hash: &str) -> bool { !hash.starts_with(UNUSABLE_PREFIX) }

/// Check `password` against a stored hash. Malformed and unusable hashes
/// never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
  if !is_usable(hash) {
    return false;
  }
  PasswordHash::new(hash)
    .and_then(|parsed| {
      Argon2::default().verify_password(password.as_bytes(), &parsed)
    })
    .is_ok()
}

/// A real argon2 hash of a random secret, for checks that must cost the same
/// whether or not an account exists.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
  let secret = SaltString::generate(&mut OsRng);
  hash_password(Some(secret.as_str())).unwrap_or_default()
});

/// Run a full verification against [`DUMMY_HASH`] and report failure. Used
/// when the account being logged into does not exist.
pub fn verify_dummy(password: &str) -> bool {
  verify_password(password, &DUMMY_HASH);
  false
}
