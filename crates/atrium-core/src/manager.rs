//! Account factories and credential checks over any [`AccountStore`].

use crate::{
  account::{ExtraFields, Identity, NewIdentity},
  credential,
  email::normalize_email,
  store::AccountStore,
};

/// Create and persist a regular account.
pub async fn create_user<S: AccountStore>(
  store: &S,
  email: &str,
  password: Option<&str>,
  extra: ExtraFields,
) -> Result<Identity, S::Error> {
  let input = NewIdentity::user(email, password, extra)?;
  store.insert_identity(input).await
}

/// Create and persist a staff superuser account.
pub async fn create_superuser<S: AccountStore>(
  store: &S,
  email: &str,
  password: Option<&str>,
  extra: ExtraFields,
) -> Result<Identity, S::Error> {
  let input = NewIdentity::superuser(email, password, extra)?;
  store.insert_identity(input).await
}

/// Resolve an email/password pair to an active identity and record the
/// login. Returns `None` for unknown emails, wrong or unusable passwords, and
/// inactive accounts.
pub async fn authenticate<S: AccountStore>(
  store: &S,
  email: &str,
  password: &str,
) -> Result<Option<Identity>, S::Error> {
  let email = normalize_email(email);
  let Some(mut identity) = store.find_by_email(&email).await? else {
    // Spend the same argon2 cost as a wrong password.
    credential::verify_dummy(password);
    return Ok(None);
  };

  if !identity.is_active
    || !credential::verify_password(password, &identity.password_hash)
  {
    return Ok(None);
  }

  identity.last_login = Some(store.record_login(identity.identity_id).await?);
  Ok(Some(identity))
}
