//! Identity: a user account keyed by normalised email.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, credential, email::normalize_email, slug};

/// Maximum length, in characters, of `first_name` and `last_name`.
pub const NAME_MAX_LEN: usize = 30;

// ─── Identity ────────────────────────────────────────────────────────────────

/// A persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:     Uuid,
  /// Normalised; unique across identities. The login identifier.
  pub email:           String,
  pub first_name:      String,
  pub last_name:       String,
  /// Assigned once at first save and never recomputed.
  pub slug:            String,
  pub bio:             Option<String>,
  /// Path relative to the configured media directory.
  pub profile_picture: Option<String>,
  #[serde(skip_serializing, default)]
  pub password_hash:   String,
  pub is_active:       bool,
  pub is_staff:        bool,
  pub is_superuser:    bool,
  pub date_joined:     DateTime<Utc>,
  pub last_login:      Option<DateTime<Utc>>,
}

impl Identity {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  pub fn short_name(&self) -> &str { &self.first_name }

  pub fn has_usable_password(&self) -> bool {
    credential::is_usable(&self.password_hash)
  }

  /// Staff and superusers may manage any account.
  pub fn is_privileged(&self) -> bool { self.is_staff || self.is_superuser }

  /// Whether this identity may modify the account `target` or act as it in
  /// the follow graph.
  pub fn may_act_for(&self, target: Uuid) -> bool {
    self.identity_id == target || self.is_privileged()
  }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.first_name, self.last_name)
  }
}

// ─── ExtraFields ─────────────────────────────────────────────────────────────

/// Optional fields accepted alongside email and password when creating an
/// identity. Flags left as `None` take the defaults of the chosen factory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtraFields {
  pub first_name:      String,
  pub last_name:       String,
  pub bio:             Option<String>,
  pub profile_picture: Option<String>,
  pub is_active:       Option<bool>,
  pub is_staff:        Option<bool>,
  pub is_superuser:    Option<bool>,
}

// ─── NewIdentity ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::AccountStore::insert_identity`]: a validated,
/// normalised identity whose password is already hashed. The id, slug and
/// `date_joined` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub email:           String,
  pub first_name:      String,
  pub last_name:       String,
  pub bio:             Option<String>,
  pub profile_picture: Option<String>,
  pub password_hash:   String,
  pub is_active:       bool,
  pub is_staff:        bool,
  pub is_superuser:    bool,
}

impl NewIdentity {
  /// Build a regular account. Fails on an empty email or over-long names.
  pub fn user(
    email: &str,
    password: Option<&str>,
    extra: ExtraFields,
  ) -> Result<Self> {
    if email.is_empty() {
      return Err(Error::MissingEmail);
    }
    check_name("first_name", &extra.first_name)?;
    check_name("last_name", &extra.last_name)?;

    Ok(Self {
      email:           normalize_email(email),
      first_name:      extra.first_name,
      last_name:       extra.last_name,
      bio:             extra.bio,
      profile_picture: extra.profile_picture,
      password_hash:   credential::hash_password(password)?,
      is_active:       extra.is_active.unwrap_or(true),
      is_staff:        extra.is_staff.unwrap_or(false),
      is_superuser:    extra.is_superuser.unwrap_or(false),
    })
  }

  /// Build a privileged account. Staff, superuser and active default to
  /// `true`; an explicit `false` for staff or superuser is rejected.
  pub fn superuser(
    email: &str,
    password: Option<&str>,
    mut extra: ExtraFields,
  ) -> Result<Self> {
    let is_staff = *extra.is_staff.get_or_insert(true);
    let is_superuser = *extra.is_superuser.get_or_insert(true);
    extra.is_active.get_or_insert(true);

    if !is_staff {
      return Err(Error::PrivilegeContradiction("is_staff"));
    }
    if !is_superuser {
      return Err(Error::PrivilegeContradiction("is_superuser"));
    }

    Self::user(email, password, extra)
  }

  /// The slug base this identity will claim on insertion.
  pub fn base_slug(&self) -> String {
    slug::base_slug(&self.email, &self.first_name, &self.last_name)
  }
}

// ─── ProfileUpdate ───────────────────────────────────────────────────────────

/// A partial update of profile fields. `None` leaves a field unchanged. The
/// slug is deliberately absent: it never changes after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub bio:             Option<String>,
  pub profile_picture: Option<String>,
}

impl ProfileUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(first) = &self.first_name {
      check_name("first_name", first)?;
    }
    if let Some(last) = &self.last_name {
      check_name("last_name", last)?;
    }
    Ok(())
  }
}

fn check_name(field: &'static str, value: &str) -> Result<()> {
  if value.chars().count() > NAME_MAX_LEN {
    return Err(Error::NameTooLong { field, max: NAME_MAX_LEN });
  }
  Ok(())
}
