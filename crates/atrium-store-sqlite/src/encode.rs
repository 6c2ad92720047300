//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Flags are stored as integers.

use atrium_core::account::Identity;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawIdentity::from_row`].
pub const IDENTITY_COLUMNS: &str = "identity_id, email, first_name, last_name, \
   slug, bio, profile_picture, password_hash, is_active, is_staff, \
   is_superuser, date_joined, last_login";

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:     String,
  pub email:           String,
  pub first_name:      String,
  pub last_name:       String,
  pub slug:            String,
  pub bio:             Option<String>,
  pub profile_picture: Option<String>,
  pub password_hash:   String,
  pub is_active:       bool,
  pub is_staff:        bool,
  pub is_superuser:    bool,
  pub date_joined:     String,
  pub last_login:      Option<String>,
}

impl RawIdentity {
  /// Read a row selected with [`IDENTITY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:     row.get(0)?,
      email:           row.get(1)?,
      first_name:      row.get(2)?,
      last_name:       row.get(3)?,
      slug:            row.get(4)?,
      bio:             row.get(5)?,
      profile_picture: row.get(6)?,
      password_hash:   row.get(7)?,
      is_active:       row.get(8)?,
      is_staff:        row.get(9)?,
      is_superuser:    row.get(10)?,
      date_joined:     row.get(11)?,
      last_login:      row.get(12)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:     decode_uuid(&self.identity_id)?,
      email:           self.email,
      first_name:      self.first_name,
      last_name:       self.last_name,
      slug:            self.slug,
      bio:             self.bio,
      profile_picture: self.profile_picture,
      password_hash:   self.password_hash,
      is_active:       self.is_active,
      is_staff:        self.is_staff,
      is_superuser:    self.is_superuser,
      date_joined:     decode_dt(&self.date_joined)?,
      last_login:      self.last_login.as_deref().map(decode_dt).transpose()?,
    })
  }
}

// ─── Constraint outcomes ─────────────────────────────────────────────────────

/// How a write fared against the schema's constraints.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
  Written,
  /// A `UNIQUE` constraint failed; carries the `table.column` list SQLite
  /// reports, e.g. `identities.slug`.
  Unique(String),
  ForeignKey,
}

/// Turn constraint failures into a [`WriteOutcome`]; every other error is
/// passed through.
pub fn write_outcome(
  result: rusqlite::Result<usize>,
) -> rusqlite::Result<WriteOutcome> {
  match result {
    Ok(_) => Ok(WriteOutcome::Written),
    Err(rusqlite::Error::SqliteFailure(e, msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      let columns = msg
        .as_deref()
        .and_then(|m| m.strip_prefix("UNIQUE constraint failed: "))
        .unwrap_or_default()
        .to_owned();
      Ok(WriteOutcome::Unique(columns))
    }
    Err(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
    {
      Ok(WriteOutcome::ForeignKey)
    }
    Err(e) => Err(e),
  }
}
