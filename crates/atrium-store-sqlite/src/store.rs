//! [`SqliteStore`], the SQLite implementation of [`AccountStore`].

use std::{collections::HashSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use atrium_core::{
  account::{Identity, NewIdentity, ProfileUpdate},
  credential,
  follow::Follow,
  slug,
  store::AccountStore,
};

use crate::{
  Error, Result,
  encode::{
    IDENTITY_COLUMNS, RawIdentity, WriteOutcome, encode_dt, encode_uuid,
    write_outcome,
  },
  schema::SCHEMA,
};

/// How many times [`SqliteStore::insert_identity`] re-probes for a free slug
/// after losing a race for one.
pub const MAX_SLUG_ATTEMPTS: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An account store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Probe for the first candidate of `base` that is neither stored nor in
  /// `rejected`, and insert `identity` under it. Probe and insert share one
  /// `IMMEDIATE` transaction, so writers on this connection never see each
  /// other's half-finished claims.
  async fn claim_slug(
    &self,
    mut identity: Identity,
    base: String,
    rejected: HashSet<String>,
  ) -> Result<(Identity, WriteOutcome)> {
    let claimed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut taken = taken_slugs(&tx, &base)?;
        taken.extend(rejected);
        identity.slug = slug::first_free(&base, &taken);

        let outcome = write_outcome(insert_row(&tx, &identity))?;
        if outcome == WriteOutcome::Written {
          tx.commit()?;
        }
        Ok((identity, outcome))
      })
      .await?;
    Ok(claimed)
  }

  /// Attempt to write a fully-built [`Identity`] as-is. Unique-constraint
  /// rejections are reported as an outcome rather than an error so the
  /// caller can tell a lost slug race from a duplicate email.
  pub(crate) async fn try_insert(&self, identity: &Identity) -> Result<WriteOutcome> {
    let identity = identity.clone();
    let outcome = self
      .conn
      .call(move |conn| Ok(write_outcome(insert_row(conn, &identity))?))
      .await?;
    Ok(outcome)
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `SELECT <identity columns> FROM identities WHERE <filter>`.
  async fn select_identities(
    &self,
    filter: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<Identity>> {
    let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE {filter}");

    let raws: Vec<RawIdentity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn select_identity(
    &self,
    filter: &'static str,
    param: String,
  ) -> Result<Option<Identity>> {
    Ok(self.select_identities(filter, vec![param]).await?.into_iter().next())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Every stored slug in the candidate sequence of `base`.
fn taken_slugs(
  conn: &rusqlite::Connection,
  base: &str,
) -> rusqlite::Result<HashSet<String>> {
  let mut stmt =
    conn.prepare("SELECT slug FROM identities WHERE slug = ?1 OR slug LIKE ?2")?;
  let slugs = stmt
    .query_map(rusqlite::params![base, format!("{base}-%")], |row| row.get(0))?
    .collect();
  slugs
}

fn insert_row(
  conn: &rusqlite::Connection,
  identity: &Identity,
) -> rusqlite::Result<usize> {
  conn.execute(
    "INSERT INTO identities (
       identity_id, email, first_name, last_name, slug, bio,
       profile_picture, password_hash, is_active, is_staff,
       is_superuser, date_joined, last_login
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      encode_uuid(identity.identity_id),
      identity.email,
      identity.first_name,
      identity.last_name,
      identity.slug,
      identity.bio,
      identity.profile_picture,
      identity.password_hash,
      identity.is_active,
      identity.is_staff,
      identity.is_superuser,
      encode_dt(identity.date_joined),
      identity.last_login.map(encode_dt),
    ],
  )
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn insert_identity(&self, input: NewIdentity) -> Result<Identity> {
    let base = input.base_slug();

    let mut identity = Identity {
      identity_id:     Uuid::new_v4(),
      email:           input.email,
      first_name:      input.first_name,
      last_name:       input.last_name,
      slug:            String::new(),
      bio:             input.bio,
      profile_picture: input.profile_picture,
      password_hash:   input.password_hash,
      is_active:       input.is_active,
      is_staff:        input.is_staff,
      is_superuser:    input.is_superuser,
      date_joined:     Utc::now(),
      last_login:      None,
    };

    // The unique constraint is the claim. It can only be lost to a writer
    // on another connection; the rejected candidate is skipped next round.
    let mut rejected = HashSet::new();
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
      let (claimed, outcome) =
        self.claim_slug(identity, base.clone(), rejected.clone()).await?;
      identity = claimed;

      match outcome {
        WriteOutcome::Written => {
          tracing::info!(
            identity_id = %identity.identity_id,
            slug = %identity.slug,
            "identity created"
          );
          return Ok(identity);
        }
        WriteOutcome::Unique(columns) if columns == "identities.email" => {
          return Err(Error::DuplicateEmail(identity.email));
        }
        outcome => {
          tracing::warn!(
            slug = %identity.slug,
            attempt,
            ?outcome,
            "slug claim rejected, retrying"
          );
          rejected.insert(identity.slug.clone());
        }
      }
    }

    Err(Error::SlugExhausted { base, attempts: MAX_SLUG_ATTEMPTS })
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    self.select_identity("identity_id = ?1", encode_uuid(id)).await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
    self.select_identity("email = ?1", email.to_owned()).await
  }

  async fn find_by_slug(&self, slug: &str) -> Result<Option<Identity>> {
    self.select_identity("slug = ?1", slug.to_owned()).await
  }

  async fn list_identities(&self) -> Result<Vec<Identity>> {
    self.select_identities("1 = 1", Vec::new()).await
  }

  async fn update_profile(
    &self,
    id:     Uuid,
    update: ProfileUpdate,
  ) -> Result<Option<Identity>> {
    update.validate()?;
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET
             first_name      = COALESCE(?2, first_name),
             last_name       = COALESCE(?3, last_name),
             bio             = COALESCE(?4, bio),
             profile_picture = COALESCE(?5, profile_picture)
           WHERE identity_id = ?1",
          rusqlite::params![
            id_str,
            update.first_name,
            update.last_name,
            update.bio,
            update.profile_picture,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_identity(id).await
  }

  async fn set_password(&self, id: Uuid, password: Option<&str>) -> Result<bool> {
    let hash   = credential::hash_password(password)?;
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET password_hash = ?2 WHERE identity_id = ?1",
          rusqlite::params![id_str, hash],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn record_login(&self, id: Uuid) -> Result<DateTime<Utc>> {
    let now    = Utc::now();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE identities SET last_login = ?2 WHERE identity_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(now)
  }

  async fn delete_identity(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM identities WHERE identity_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed > 0 {
      tracing::info!(identity_id = %id, "identity deleted");
    }
    Ok(changed > 0)
  }

  // ── Follow graph ──────────────────────────────────────────────────────────

  async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<Follow> {
    let follow = Follow { follower_id, followed_id, created_at: Utc::now() };

    let follower_str = encode_uuid(follower_id);
    let followed_str = encode_uuid(followed_id);
    let at_str       = encode_dt(follow.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO follows (follower_id, followed_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![follower_str, followed_str, at_str],
        );
        Ok(write_outcome(result)?)
      })
      .await?;

    match outcome {
      WriteOutcome::Written => {
        tracing::debug!(%follower_id, %followed_id, "follow created");
        Ok(follow)
      }
      WriteOutcome::Unique(_) => {
        Err(Error::AlreadyFollowing { follower_id, followed_id })
      }
      WriteOutcome::ForeignKey => {
        Err(Error::UnknownIdentity { follower_id, followed_id })
      }
    }
  }

  async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
    let follower_str = encode_uuid(follower_id);
    let followed_str = encode_uuid(followed_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
          rusqlite::params![follower_str, followed_str],
        )?)
      })
      .await?;

    if removed > 0 {
      tracing::debug!(%follower_id, %followed_id, "follow removed");
    }
    Ok(removed > 0)
  }

  async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
    let follower_str = encode_uuid(follower_id);
    let followed_str = encode_uuid(followed_id);

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            rusqlite::params![follower_str, followed_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(found)
  }

  async fn followers(&self, id: Uuid) -> Result<Vec<Identity>> {
    self
      .select_identities(
        "identity_id IN (SELECT follower_id FROM follows WHERE followed_id = ?1)",
        vec![encode_uuid(id)],
      )
      .await
  }

  async fn following(&self, id: Uuid) -> Result<Vec<Identity>> {
    self
      .select_identities(
        "identity_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)",
        vec![encode_uuid(id)],
      )
      .await
  }
}
