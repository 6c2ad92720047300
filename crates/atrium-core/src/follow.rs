//! Follow: a directed edge between two identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Records that `follower_id` follows `followed_id`. At most one edge exists
/// per ordered pair; edges are removed when either identity is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
  pub follower_id: Uuid,
  pub followed_id: Uuid,
  /// Server-assigned; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

/// Product rules applied before an edge is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowPolicy {
  pub allow_self_follow: bool,
}

impl Default for FollowPolicy {
  fn default() -> Self { Self { allow_self_follow: true } }
}

impl FollowPolicy {
  pub fn check(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
    if !self.allow_self_follow && follower_id == followed_id {
      return Err(Error::SelfFollow);
    }
    Ok(())
  }
}
