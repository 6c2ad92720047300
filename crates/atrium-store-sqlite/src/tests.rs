//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use atrium_core::{
  Classify, ErrorKind,
  account::{ExtraFields, ProfileUpdate},
  credential, manager,
  slug::{candidate, is_valid_slug},
  store::AccountStore,
};
use uuid::Uuid;

use crate::{Error, MAX_SLUG_ATTEMPTS, SqliteStore, encode::WriteOutcome};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn named(first: &str, last: &str) -> ExtraFields {
  ExtraFields {
    first_name: first.into(),
    last_name: last.into(),
    ..Default::default()
  }
}

async fn user(s: &SqliteStore, email: &str) -> atrium_core::account::Identity {
  manager::create_user(s, email, Some("password"), ExtraFields::default())
    .await
    .unwrap()
}

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_normalises_email_and_hashes_password() {
  let s = store().await;

  let identity = manager::create_user(
    &s,
    "Jane.Doe@Example.COM",
    Some("correct horse"),
    named("Jane", "Doe"),
  )
  .await
  .unwrap();

  assert_eq!(identity.email, "Jane.Doe@example.com");
  assert_ne!(identity.password_hash, "correct horse");
  assert!(credential::verify_password("correct horse", &identity.password_hash));
  assert!(identity.is_active);
  assert!(!identity.is_staff);

  let fetched = s.get_identity(identity.identity_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "Jane.Doe@example.com");
  assert_eq!(fetched.password_hash, identity.password_hash);
  assert_eq!(fetched.slug, identity.slug);
}

#[tokio::test]
async fn create_user_with_empty_email_is_a_validation_error() {
  let s = store().await;
  let err = manager::create_user(&s, "", Some("pw"), ExtraFields::default())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Core(atrium_core::Error::MissingEmail)));
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(s.list_identities().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_email_is_a_constraint_violation() {
  let s = store().await;
  user(&s, "sam@example.com").await;

  // The domain is case-folded, so this collides.
  let err = manager::create_user(&s, "sam@EXAMPLE.com", None, ExtraFields::default())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::DuplicateEmail(ref e) if e == "sam@example.com"));
  assert_eq!(err.kind(), ErrorKind::Constraint);
}

#[tokio::test]
async fn create_superuser_sets_privileges() {
  let s = store().await;
  let root = manager::create_superuser(&s, "root@example.com", Some("pw"), named("Root", "Admin"))
    .await
    .unwrap();
  assert!(root.is_staff && root.is_superuser && root.is_active);

  let extra = ExtraFields { is_superuser: Some(false), ..Default::default() };
  let err = manager::create_superuser(&s, "other@example.com", Some("pw"), extra)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(s.find_by_email("other@example.com").await.unwrap().is_none());
}

// ─── Slugs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn name_slug_preferred_over_email() {
  let s = store().await;
  let jane = manager::create_user(&s, "jane123@example.com", None, named("Jane", "Doe"))
    .await
    .unwrap();
  assert_eq!(jane.slug, "jane-doe");
}

#[tokio::test]
async fn colliding_bases_get_numeric_suffixes() {
  let s = store().await;
  let first  = user(&s, "alex@example.com").await;
  let second = user(&s, "alex@example.org").await;
  let third  = user(&s, "Alex@example.net").await;

  assert_eq!(first.slug, "alex");
  assert_eq!(second.slug, "alex-1");
  assert_eq!(third.slug, "alex-2");
}

#[tokio::test]
async fn suffix_probe_fills_gaps() {
  let s = store().await;
  user(&s, "alex@a.com").await;
  let one = user(&s, "alex@b.com").await;
  user(&s, "alex@c.com").await;
  assert!(s.delete_identity(one.identity_id).await.unwrap());

  let again = user(&s, "alex@d.com").await;
  assert_eq!(again.slug, "alex-1");
}

#[tokio::test]
async fn slugs_are_valid_and_unique() {
  let s = store().await;
  let inputs = [
    ("jane123@example.com", "Jane", "Doe"),
    ("jane.doe@example.org", "Jane", "Doe"),
    ("J_D@example.net", "", ""),
    ("@nowhere", "", ""),
    ("!!!@example.com", "", ""),
    ("zoe@example.com", "Zoë", "Ångström"),
  ];
  for (email, first, last) in inputs {
    manager::create_user(&s, email, None, named(first, last)).await.unwrap();
  }

  let all = s.list_identities().await.unwrap();
  assert_eq!(all.len(), inputs.len());
  let slugs: HashSet<_> = all.iter().map(|i| i.slug.clone()).collect();
  assert_eq!(slugs.len(), all.len());
  assert!(all.iter().all(|i| is_valid_slug(&i.slug)), "{slugs:?}");
  assert!(slugs.contains("jane-doe-1"));
  assert!(slugs.contains("user-1"));
  assert!(slugs.contains("zoe-angstrom"));
}

#[tokio::test]
async fn slug_survives_profile_update() {
  let s = store().await;
  let alex = user(&s, "alex@example.com").await;
  assert_eq!(alex.slug, "alex");

  let updated = s
    .update_profile(alex.identity_id, ProfileUpdate {
      first_name: Some("Alexandra".into()),
      last_name:  Some("Stone".into()),
      bio:        Some("Climber.".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.slug, "alex");
  assert_eq!(updated.first_name, "Alexandra");
  assert_eq!(updated.bio.as_deref(), Some("Climber."));
  assert_eq!(
    s.find_by_slug("alex").await.unwrap().unwrap().identity_id,
    alex.identity_id
  );
}

#[tokio::test]
async fn claim_reports_which_constraint_failed() {
  let s = store().await;
  let alex = user(&s, "alex@example.com").await;

  let mut racer = alex.clone();
  racer.identity_id = Uuid::new_v4();
  racer.email = "someone-else@example.com".into();
  assert_eq!(
    s.try_insert(&racer).await.unwrap(),
    WriteOutcome::Unique("identities.slug".into())
  );

  let mut twin = alex.clone();
  twin.identity_id = Uuid::new_v4();
  twin.slug = "alex-twin".into();
  assert_eq!(
    s.try_insert(&twin).await.unwrap(),
    WriteOutcome::Unique("identities.email".into())
  );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_sharing_a_base_all_get_slugs() {
  let s = store().await;

  let tasks: Vec<_> = (0..20)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        let email = format!("alex@host{i}.example.com");
        manager::create_user(&s, &email, None, ExtraFields::default()).await
      })
    })
    .collect();

  let mut slugs = HashSet::new();
  for task in tasks {
    slugs.insert(task.await.unwrap().unwrap().slug);
  }

  let expected: HashSet<String> = (0..20).map(|n| candidate("alex", n)).collect();
  assert_eq!(slugs, expected);
}

/// Steals the slug of any `@victim.com` signup whose candidate matches the
/// `WHEN` clause, the way a writer on another connection would. The stolen
/// row is backed out together with the rejected insert.
const STEAL_ALEX: &str = "
CREATE TRIGGER steal_slug BEFORE INSERT ON identities
WHEN NEW.email LIKE '%@victim.com' AND NEW.slug = 'alex'
BEGIN
  INSERT INTO identities (identity_id, email, slug, password_hash, date_joined)
  VALUES (lower(hex(randomblob(16))), NEW.email || '.thief', NEW.slug, '!',
          '2024-01-01T00:00:00+00:00');
END;
";

const STEAL_EVERY_ALEX: &str = "
CREATE TRIGGER steal_slug BEFORE INSERT ON identities
WHEN NEW.email LIKE '%@victim.com' AND NEW.slug LIKE 'alex%'
BEGIN
  INSERT INTO identities (identity_id, email, slug, password_hash, date_joined)
  VALUES (lower(hex(randomblob(16))), NEW.email || '.thief', NEW.slug, '!',
          '2024-01-01T00:00:00+00:00');
END;
";

#[tokio::test]
async fn lost_claim_moves_on_to_the_next_candidate() {
  let s = store().await;
  s.execute_batch(STEAL_ALEX).await.unwrap();

  let alex = user(&s, "alex@victim.com").await;
  assert_eq!(alex.slug, "alex-1");
  assert!(s.find_by_slug("alex").await.unwrap().is_none());
  assert_eq!(s.list_identities().await.unwrap().len(), 1);
}

#[tokio::test]
async fn every_claim_lost_exhausts_the_budget() {
  let s = store().await;
  s.execute_batch(STEAL_EVERY_ALEX).await.unwrap();

  let err = manager::create_user(&s, "alex@victim.com", None, ExtraFields::default())
    .await
    .unwrap_err();
  assert!(matches!(
    &err,
    Error::SlugExhausted { base, attempts } if base == "alex" && *attempts == MAX_SLUG_ATTEMPTS
  ));
  assert_eq!(err.kind(), ErrorKind::Constraint);
  assert!(s.list_identities().await.unwrap().is_empty());

  // Other bases are unaffected.
  let sam = user(&s, "sam@victim.com").await;
  assert_eq!(sam.slug, "sam");
}

// ─── Profile & credentials ───────────────────────────────────────────────────

#[tokio::test]
async fn update_profile_of_missing_identity_returns_none() {
  let s = store().await;
  let result = s
    .update_profile(Uuid::new_v4(), ProfileUpdate::default())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn update_profile_rejects_long_names() {
  let s = store().await;
  let alex = user(&s, "alex@example.com").await;
  let err = s
    .update_profile(alex.identity_id, ProfileUpdate {
      first_name: Some("x".repeat(31)),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn authenticate_checks_password_and_records_login() {
  let s = store().await;
  let alex = user(&s, "alex@example.com").await;
  assert!(alex.last_login.is_none());

  let wrong = manager::authenticate(&s, "alex@example.com", "nope").await.unwrap();
  assert!(wrong.is_none());

  let unknown = manager::authenticate(&s, "ghost@example.com", "password").await.unwrap();
  assert!(unknown.is_none());

  let ok = manager::authenticate(&s, "alex@EXAMPLE.com", "password")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(ok.identity_id, alex.identity_id);
  assert!(ok.last_login.is_some());

  let stored = s.get_identity(alex.identity_id).await.unwrap().unwrap();
  assert!(stored.last_login.is_some());
}

#[tokio::test]
async fn authenticate_rejects_inactive_and_passwordless() {
  let s = store().await;
  let extra = ExtraFields { is_active: Some(false), ..Default::default() };
  manager::create_user(&s, "off@example.com", Some("pw"), extra).await.unwrap();
  assert!(manager::authenticate(&s, "off@example.com", "pw").await.unwrap().is_none());

  let bare = manager::create_user(&s, "bare@example.com", None, ExtraFields::default())
    .await
    .unwrap();
  assert!(!bare.has_usable_password());
  assert!(manager::authenticate(&s, "bare@example.com", "").await.unwrap().is_none());
}

#[tokio::test]
async fn set_password_replaces_credential() {
  let s = store().await;
  let alex = user(&s, "alex@example.com").await;

  assert!(s.set_password(alex.identity_id, Some("new-secret")).await.unwrap());
  assert!(manager::authenticate(&s, "alex@example.com", "password").await.unwrap().is_none());
  assert!(manager::authenticate(&s, "alex@example.com", "new-secret").await.unwrap().is_some());

  assert!(s.set_password(alex.identity_id, None).await.unwrap());
  assert!(manager::authenticate(&s, "alex@example.com", "new-secret").await.unwrap().is_none());

  assert!(!s.set_password(Uuid::new_v4(), Some("x")).await.unwrap());
}

// ─── Follow graph ────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_and_read_both_directions() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;
  let c = user(&s, "c@example.com").await;

  let edge = s.follow(a.identity_id, b.identity_id).await.unwrap();
  assert_eq!(edge.follower_id, a.identity_id);
  assert_eq!(edge.followed_id, b.identity_id);
  s.follow(c.identity_id, b.identity_id).await.unwrap();

  let followers: HashSet<_> = s
    .followers(b.identity_id)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.identity_id)
    .collect();
  assert_eq!(followers, HashSet::from([a.identity_id, c.identity_id]));

  let following = s.following(a.identity_id).await.unwrap();
  assert_eq!(following.len(), 1);
  assert_eq!(following[0].identity_id, b.identity_id);

  assert!(s.is_following(a.identity_id, b.identity_id).await.unwrap());
  assert!(!s.is_following(b.identity_id, a.identity_id).await.unwrap());
}

#[tokio::test]
async fn duplicate_follow_is_a_constraint_violation() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;

  s.follow(a.identity_id, b.identity_id).await.unwrap();
  let err = s.follow(a.identity_id, b.identity_id).await.unwrap_err();
  assert!(matches!(err, crate::Error::AlreadyFollowing { .. }));
  assert_eq!(err.kind(), ErrorKind::Constraint);

  // The reverse direction is a different edge.
  s.follow(b.identity_id, a.identity_id).await.unwrap();
}

#[tokio::test]
async fn follow_unknown_identity_is_a_reference_error() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;

  let err = s.follow(a.identity_id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::UnknownIdentity { .. }));
  assert_eq!(err.kind(), ErrorKind::Reference);

  let err = s.follow(Uuid::new_v4(), a.identity_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Reference);
}

#[tokio::test]
async fn self_follow_is_stored() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  s.follow(a.identity_id, a.identity_id).await.unwrap();
  assert!(s.is_following(a.identity_id, a.identity_id).await.unwrap());
}

#[tokio::test]
async fn unfollow_reports_whether_an_edge_was_removed() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;

  s.follow(a.identity_id, b.identity_id).await.unwrap();
  assert!(s.unfollow(a.identity_id, b.identity_id).await.unwrap());
  assert!(!s.unfollow(a.identity_id, b.identity_id).await.unwrap());
  assert!(s.followers(b.identity_id).await.unwrap().is_empty());

  // Following again after an unfollow is allowed.
  s.follow(a.identity_id, b.identity_id).await.unwrap();
}

#[tokio::test]
async fn deleting_an_identity_cascades_to_its_edges() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;
  let c = user(&s, "c@example.com").await;

  s.follow(a.identity_id, b.identity_id).await.unwrap();
  s.follow(b.identity_id, c.identity_id).await.unwrap();
  s.follow(a.identity_id, c.identity_id).await.unwrap();

  assert!(s.delete_identity(b.identity_id).await.unwrap());
  assert!(!s.delete_identity(b.identity_id).await.unwrap());

  assert!(!s.is_following(a.identity_id, b.identity_id).await.unwrap());
  assert!(!s.is_following(b.identity_id, c.identity_id).await.unwrap());

  let following_a: Vec<_> = s
    .following(a.identity_id)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.identity_id)
    .collect();
  assert_eq!(following_a, vec![c.identity_id]);

  let followers_c: Vec<_> = s
    .followers(c.identity_id)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.identity_id)
    .collect();
  assert_eq!(followers_c, vec![a.identity_id]);
}
