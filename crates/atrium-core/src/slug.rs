//! Profile slug derivation.
//!
//! A slug is computed once, when an identity is first persisted. The base is
//! taken from the email local part, or from the person's name when that gives
//! something substantial. The store then claims the first free value in the
//! sequence `base`, `base-1`, `base-2`, ….

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization as _;

use crate::email::local_part;

/// Width of the `slug` column.
pub const SLUG_MAX_LEN: usize = 50;

/// Bases are cut to this length so that a numeric suffix always fits in
/// [`SLUG_MAX_LEN`].
const BASE_MAX_LEN: usize = 40;

/// A name-derived slug must be longer than this to replace the email one.
const NAME_SLUG_THRESHOLD: usize = 5;

/// Used when neither the email nor the name yields any usable character.
const FALLBACK_BASE: &str = "user";

/// Compute the base slug for a new identity.
pub fn base_slug(email: &str, first_name: &str, last_name: &str) -> String {
  let mut base = hyphenate(&local_part(email).to_lowercase());

  if !first_name.is_empty() && !last_name.is_empty() {
    let from_name = slugify(&format!("{first_name}-{last_name}"));
    if from_name.len() > NAME_SLUG_THRESHOLD {
      base = from_name;
    }
  }

  if base.is_empty() {
    base = FALLBACK_BASE.to_owned();
  }

  if base.len() > BASE_MAX_LEN {
    // `hyphenate` only emits ASCII, so byte truncation is safe.
    base.truncate(BASE_MAX_LEN);
    while base.ends_with('-') {
      base.pop();
    }
  }
  base
}

/// Fold `text` to a URL-safe slug: diacritics are stripped (NFKD, then
/// non-ASCII dropped), the result lower-cased, and every run of
/// non-alphanumerics becomes a single hyphen.
pub fn slugify(text: &str) -> String {
  let folded: String = text.nfkd().filter(char::is_ascii).collect();
  hyphenate(&folded)
}

/// The `n`th candidate for `base`: `base` itself, then `base-1`, `base-2`, ….
pub fn candidate(base: &str, n: usize) -> String {
  if n == 0 { base.to_owned() } else { format!("{base}-{n}") }
}

/// The first candidate for `base` that is not in `taken`.
pub fn first_free(base: &str, taken: &HashSet<String>) -> String {
  (0..)
    .map(|n| candidate(base, n))
    .find(|c| !taken.contains(c))
    .unwrap_or_else(|| base.to_owned())
}

/// True for a non-empty string of lower-case ASCII alphanumerics and single
/// inner hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
  !slug.is_empty()
    && slug.len() <= SLUG_MAX_LEN
    && !slug.starts_with('-')
    && !slug.ends_with('-')
    && !slug.contains("--")
    && slug
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Lower-case ASCII alphanumerics pass through; every run of anything else
/// collapses to one hyphen, and hyphens never lead or trail.
fn hyphenate(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut pending_hyphen = false;
  for ch in text.chars() {
    if ch.is_ascii_alphanumeric() {
      if pending_hyphen && !out.is_empty() {
        out.push('-');
      }
      out.push(ch.to_ascii_lowercase());
      pending_hyphen = false;
    } else {
      pending_hyphen = true;
    }
  }
  out
}
