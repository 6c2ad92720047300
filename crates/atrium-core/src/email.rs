//! Email normalisation.

/// Normalise an email address for storage and lookup.
///
/// Surrounding whitespace is trimmed and the domain part (after the last `@`)
/// is lower-cased. The local part is case-sensitive and left untouched.
/// Input without an `@` is returned unchanged.
pub fn normalize_email(email: &str) -> String {
  match email.trim().rsplit_once('@') {
    Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
    None => email.to_owned(),
  }
}

/// The part of `email` before the first `@`, or the whole string.
pub fn local_part(email: &str) -> &str {
  email.split_once('@').map_or(email, |(local, _)| local)
}
