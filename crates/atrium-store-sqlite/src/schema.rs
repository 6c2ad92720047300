//! SQL schema for the Atrium SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Uniqueness of email, slug and follow pair, and the cascade from identities
/// to follows, are all declared here rather than checked in code.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    identity_id     TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,   -- normalised
    first_name      TEXT NOT NULL DEFAULT '',
    last_name       TEXT NOT NULL DEFAULT '',
    slug            TEXT NOT NULL UNIQUE CHECK (length(slug) BETWEEN 1 AND 50),
    bio             TEXT,
    profile_picture TEXT,
    password_hash   TEXT NOT NULL,          -- argon2 PHC string or '!' marker
    is_active       INTEGER NOT NULL DEFAULT 1,
    is_staff        INTEGER NOT NULL DEFAULT 0,
    is_superuser    INTEGER NOT NULL DEFAULT 0,
    date_joined     TEXT NOT NULL,          -- ISO 8601 UTC
    last_login      TEXT
);

CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL REFERENCES identities(identity_id) ON DELETE CASCADE,
    followed_id TEXT NOT NULL REFERENCES identities(identity_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    UNIQUE (follower_id, followed_id)
);

CREATE INDEX IF NOT EXISTS follows_followed_idx ON follows(followed_id);

PRAGMA user_version = 1;
";
