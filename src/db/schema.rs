//! Database schema and migrations for gator.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users, feeds and follows
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE feeds (
    id               BLOB PRIMARY KEY,
    name             TEXT NOT NULL,
    url              TEXT NOT NULL UNIQUE,
    user_id          BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    last_fetched_at  TEXT,               -- NULL until the aggregator first picks it
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX idx_feeds_next_fetch ON feeds(last_fetched_at, created_at);

CREATE TABLE feed_follows (
    id          BLOB PRIMARY KEY,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (user_id, feed_id)
);
"#,
    // v2: posts
    r#"
CREATE TABLE posts (
    id            BLOB PRIMARY KEY,
    feed_id       BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    url           TEXT NOT NULL,
    description   TEXT,
    published_at  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (feed_id, url)
);

CREATE INDEX idx_posts_published_at ON posts(published_at);
"#,
];
