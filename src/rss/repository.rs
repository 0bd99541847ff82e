//! Feed, follow and post repositories for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Feed, FeedFollow, FeedFollowDetails, FeedWithOwner, NewFeed, NewPost, Post};
use crate::db::DbPool;
use crate::error::is_unique_violation;
use crate::{GatorError, Result};

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// Fails with [`GatorError::AlreadyExists`] if a feed with the same URL exists.
    pub async fn create(&self, new_feed: &NewFeed) -> Result<Feed> {
        let now = Utc::now();
        let feed = Feed {
            id: Uuid::new_v4(),
            name: new_feed.name.clone(),
            url: new_feed.url.clone(),
            user_id: new_feed.user_id,
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO feeds (id, name, url, user_id, last_fetched_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(feed.id)
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .bind(feed.created_at)
        .bind(feed.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::AlreadyExists(format!("feed {}", new_feed.url))
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        Ok(feed)
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?");
        let feed = sqlx::query_as::<_, Feed>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(feed)
    }

    /// List all feeds (ordered by registration order).
    pub async fn list(&self) -> Result<Vec<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY created_at ASC");
        let feeds = sqlx::query_as::<_, Feed>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(feeds)
    }

    /// List all feeds with the name of the user who added them.
    pub async fn list_with_owner(&self) -> Result<Vec<FeedWithOwner>> {
        let feeds = sqlx::query_as::<_, FeedWithOwner>(
            r#"
            SELECT f.name, f.url, u.name AS user_name
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(feeds)
    }

    /// Get the feed that has waited longest for a fetch.
    ///
    /// Never-fetched feeds come first, then the oldest `last_fetched_at`;
    /// ties go to the feed created first.
    pub async fn next_to_fetch(&self) -> Result<Option<Feed>> {
        let query = format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC
            LIMIT 1
            "#
        );
        let feed = sqlx::query_as::<_, Feed>(&query)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(feed)
    }

    /// Record that the feed was picked for fetching at `fetched_at`.
    pub async fn mark_fetched(&self, id: Uuid, fetched_at: DateTime<Utc>) -> Result<()> {
        let result =
            sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
                .bind(fetched_at)
                .bind(fetched_at)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| GatorError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(GatorError::NotFound(format!("feed {id}")));
        }
        Ok(())
    }
}

/// Repository for feed follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Follow a feed.
    ///
    /// Fails with [`GatorError::AlreadyExists`] if the user already follows it.
    pub async fn create(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollow> {
        let now = Utc::now();
        let follow = FeedFollow {
            id: Uuid::new_v4(),
            user_id,
            feed_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(follow.id)
        .bind(follow.user_id)
        .bind(follow.feed_id)
        .bind(follow.created_at)
        .bind(follow.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::AlreadyExists("follow".to_string())
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        Ok(follow)
    }

    /// Get a follow with its user and feed names.
    pub async fn get_details(&self, id: Uuid) -> Result<Option<FeedFollowDetails>> {
        let details = sqlx::query_as::<_, FeedFollowDetails>(
            r#"
            SELECT ff.id, u.name AS user_name, f.name AS feed_name, f.url AS feed_url
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(details)
    }

    /// List the feeds a user follows, oldest follow first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollowDetails>> {
        let follows = sqlx::query_as::<_, FeedFollowDetails>(
            r#"
            SELECT ff.id, u.name AS user_name, f.name AS feed_name, f.url AS feed_url
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY ff.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(follows)
    }

    /// Unfollow a feed. Returns false if the user was not following it.
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post.
    ///
    /// Fails with [`GatorError::AlreadyExists`] if the feed already has a post
    /// with the same URL.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: new_post.id,
            feed_id: new_post.feed_id,
            title: new_post.title.clone(),
            url: new_post.url.clone(),
            description: new_post.description.clone(),
            published_at: new_post.published_at,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO posts (id, feed_id, title, url, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id)
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GatorError::AlreadyExists(format!("post {}", new_post.url))
            } else {
                GatorError::Database(e.to_string())
            }
        })?;

        Ok(post)
    }

    /// List the newest posts from feeds the named user follows.
    pub async fn list_for_user(&self, user_name: &str, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                   p.created_at, p.updated_at
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            JOIN users u ON u.id = ff.user_id
            WHERE u.name = ?
            ORDER BY p.published_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_name)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(posts)
    }

    /// List all posts of a feed, newest first.
    pub async fn list_by_feed(&self, feed_id: Uuid) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
            FROM posts
            WHERE feed_id = ?
            ORDER BY published_at DESC
            "#,
        )
        .bind(feed_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(posts)
    }
}
