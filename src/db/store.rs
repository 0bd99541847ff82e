//! Store contracts consumed by the aggregator and the command handlers.
//!
//! [`Database`] implements every trait by delegating to the repositories;
//! tests can substitute their own implementations.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Database, User, UserRepository};
use crate::rss::repository::{FeedFollowRepository, FeedRepository, PostRepository};
use crate::rss::types::{Feed, FeedFollowDetails, NewFeed, NewPost, Post};
use crate::{GatorError, Result};

/// Feed storage.
pub trait FeedStore {
    /// The feed waiting longest for a fetch, or `None` if there are no feeds.
    fn next_feed_to_fetch(&self) -> impl Future<Output = Result<Option<Feed>>> + Send;

    fn mark_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fails with [`GatorError::AlreadyExists`] on a duplicate URL.
    fn create_feed(&self, feed: &NewFeed) -> impl Future<Output = Result<Feed>> + Send;

    /// Fails with [`GatorError::NotFound`] for an unknown URL.
    fn get_feed_by_url(&self, url: &str) -> impl Future<Output = Result<Feed>> + Send;

    fn list_feeds(&self) -> impl Future<Output = Result<Vec<Feed>>> + Send;
}

/// Post storage.
pub trait PostStore {
    /// Insert a post, returning `None` if the feed already has one with the
    /// same URL.
    fn create_post(&self, post: &NewPost) -> impl Future<Output = Result<Option<Post>>> + Send;

    /// Newest posts first from the feeds the user follows.
    fn posts_for_user(
        &self,
        user_name: &str,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Post>>> + Send;
}

/// User storage.
pub trait UserStore {
    /// Fails with [`GatorError::NotFound`] for an unknown name.
    fn get_user_by_name(&self, name: &str) -> impl Future<Output = Result<User>> + Send;

    /// Fails with [`GatorError::AlreadyExists`] on a duplicate name.
    fn create_user(&self, name: &str) -> impl Future<Output = Result<User>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send;
}

/// Follow storage.
pub trait FollowStore {
    /// Fails with [`GatorError::AlreadyExists`] if already following.
    fn follow(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
    ) -> impl Future<Output = Result<FeedFollowDetails>> + Send;

    /// Fails with [`GatorError::NotFound`] if not following.
    fn unfollow(&self, user_id: Uuid, feed_id: Uuid) -> impl Future<Output = Result<()>> + Send;

    fn follows_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<FeedFollowDetails>>> + Send;
}

impl FeedStore for Database {
    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        FeedRepository::new(self.pool()).next_to_fetch().await
    }

    async fn mark_fetched(&self, feed_id: Uuid, fetched_at: DateTime<Utc>) -> Result<()> {
        FeedRepository::new(self.pool())
            .mark_fetched(feed_id, fetched_at)
            .await
    }

    async fn create_feed(&self, feed: &NewFeed) -> Result<Feed> {
        FeedRepository::new(self.pool()).create(feed).await
    }

    async fn get_feed_by_url(&self, url: &str) -> Result<Feed> {
        FeedRepository::new(self.pool())
            .get_by_url(url)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {url}")))
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.pool()).list().await
    }
}

impl PostStore for Database {
    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>> {
        match PostRepository::new(self.pool()).create(post).await {
            Ok(post) => Ok(Some(post)),
            Err(GatorError::AlreadyExists(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn posts_for_user(&self, user_name: &str, limit: i64) -> Result<Vec<Post>> {
        PostRepository::new(self.pool())
            .list_for_user(user_name, limit)
            .await
    }
}

impl UserStore for Database {
    async fn get_user_by_name(&self, name: &str) -> Result<User> {
        UserRepository::new(self.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {name}")))
    }

    async fn create_user(&self, name: &str) -> Result<User> {
        UserRepository::new(self.pool()).create(name).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        UserRepository::new(self.pool()).list().await
    }
}

impl FollowStore for Database {
    async fn follow(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollowDetails> {
        let repo = FeedFollowRepository::new(self.pool());
        let follow = repo.create(user_id, feed_id).await?;
        repo.get_details(follow.id)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("follow {}", follow.id)))
    }

    async fn unfollow(&self, user_id: Uuid, feed_id: Uuid) -> Result<()> {
        if FeedFollowRepository::new(self.pool())
            .delete(user_id, feed_id)
            .await?
        {
            Ok(())
        } else {
            Err(GatorError::NotFound("follow".to_string()))
        }
    }

    async fn follows_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollowDetails>> {
        FeedFollowRepository::new(self.pool())
            .list_for_user(user_id)
            .await
    }
}
