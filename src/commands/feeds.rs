//! Feed commands: addfeed, feeds, follow, following and unfollow.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use super::{Command, State};
use crate::db::{FeedStore, FollowStore, User};
use crate::rss::{validate_url, FeedRepository, NewFeed};
use crate::{GatorError, Result};

/// `addfeed <name> <url>`: add a feed and follow it.
pub fn handler_add_feed<'a>(
    state: &'a State,
    cmd: &'a Command,
    user: User,
) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(2, "<name> <url>")?;
        let (name, url) = (&cmd.args[0], &cmd.args[1]);
        validate_url(url)?;

        let feed = state
            .db
            .create_feed(&NewFeed::new(name.as_str(), url.as_str(), user.id))
            .await?;
        info!("Created feed {} ({}) for {}", feed.name, feed.id, user.name);

        let follow = state.db.follow(user.id, feed.id).await?;
        println!("Added feed {} ({})", feed.name, feed.url);
        println!("{} now follows {}", follow.user_name, follow.feed_name);
        Ok(())
    }
    .boxed()
}

/// `feeds`: list every feed and who added it.
pub fn handler_feeds<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(0, "")?;
        let feeds = FeedRepository::new(state.db.pool()).list_with_owner().await?;
        if feeds.is_empty() {
            println!("No feeds yet. Add one with `gator addfeed <name> <url>`.");
        }
        for feed in feeds {
            println!("* {} <{}> added by {}", feed.name, feed.url, feed.user_name);
        }
        Ok(())
    }
    .boxed()
}

/// `follow <url>`: follow an existing feed.
pub fn handler_follow<'a>(
    state: &'a State,
    cmd: &'a Command,
    user: User,
) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(1, "<url>")?;
        let feed = state.db.get_feed_by_url(&cmd.args[0]).await?;

        let follow = state.db.follow(user.id, feed.id).await.map_err(|e| match e {
            GatorError::AlreadyExists(_) => {
                GatorError::AlreadyExists(format!("{}'s follow of {}", user.name, feed.url))
            }
            other => other,
        })?;
        println!("{} now follows {}", follow.user_name, follow.feed_name);
        Ok(())
    }
    .boxed()
}

/// `following`: list the feeds the acting user follows.
pub fn handler_following<'a>(
    state: &'a State,
    cmd: &'a Command,
    user: User,
) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(0, "")?;
        let follows = state.db.follows_for_user(user.id).await?;
        if follows.is_empty() {
            println!("{} is not following any feeds", user.name);
        }
        for follow in follows {
            println!("* {}", follow.feed_name);
        }
        Ok(())
    }
    .boxed()
}

/// `unfollow <url>`: stop following a feed.
pub fn handler_unfollow<'a>(
    state: &'a State,
    cmd: &'a Command,
    user: User,
) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(1, "<url>")?;
        let feed = state.db.get_feed_by_url(&cmd.args[0]).await?;

        state
            .db
            .unfollow(user.id, feed.id)
            .await
            .map_err(|e| match e {
                GatorError::NotFound(_) => {
                    GatorError::NotFound(format!("{}'s follow of {}", user.name, feed.url))
                }
                other => other,
            })?;
        println!("{} unfollowed {}", user.name, feed.name);
        Ok(())
    }
    .boxed()
}
