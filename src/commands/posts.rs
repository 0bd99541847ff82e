//! `browse`: show the newest posts from followed feeds.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::{Command, State};
use crate::db::{PostStore, User};
use crate::Result;

/// Posts shown when no (or an unparsable) limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

fn browse_limit(cmd: &Command) -> i64 {
    match cmd.args.first() {
        Some(raw) => match raw.parse::<i64>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                debug!("Ignoring browse limit {:?}", raw);
                DEFAULT_BROWSE_LIMIT
            }
        },
        None => DEFAULT_BROWSE_LIMIT,
    }
}

/// `browse [limit]`
pub fn handler_browse<'a>(
    state: &'a State,
    cmd: &'a Command,
    user: User,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let limit = browse_limit(cmd);
        let posts = state.db.posts_for_user(&user.name, limit).await?;

        if posts.is_empty() {
            println!("No posts yet. Follow a feed and run `gator agg`.");
        }
        for post in posts {
            println!("{} | {}", post.published_at.format("%a %b %e %Y %H:%M"), post.title);
            println!("    {}", post.url);
            if let Some(description) = &post.description {
                println!("    {}", description);
            }
        }
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registered_commands;
    use crate::commands::tests::setup_state;

    #[test]
    fn test_browse_limit() {
        assert_eq!(browse_limit(&Command::new("browse", Vec::<String>::new())), 2);
        assert_eq!(browse_limit(&Command::new("browse", ["5"])), 5);
        assert_eq!(browse_limit(&Command::new("browse", ["many"])), 2);
        assert_eq!(browse_limit(&Command::new("browse", ["0"])), 2);
        assert_eq!(browse_limit(&Command::new("browse", ["-3"])), 2);
    }

    #[tokio::test]
    async fn test_browse_requires_user() {
        let state = setup_state(None).await;
        let err = registered_commands()
            .run(&state, &Command::new("browse", Vec::<String>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err.root(), crate::GatorError::NoCurrentUser(None)));
    }
}
