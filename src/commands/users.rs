//! User commands: login, register, reset and users.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use super::{Command, State};
use crate::config::Config;
use crate::db::{UserRepository, UserStore};
use crate::Result;

/// Make the current user persistent in the config file.
///
/// Writes to the file directly rather than saving `state.config`, which
/// carries env and command-line overrides for this run only.
fn persist_current_user(state: &State, name: &str) -> Result<()> {
    Config::save_current_user(&state.config_path, name)
}

/// `login <name>`: switch to an existing user.
pub fn handler_login<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(1, "<name>")?;
        let user = state.db.get_user_by_name(&cmd.args[0]).await?;

        persist_current_user(state, &user.name)?;
        println!("Logged in as {}", user.name);
        Ok(())
    }
    .boxed()
}

/// `register <name>`: create a user and log in as them.
pub fn handler_register<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(1, "<name>")?;
        let user = state.db.create_user(&cmd.args[0]).await?;
        info!("Created user {} ({})", user.name, user.id);

        persist_current_user(state, &user.name)?;
        println!("Registered and logged in as {}", user.name);
        Ok(())
    }
    .boxed()
}

/// `reset`: delete every user along with their feeds, follows and posts.
pub fn handler_reset<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(0, "")?;
        let deleted = UserRepository::new(state.db.pool()).delete_all().await?;
        info!("Deleted {} user(s)", deleted);
        println!("Database reset ({deleted} user(s) removed)");
        Ok(())
    }
    .boxed()
}

/// `users`: list users, marking the acting one.
pub fn handler_users<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        cmd.expect_args(0, "")?;
        for user in state.db.list_users().await? {
            if state.current_user.as_deref() == Some(user.name.as_str()) {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    }
    .boxed()
}
