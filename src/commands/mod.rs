//! Command dispatch for gator.
//!
//! A [`Commands`] registry maps names to handlers. It is built once at
//! startup by [`registered_commands`] and then used to run a single
//! [`Command`] against a [`State`].

mod agg;
mod feeds;
mod posts;
mod users;

pub use agg::parse_interval;

use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::config::Config;
use crate::db::{Database, User, UserStore};
use crate::{GatorError, Result};

/// A parsed command line: a name and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Fail with a usage message unless exactly `count` arguments were given.
    pub(crate) fn expect_args(&self, count: usize, usage: &str) -> Result<()> {
        if self.args.len() != count {
            let usage = format!("usage: gator {} {}", self.name, usage);
            return Err(GatorError::Validation(usage.trim_end().to_string()));
        }
        Ok(())
    }
}

/// Everything a handler may touch.
pub struct State {
    pub db: Database,
    pub config: Config,
    /// Where `config` was loaded from; commands that change it write back here.
    pub config_path: PathBuf,
    /// The acting user's name as supplied by the caller.
    pub current_user: Option<String>,
}

impl State {
    /// Build state acting as the config's current user.
    pub fn new(db: Database, config: Config, config_path: PathBuf) -> Self {
        let current_user = config.current_user_name.clone();
        Self {
            db,
            config,
            config_path,
            current_user,
        }
    }

    /// Act as `name` instead of the configured user.
    pub fn with_current_user(mut self, name: Option<String>) -> Self {
        self.current_user = name;
        self
    }

    /// Look up the acting user.
    ///
    /// Fails with [`GatorError::NoCurrentUser`] if no name was supplied or
    /// the name does not match a user.
    pub async fn resolve_current_user(&self) -> Result<User> {
        let name = self
            .current_user
            .as_deref()
            .ok_or(GatorError::NoCurrentUser(None))?;

        match self.db.get_user_by_name(name).await {
            Ok(user) => Ok(user),
            Err(GatorError::NotFound(_)) => Err(GatorError::NoCurrentUser(Some(name.to_string()))),
            Err(e) => Err(e),
        }
    }
}

/// A command handler.
///
/// Implemented for plain functions of the form
/// `fn(&State, &Command) -> BoxFuture<Result<()>>`.
pub trait CommandHandler: Send + Sync {
    fn call<'a>(&'a self, state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>>;
}

impl<F> CommandHandler for F
where
    F: for<'a> Fn(&'a State, &'a Command) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn call<'a>(&'a self, state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
        self(state, cmd)
    }
}

/// A handler that runs only once the acting user has been resolved.
pub struct RequireUser<H>(H);

/// Wrap a handler so it receives the resolved acting user.
///
/// The inner handler is never invoked if resolution fails.
pub fn middleware_logged_in<H>(handler: H) -> RequireUser<H>
where
    H: for<'a> Fn(&'a State, &'a Command, User) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    RequireUser(handler)
}

impl<H> CommandHandler for RequireUser<H>
where
    H: for<'a> Fn(&'a State, &'a Command, User) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn call<'a>(&'a self, state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
        async move {
            let user = state.resolve_current_user().await?;
            debug!("Running {} as {}", cmd.name, user.name);
            (self.0)(state, cmd, user).await
        }
        .boxed()
    }
}

/// Registry of named command handlers.
#[derive(Default)]
pub struct Commands {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch a command to its handler.
    ///
    /// Handler errors are wrapped in [`GatorError::Command`] with the
    /// command name attached.
    pub async fn run(&self, state: &State, cmd: &Command) -> Result<()> {
        let handler = self
            .handlers
            .get(&cmd.name)
            .ok_or_else(|| GatorError::UnknownCommand(cmd.name.clone()))?;

        debug!("Dispatching {} {:?}", cmd.name, cmd.args);
        handler
            .call(state, cmd)
            .await
            .map_err(|e| GatorError::Command {
                name: cmd.name.clone(),
                source: Box::new(e),
            })
    }
}

/// The registry of every built-in command.
pub fn registered_commands() -> Commands {
    let mut commands = Commands::new();
    commands.register("login", users::handler_login);
    commands.register("register", users::handler_register);
    commands.register("reset", users::handler_reset);
    commands.register("users", users::handler_users);
    commands.register("agg", agg::handler_agg);
    commands.register("addfeed", middleware_logged_in(feeds::handler_add_feed));
    commands.register("feeds", feeds::handler_feeds);
    commands.register("follow", middleware_logged_in(feeds::handler_follow));
    commands.register("following", middleware_logged_in(feeds::handler_following));
    commands.register("unfollow", middleware_logged_in(feeds::handler_unfollow));
    commands.register("browse", middleware_logged_in(posts::handler_browse));
    commands
}
