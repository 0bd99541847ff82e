//! Error types for gator.

use thiserror::Error;

/// Common error type for gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Transport failure or non-success HTTP status while fetching a feed.
    #[error("network error: {0}")]
    Network(String),

    /// Unparsable feed XML or publish date.
    #[error("format error: {0}")]
    Format(String),

    /// Uniqueness violation on a user, feed, follow or post.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// No handler registered under the given name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A command needs an acting user and none could be resolved.
    ///
    /// Carries the configured name when one was set but does not exist.
    #[error("{}", no_current_user_message(.0))]
    NoCurrentUser(Option<String>),

    /// A handler failed; the command name is attached for context.
    #[error("{name}: {source}")]
    Command {
        name: String,
        #[source]
        source: Box<GatorError>,
    },

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted here unless the caller maps a
    /// uniqueness violation to [`GatorError::AlreadyExists`] first.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatorError {
    /// Whether this is an expected, user-facing condition rather than a fault.
    pub fn is_expected(&self) -> bool {
        match self {
            GatorError::Command { source, .. } => source.is_expected(),
            GatorError::AlreadyExists(_)
            | GatorError::NotFound(_)
            | GatorError::UnknownCommand(_)
            | GatorError::NoCurrentUser(_)
            | GatorError::Validation(_) => true,
            _ => false,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_expected() {
            1
        } else {
            2
        }
    }

    /// The innermost error, looking through command context.
    pub fn root(&self) -> &GatorError {
        match self {
            GatorError::Command { source, .. } => source.root(),
            other => other,
        }
    }
}

fn no_current_user_message(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("current user {name} does not exist; run `gator login <name>`"),
        None => "no current user; run `gator register <name>` or `gator login <name>`".to_string(),
    }
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Returns true if the sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Result type alias for gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;
