//! gator - a personal RSS aggregator.
//!
//! Users follow RSS feeds; the aggregation loop polls one feed per tick and
//! stores new items as posts, which users then browse from the command line.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod rss;

pub use commands::{registered_commands, Command, Commands, State};
pub use config::Config;
pub use db::{Database, FeedStore, FollowStore, PostStore, User, UserRepository, UserStore};
pub use error::{GatorError, Result};
pub use crate::rss::{Aggregator, Feed, FeedFetcher, NewFeed, Post, RssDocument, RssFetcher, RssItem};
