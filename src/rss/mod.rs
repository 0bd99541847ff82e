//! Feed aggregation for gator.
//!
//! Fetching and parsing feeds, turning items into posts, the polling loop,
//! and the feed, follow and post repositories.

pub mod aggregator;
pub mod fetcher;
pub mod ingest;
pub mod repository;
pub mod types;

pub use aggregator::{Aggregator, TickReport};
pub use fetcher::{parse_document, validate_url, FeedFetcher, RssFetcher};
pub use ingest::{ingest_items, normalize_description, parse_pub_date, IngestStats};
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use types::{
    Feed, FeedFollow, FeedFollowDetails, FeedWithOwner, NewFeed, NewPost, Post, RssChannel,
    RssDocument, RssItem, MAX_DESCRIPTION_LENGTH,
};
