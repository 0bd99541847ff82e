//! Feed, follow and post types for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum length for a stored post description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// A subscribed feed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    /// Source URL, unique across all feeds.
    pub url: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Last time the aggregator picked this feed; `None` until then.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
}

impl NewFeed {
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A feed joined with its owner's name, for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub user_name: String,
}

/// A user following a feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feed_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A follow joined with the user and feed names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollowDetails {
    pub id: Uuid,
    pub user_name: String,
    pub feed_name: String,
    pub feed_url: String,
}

/// One ingested feed item.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    /// Item link; unique per feed.
    pub url: String,
    /// `None` when the item carried no (or an empty) description.
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New post for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// A fetched RSS document.
#[derive(Debug, Clone, Default)]
pub struct RssDocument {
    pub channel: RssChannel,
    /// Items in document order.
    pub items: Vec<RssItem>,
}

/// Channel metadata of a fetched document.
#[derive(Debug, Clone, Default)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// One `<item>` of a fetched document, fields as they appeared.
#[derive(Debug, Clone, Default)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw `pubDate` text; empty if the element was missing.
    pub pub_date: String,
}

impl RssItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
        pub_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
            pub_date: pub_date.into(),
        }
    }
}
