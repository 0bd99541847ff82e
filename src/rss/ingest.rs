//! Turning fetched items into posts.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::db::PostStore;
use crate::error::{GatorError, Result};
use crate::rss::types::{NewPost, RssItem, MAX_DESCRIPTION_LENGTH};

/// `pubDate` layout after the weekday: RFC 1123 with a numeric zone.
const PUB_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parse a `pubDate` such as `Mon, 02 Jan 2006 15:04:05 -0700`.
///
/// The weekday must be a valid abbreviation but is not checked against the
/// date.
pub fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>> {
    let invalid = || GatorError::Format(format!("invalid publish date {raw:?}"));

    let (weekday, rest) = raw.trim().split_once(", ").ok_or_else(invalid)?;
    if !WEEKDAYS.contains(&weekday) {
        return Err(invalid());
    }

    DateTime::parse_from_str(rest, PUB_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GatorError::Format(format!("invalid publish date {raw:?}: {e}")))
}

/// An empty description becomes `None`. Anything else is stored as the
/// feed sent it, cut to [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn normalize_description(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match raw.char_indices().nth(MAX_DESCRIPTION_LENGTH) {
        Some((idx, _)) => Some(raw[..idx].to_string()),
        None => Some(raw.to_string()),
    }
}

/// Build a post with a fresh id from a fetched item.
pub fn new_post_from_item(feed_id: Uuid, item: &RssItem) -> Result<NewPost> {
    Ok(NewPost {
        id: Uuid::new_v4(),
        feed_id,
        title: item.title.clone(),
        url: item.link.clone(),
        description: normalize_description(&item.description),
        published_at: parse_pub_date(&item.pub_date)?,
    })
}

/// Counts for one ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// New posts written.
    pub inserted: usize,
    /// Items whose URL the feed already had.
    pub skipped: usize,
}

/// Insert the items of one feed in document order.
///
/// Items already stored for the feed are skipped. An unparsable publish
/// date stops the pass: posts inserted before it are kept and the error is
/// returned.
pub async fn ingest_items<S>(store: &S, feed_id: Uuid, items: &[RssItem]) -> Result<IngestStats>
where
    S: PostStore,
{
    let mut stats = IngestStats::default();

    for (index, item) in items.iter().enumerate() {
        let post = new_post_from_item(feed_id, item).map_err(|e| match e {
            GatorError::Format(msg) => GatorError::Format(format!(
                "item {} ({}) after {} new post(s): {msg}",
                index + 1,
                item.link,
                stats.inserted
            )),
            other => other,
        })?;

        match store.create_post(&post).await? {
            Some(_) => {
                trace!("Stored post {}", post.url);
                stats.inserted += 1;
            }
            None => stats.skipped += 1,
        }
    }

    debug!(
        "Feed {}: {} new post(s), {} already stored",
        feed_id, stats.inserted, stats.skipped
    );
    Ok(stats)
}
