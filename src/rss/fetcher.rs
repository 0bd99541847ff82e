//! RSS feed fetcher.
//!
//! Performs one HTTP GET per call and parses the body as RSS 2.0. There are
//! no retries here; the aggregator simply tries again on a later tick.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::AggregatorConfig;
use crate::error::{GatorError, Result};
use crate::rss::types::{RssChannel, RssDocument, RssItem};

/// Anything that can turn a feed URL into a parsed document.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RssDocument>> + Send;
}

/// HTTP feed fetcher backed by reqwest.
pub struct RssFetcher {
    client: Client,
    max_feed_size: u64,
}

impl RssFetcher {
    /// Create a fetcher with timeouts, redirect limit and user agent from config.
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client, max_feed_size: u64) -> Self {
        Self {
            client,
            max_feed_size,
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatorError::Network(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatorError::Network(format!("{url} returned HTTP {status}")));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(GatorError::Network(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        // Content-Length may be absent or wrong, so the cap is enforced while reading
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GatorError::Network(format!("failed to read response: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_feed_size {
                return Err(GatorError::Network(format!(
                    "feed too large: more than {} bytes",
                    self.max_feed_size
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

impl FeedFetcher for RssFetcher {
    async fn fetch(&self, url: &str) -> Result<RssDocument> {
        let bytes = self.fetch_bytes(url).await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        parse_document(&bytes)
    }
}

/// Parse an RSS 2.0 body into a document.
pub fn parse_document(data: &[u8]) -> Result<RssDocument> {
    let channel = ::rss::Channel::read_from(data)
        .map_err(|e| GatorError::Format(format!("invalid RSS document: {e}")))?;

    let items = channel
        .items()
        .iter()
        .map(|item| RssItem {
            title: item.title().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
            description: item.description().unwrap_or_default().to_string(),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(RssDocument {
        channel: RssChannel {
            title: channel.title().to_string(),
            link: channel.link().to_string(),
            description: channel.description().to_string(),
        },
        items,
    })
}

/// Check that a feed URL is an absolute http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| GatorError::Validation(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatorError::Validation(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(GatorError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <link>https://example.test/</link>
    <description>Posts about examples</description>
    <item>
      <title>Hello</title>
      <link>https://example.test/1</link>
      <description></description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Second &amp; last</title>
      <link>https://example.test/2</link>
      <description>More words</description>
      <pubDate>Tue, 03 Jan 2006 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://example.test/3</link>
    </item>
  </channel>
</rss>"#;

    /// Serve a single HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        serve_response(status_line, body, true).await
    }

    async fn serve_response(
        status_line: &'static str,
        body: &'static str,
        with_length: bool,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let length = if with_length {
                format!("Content-Length: {}\r\n", body.len())
            } else {
                String::new()
            };
            let response = format!(
                "{status_line}\r\nContent-Type: application/rss+xml\r\n{length}Connection: close\r\n\r\n{body}"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        format!("http://{addr}/feed.xml")
    }

    fn test_fetcher(max_feed_size: u64) -> RssFetcher {
        let client = Client::builder().no_proxy().build().unwrap();
        RssFetcher::with_client(client, max_feed_size)
    }

    #[test]
    fn test_parse_document() {
        let doc = parse_document(SAMPLE_RSS.as_bytes()).unwrap();

        assert_eq!(doc.channel.title, "Example Blog");
        assert_eq!(doc.channel.link, "https://example.test/");
        assert_eq!(doc.items.len(), 3);

        assert_eq!(doc.items[0].title, "Hello");
        assert_eq!(doc.items[0].description, "");
        assert_eq!(doc.items[0].pub_date, "Mon, 02 Jan 2006 15:04:05 -0700");
        assert_eq!(doc.items[1].title, "Second & last");
        assert_eq!(doc.items[2].pub_date, "");
    }

    #[test]
    fn test_parse_malformed_document() {
        let result = parse_document(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(GatorError::Format(_))));

        let result = parse_document(b"not xml at all");
        assert!(matches!(result, Err(GatorError::Format(_))));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.test/rss").is_ok());
        assert!(validate_url("http://localhost:8080/feed.xml").is_ok());
        assert!(matches!(
            validate_url("ftp://example.test/rss"),
            Err(GatorError::Validation(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(GatorError::Validation(_))
        ));
    }

    #[test]
    fn test_new_from_config() {
        assert!(RssFetcher::new(&AggregatorConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once("HTTP/1.1 200 OK", SAMPLE_RSS).await;
        let doc = test_fetcher(1024 * 1024).fetch(&url).await.unwrap();
        assert_eq!(doc.channel.title, "Example Blog");
        assert_eq!(doc.items.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let url = serve_once("HTTP/1.1 404 Not Found", "gone").await;
        let result = test_fetcher(1024 * 1024).fetch(&url).await;
        assert!(matches!(result, Err(GatorError::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let url = serve_once("HTTP/1.1 200 OK", "<html><body>not a feed</body></html>").await;
        let result = test_fetcher(1024 * 1024).fetch(&url).await;
        assert!(matches!(result, Err(GatorError::Format(_))));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let url = serve_once("HTTP/1.1 200 OK", SAMPLE_RSS).await;
        let result = test_fetcher(16).fetch(&url).await;
        assert!(matches!(result, Err(GatorError::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_too_large_without_content_length() {
        let url = serve_response("HTTP/1.1 200 OK", SAMPLE_RSS, false).await;
        let result = test_fetcher(16).fetch(&url).await;
        assert!(matches!(result, Err(GatorError::Network(msg)) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn test_fetch_without_content_length() {
        let url = serve_response("HTTP/1.1 200 OK", SAMPLE_RSS, false).await;
        let doc = test_fetcher(1024 * 1024).fetch(&url).await.unwrap();
        assert_eq!(doc.items.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = test_fetcher(1024).fetch(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(GatorError::Network(_))));
    }
}
