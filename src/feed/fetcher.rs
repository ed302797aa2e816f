use chrono::Utc;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;
use thiserror::Error;

use super::parser::{parse_items, ParseError, ParsedFeed};
use crate::config::FetchConfig;
use crate::storage::FeedEntry;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while downloading and reading a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Payload could not be turned into feed items
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Client could not be constructed from the configuration
    #[error("Invalid HTTP client configuration: {0}")]
    Config(String),
}

/// HTTP client for feed payloads.
///
/// Every request carries the configured user agent and
/// `Accept: application/xml`, and is bounded by the configured timeout.
/// Failed requests are not retried.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));

        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self { http, timeout })
    }

    fn map_request_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err)
        }
    }

    /// Download the raw payload at `url`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the configured timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching feed");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Feed request failed");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_FEED_SIZE as u64 {
                return Err(FetchError::ResponseTooLarge);
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_request_error(e))?;
            if bytes.len().saturating_add(chunk.len()) > MAX_FEED_SIZE {
                return Err(FetchError::ResponseTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %url, bytes = bytes.len(), "Feed downloaded");
        Ok(bytes)
    }

    /// Fetch and parse the feed behind a stored entry.
    pub async fn load_feed(&self, entry: &FeedEntry) -> Result<ParsedFeed, FetchError> {
        let bytes = self.fetch(&entry.web_address).await?;
        let feed = parse_items(&bytes, entry.open_in_new_tab, Utc::now())?;

        tracing::info!(
            title = %entry.title,
            items = feed.items.len(),
            "Feed loaded"
        );
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Mock</title>
    <item><guid>1</guid><title>Test</title><link>https://example.com/1</link></item>
</channel></rss>"#;

    fn client() -> FeedClient {
        FeedClient::new(&FetchConfig {
            user_agent: "feedshelf-test/1.0".to_string(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    fn entry_for(url: String) -> FeedEntry {
        FeedEntry {
            id: 1,
            title: "Mock".to_string(),
            web_address: url,
            route_name: "/displayfeed/Mock".to_string(),
            open_in_new_tab: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_accept_and_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("accept", "application/xml"))
            .and(header("user-agent", "feedshelf-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .expect(1)
            .mount(&mock_server)
            .await;

        let bytes = client()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, VALID_RSS.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = client()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(4)),
            )
            .mount(&mock_server)
            .await;

        let err = client()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; MAX_FEED_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let err = client()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge));
    }

    #[tokio::test]
    async fn test_load_feed_builds_items() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let feed = client()
            .load_feed(&entry_for(format!("{}/feed", mock_server.uri())))
            .await
            .unwrap();
        assert_eq!(feed.title.as_deref(), Some("Mock"));
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].link, "https://example.com/1");
        assert!(feed.items[0].new_tab);
    }

    #[tokio::test]
    async fn test_load_feed_malformed_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let err = client()
            .load_feed(&entry_for(format!("{}/feed", mock_server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
