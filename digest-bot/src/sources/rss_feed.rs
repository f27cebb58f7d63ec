use crate::traits::PullFeed;
use crate::types::{BotError, ParsedFeed, Result};
use crate::utils::url::extract_domain;
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Generic RSS/Atom feed source backed by the shared fetcher
pub struct RssFeedSource {
    pub url: String,
    fetcher: Arc<Fetcher>,
}

impl RssFeedSource {
    pub fn new(url: String, fetcher: Arc<Fetcher>) -> Self {
        Self { url, fetcher }
    }
}

#[async_trait]
impl PullFeed for RssFeedSource {
    fn source_name(&self) -> String {
        extract_domain(&self.url).unwrap_or_else(|| "RSS Feed".to_string())
    }

    fn feed_url(&self) -> String {
        self.url.clone()
    }

    async fn pull(&self) -> Result<ParsedFeed> {
        info!("Pulling RSS feed: {}", self.url);

        let fetch_result = self.fetcher.fetch_feed(&self.url).await?;

        if !FeedParser::is_valid_feed_content(&fetch_result.content) {
            warn!("Response from {} does not look like a feed", self.url);
            return Err(BotError::Parse(format!("{} did not return a feed document", self.url)));
        }

        let parsed_feed = FeedParser::parse_feed(&fetch_result.content)?;

        info!(
            "Pulled {} entries from {} in {}ms",
            parsed_feed.entries.len(),
            self.url,
            fetch_result.response_time_ms
        );
        Ok(parsed_feed)
    }
}
