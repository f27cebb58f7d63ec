use crate::enricher::EnrichError;
use crate::types::{ParsedFeed, Result};
use async_trait::async_trait;

/// Trait for pulling entries from a syndication source
#[async_trait]
pub trait PullFeed: Send + Sync {
    /// Human-readable name for this source, used when the feed has no title
    fn source_name(&self) -> String;

    fn feed_url(&self) -> String;

    /// Fetch and parse the current feed document
    async fn pull(&self) -> Result<ParsedFeed>;
}

/// Best-effort replacement of a feed snippet with text from the live page
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    async fn fetch_full_text(&self, url: &str) -> std::result::Result<String, EnrichError>;
}
