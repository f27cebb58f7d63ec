use crate::types::{BotError, FetchConfig, FetchResult, Result};
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// HTTP client shared by feed polling and page enrichment. Every request is
/// a single attempt; callers decide what a failure means for their item.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        let start_time = Instant::now();
        let fetch_time = Utc::now();

        debug!("Fetching feed: {}", url);
        let (http_status, content) = self.get_text(url).await?;

        info!("Fetched feed: {} ({} bytes)", url, content.len());
        Ok(FetchResult {
            url: url.to_string(),
            http_status,
            fetch_time,
            response_time_ms: start_time.elapsed().as_millis() as u64,
            content,
        })
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching page content from: {}", url);
        let (_, body) = self.get_text(url).await?;
        Ok(body)
    }

    async fn get_text(&self, url: &str) -> Result<(u16, String)> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BotError::General(format!("Unsupported URL scheme: {}", parsed.scheme())));
        }

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(BotError::TooLarge { size_mb });
            }
        }

        Ok((status.as_u16(), response.text().await?))
    }
}
