use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
// Boundary types shared with provider and transport implementations
pub use interfaces::defs::{Article, DeliveryOutcome, InboundMessage, MessageChannel, Summarizer, SummaryResult};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            timeout_seconds: 15,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Bounds on the work a single digest run may do.
#[derive(Debug, Clone)]
pub struct PipelineLimits {
    pub items_per_feed: usize,
    pub recency_window: ChronoDuration,
    pub max_summaries: usize,
    pub summarize_delay: Duration,
    pub send_delay: Duration,
    pub min_selector_chars: usize,
    pub min_paragraph_chars: usize,
    pub max_content_chars: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            items_per_feed: 5,
            recency_window: ChronoDuration::days(2),
            max_summaries: 10,
            summarize_delay: Duration::from_secs(1),
            send_delay: Duration::from_secs(3),
            min_selector_chars: 500,
            min_paragraph_chars: 50,
            max_content_chars: 5000,
        }
    }
}

impl PipelineLimits {
    /// Limits with every pacing delay removed, for tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.summarize_delay = Duration::ZERO;
        self.send_delay = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub http_status: u16,
    pub fetch_time: DateTime<Utc>,
    pub response_time_ms: u64,
    pub content: String,
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Counts of a full distribution pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn from_outcomes(outcomes: Vec<DeliveryOutcome>) -> Self {
        let sent = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            sent,
            failed: outcomes.len() - sent,
            total: outcomes.len(),
            outcomes,
        }
    }

    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.sent == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response size exceeds limit: {size_mb}MB")]
    TooLarge { size_mb: usize },

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
