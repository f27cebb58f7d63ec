#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rss_digest_bot::{
    Article, BotError, ContentEnricher, EnrichError, MessageChannel, ParsedEntry, ParsedFeed, PullFeed,
    Summarizer,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const RELEVANT_BODY: &str =
    "The startup released an open source developer framework for machine learning inference.";
pub const BORING_BODY: &str = "The bakery on Main Street took first prize for its sourdough loaf this weekend.";

/// Feed entry published `age` ago.
pub fn entry(url: &str, title: &str, content: &str, age: Duration) -> ParsedEntry {
    ParsedEntry {
        url: url.to_string(),
        title: title.to_string(),
        description: None,
        content: Some(content.to_string()),
        published_at: Some(Utc::now() - age),
    }
}

pub fn article(n: usize, title: &str, content: &str, age: Duration) -> Article {
    Article::new(
        title.to_string(),
        format!("https://news.example/{}", n),
        "Example News".to_string(),
        Utc::now() - age,
    )
    .with_snippet(content.to_string())
}

pub struct StaticFeed {
    pub url: String,
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
    pub fail: bool,
}

impl StaticFeed {
    pub fn new(url: &str, title: &str, entries: Vec<ParsedEntry>) -> Self {
        Self {
            url: url.to_string(),
            title: Some(title.to_string()),
            entries,
            fail: false,
        }
    }

    pub fn failing(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            entries: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PullFeed for StaticFeed {
    fn source_name(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.url.clone())
    }

    fn feed_url(&self) -> String {
        self.url.clone()
    }

    async fn pull(&self) -> rss_digest_bot::Result<ParsedFeed> {
        if self.fail {
            return Err(BotError::Status {
                status: 503,
                url: self.url.clone(),
            });
        }
        Ok(ParsedFeed {
            title: self.title.clone(),
            entries: self.entries.clone(),
        })
    }
}

/// Returns canned page text per link; every other link fails.
#[derive(Default)]
pub struct StubEnricher {
    pages: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl StubEnricher {
    pub fn with_page(mut self, link: &str, text: &str) -> Self {
        self.pages.insert(link.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl ContentEnricher for StubEnricher {
    async fn fetch_full_text(&self, url: &str) -> Result<String, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| EnrichError::NoContent { url: url.to_string() })
    }
}

/// Summarizer that fails on the given 1-based call numbers.
#[derive(Default)]
pub struct ScriptedSummarizer {
    fail_on: HashSet<usize>,
    pub calls: AtomicUsize,
    pub titles: Mutex<Vec<String>>,
}

impl ScriptedSummarizer {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    fn provider_name(&self) -> String {
        "scripted".to_string()
    }

    async fn summarize(&self, title: &str, _content: &str) -> anyhow::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.titles.lock().unwrap().push(title.to_string());
        if self.fail_on.contains(&call) {
            anyhow::bail!("provider unavailable on call {}", call);
        }
        Ok(format!("  Summary of {}.  ", title))
    }
}

/// Records every send; sends to listed recipients (or all) fail.
#[derive(Default)]
pub struct RecordingChannel {
    failing: HashSet<String>,
    fail_all: bool,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    fn channel_name(&self) -> String {
        "recording".to_string()
    }

    async fn send(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        if self.fail_all || self.failing.contains(recipient) {
            anyhow::bail!("{} unreachable", recipient);
        }
        self.sent.lock().unwrap().push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}
