use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feed entry under consideration for a digest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub raw_snippet: String,
    pub description: String,
    pub enriched_content: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

impl Article {
    pub fn new(title: String, link: String, source: String, published_at: DateTime<Utc>) -> Self {
        Self {
            title,
            link,
            raw_snippet: String::new(),
            description: String::new(),
            enriched_content: None,
            source,
            published_at,
        }
    }

    pub fn with_snippet(mut self, raw_snippet: String) -> Self {
        self.raw_snippet = raw_snippet;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// The text downstream stages should read: enriched content when it is
    /// longer than the feed snippet, the snippet otherwise.
    pub fn effective_content(&self) -> &str {
        match &self.enriched_content {
            Some(enriched) if enriched.chars().count() > self.raw_snippet.chars().count() => enriched,
            _ => &self.raw_snippet,
        }
    }

    /// Stores `text` as enriched content only if it is strictly longer than
    /// what the article already holds. Returns whether it was applied.
    pub fn apply_enrichment(&mut self, text: String) -> bool {
        if text.chars().count() > self.effective_content().chars().count() {
            self.enriched_content = Some(text);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub link: String,
    pub source: String,
    pub summary_text: String,
}

impl SummaryResult {
    pub fn from_article(article: &Article, summary_text: &str) -> Self {
        Self {
            title: article.title.clone(),
            link: article.link.clone(),
            source: article.source.clone(),
            summary_text: summary_text.trim().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(recipient: &str) -> Self {
        Self {
            recipient: recipient.to_owned(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(recipient: &str, error: String) -> Self {
        Self {
            recipient: recipient.to_owned(),
            succeeded: false,
            error: Some(error),
        }
    }
}

/// A text message received from the messaging channel.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(sender: &str, text: &str) -> Self {
        Self {
            sender: sender.to_owned(),
            text: text.to_owned(),
            received_at: Utc::now(),
        }
    }
}

// Object style note:
// Implementations of these traits are external collaborators of the digest
// pipeline (an AI provider, a messaging transport). The pipeline only ever
// calls them one at a time and treats every error as a per-item failure, so
// implementations should not retry internally.

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn provider_name(&self) -> String;

    /// Produce a short summary of an article. Fails when the provider cannot
    /// produce text (quota, auth, network).
    async fn summarize(&self, title: &str, content: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait MessageChannel: Send + Sync {
    fn channel_name(&self) -> String;

    /// Establish the transport session. Channels without a session succeed
    /// immediately.
    async fn connect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send(&self, recipient: &str, text: &str) -> anyhow::Result<()>;
}
