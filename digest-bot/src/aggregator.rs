use crate::dedup::RecentLinks;
use crate::traits::{ContentEnricher, PullFeed};
use crate::types::{Article, ParsedEntry, PipelineLimits};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Polls feed sources one after another and assembles the run's article list.
///
/// Owns the per-feed cap and the recency window; both bound how much work
/// reaches the summarizer.
pub struct FeedAggregator {
    enricher: Arc<dyn ContentEnricher>,
    limits: PipelineLimits,
    recent_links: Option<Arc<Mutex<RecentLinks>>>,
}

impl FeedAggregator {
    pub fn new(enricher: Arc<dyn ContentEnricher>, limits: PipelineLimits) -> Self {
        Self {
            enricher,
            limits,
            recent_links: None,
        }
    }

    pub fn with_recent_links(mut self, recent_links: Arc<Mutex<RecentLinks>>) -> Self {
        self.recent_links = Some(recent_links);
        self
    }

    pub async fn collect_articles(&self, sources: &[Box<dyn PullFeed>]) -> Vec<Article> {
        self.collect_articles_at(sources, Utc::now()).await
    }

    /// Same as `collect_articles`, with the recency window measured from `now`.
    pub async fn collect_articles_at(&self, sources: &[Box<dyn PullFeed>], now: DateTime<Utc>) -> Vec<Article> {
        let mut articles = Vec::new();

        for source in sources {
            let feed = match source.pull().await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!("Skipping feed {}: {}", source.feed_url(), e);
                    continue;
                }
            };

            let source_name = feed.title.clone().unwrap_or_else(|| source.source_name());
            let retained = self.retain_recent(feed.entries, now);
            debug!("{} entries retained from {}", retained.len(), source_name);

            for entry in retained {
                if self.already_delivered(&entry.url, now).await {
                    debug!("Skipping recently delivered link: {}", entry.url);
                    continue;
                }
                let article = self.enrich(to_article(entry, &source_name, now)).await;
                articles.push(article);
            }
        }

        info!("Collected {} articles from {} feeds", articles.len(), sources.len());
        articles
    }

    /// Newest `items_per_feed` entries, then only those inside the recency
    /// window. Entries without a timestamp count as published now.
    fn retain_recent(&self, mut entries: Vec<ParsedEntry>, now: DateTime<Utc>) -> Vec<ParsedEntry> {
        let cutoff = now - self.limits.recency_window;
        entries.sort_by(|a, b| b.published_at.unwrap_or(now).cmp(&a.published_at.unwrap_or(now)));
        entries
            .into_iter()
            .take(self.limits.items_per_feed)
            .filter(|entry| entry.published_at.map_or(true, |published| published >= cutoff))
            .collect()
    }

    async fn already_delivered(&self, link: &str, now: DateTime<Utc>) -> bool {
        match &self.recent_links {
            Some(recent) => recent.lock().await.contains(link, now),
            None => false,
        }
    }

    async fn enrich(&self, mut article: Article) -> Article {
        match self.enricher.fetch_full_text(&article.link).await {
            Ok(text) => {
                if article.apply_enrichment(text) {
                    debug!("Enriched '{}' from the live page", article.title);
                }
            }
            Err(e) => debug!("Keeping feed snippet for '{}': {}", article.title, e),
        }
        article
    }
}

fn to_article(entry: ParsedEntry, source_name: &str, now: DateTime<Utc>) -> Article {
    let description = entry.description.unwrap_or_default();
    let snippet = entry.content.unwrap_or_else(|| description.clone());
    Article::new(entry.title, entry.url, source_name.to_string(), entry.published_at.unwrap_or(now))
        .with_snippet(snippet)
        .with_description(description)
}
