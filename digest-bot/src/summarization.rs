use crate::relevance::is_relevant_article;
use crate::types::{Article, PipelineLimits, Summarizer, SummaryResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the summarizer over the relevant, newest articles of a run.
pub struct SummarizationGateway {
    summarizer: Arc<dyn Summarizer>,
    limits: PipelineLimits,
}

impl SummarizationGateway {
    pub fn new(summarizer: Arc<dyn Summarizer>, limits: PipelineLimits) -> Self {
        Self { summarizer, limits }
    }

    pub fn provider_name(&self) -> String {
        self.summarizer.provider_name()
    }

    /// Relevant articles, newest first, capped at `max_summaries`.
    pub fn select_relevant<'a>(&self, articles: &'a [Article]) -> Vec<&'a Article> {
        let mut relevant: Vec<&Article> = articles.iter().filter(|a| is_relevant_article(a)).collect();
        info!("{} of {} articles passed the relevance filter", relevant.len(), articles.len());

        relevant.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        relevant.truncate(self.limits.max_summaries);
        relevant
    }

    pub async fn summarize_all(&self, articles: &[Article]) -> Vec<SummaryResult> {
        let selected = self.select_relevant(articles);
        if selected.is_empty() {
            return Vec::new();
        }

        let mut summaries = Vec::with_capacity(selected.len());
        for (index, article) in selected.iter().enumerate() {
            if index > 0 && !self.limits.summarize_delay.is_zero() {
                tokio::time::sleep(self.limits.summarize_delay).await;
            }

            match self.summarizer.summarize(&article.title, article.effective_content()).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("Summarized {}/{}: {}", index + 1, selected.len(), article.title);
                    summaries.push(SummaryResult::from_article(article, &text));
                }
                Ok(_) => warn!("Empty summary for '{}', skipping", article.title),
                Err(e) => warn!("Summarizer failed for '{}', skipping: {:#}", article.title, e),
            }
        }

        info!(
            "Summarized {} of {} selected articles with {}",
            summaries.len(),
            selected.len(),
            self.summarizer.provider_name()
        );
        summaries
    }
}
