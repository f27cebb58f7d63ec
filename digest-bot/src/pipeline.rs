use crate::aggregator::FeedAggregator;
use crate::channels::LogChannel;
use crate::dedup::RecentLinks;
use crate::delivery::DeliveryCoordinator;
use crate::digest::{date_label, DigestComposer};
use crate::enricher::PageEnricher;
use crate::summarization::SummarizationGateway;
use crate::traits::{ContentEnricher, PullFeed};
use crate::types::{DeliveryReport, FetchConfig, MessageChannel, PipelineLimits, Result, Summarizer};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

const RECENT_LINKS_CAPACITY: usize = 1000;
const OPERATIONS_RECIPIENT: &str = "operations";

/// Who receives the digest of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Every configured recipient.
    Broadcast,
    /// A single identity, typically the sender of an on-demand command.
    Direct(String),
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Delivered {
        report: DeliveryReport,
        articles: usize,
        summaries: usize,
    },
    NothingToReport {
        articles: usize,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { report, .. } if report.all_failed() => "delivery failed",
            Self::Delivered { report, .. } if report.failed > 0 => "partially delivered",
            Self::Delivered { .. } => "delivered",
            Self::NothingToReport { .. } => "nothing to report",
        }
    }
}

/// What `!status` shows about the most recent run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub finished_at: DateTime<Utc>,
    pub outcome: String,
    pub articles: usize,
    pub summaries: usize,
    pub sent: usize,
    pub failed: usize,
}

impl RunSummary {
    fn new(run_id: Uuid, outcome: &RunOutcome) -> Self {
        let (articles, summaries, sent, failed) = match outcome {
            RunOutcome::Delivered {
                report,
                articles,
                summaries,
            } => (*articles, *summaries, report.sent, report.failed),
            RunOutcome::NothingToReport { articles } => (*articles, 0, 0, 0),
        };
        Self {
            run_id,
            finished_at: Utc::now(),
            outcome: outcome.label().to_string(),
            articles,
            summaries,
            sent,
            failed,
        }
    }
}

/// Fetch, filter, enrich, summarize, compose and deliver, one stage after the
/// other. Runs are serialized: a second trigger waits for the first to finish.
pub struct DigestPipeline {
    sources: Vec<Box<dyn PullFeed>>,
    aggregator: FeedAggregator,
    gateway: SummarizationGateway,
    composer: DigestComposer,
    delivery: DeliveryCoordinator,
    fallback: Arc<dyn MessageChannel>,
    recipients: Vec<String>,
    recent_links: Option<Arc<Mutex<RecentLinks>>>,
    run_guard: Mutex<()>,
    last_run: RwLock<Option<RunSummary>>,
}

impl DigestPipeline {
    pub fn feed_count(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> &[Box<dyn PullFeed>] {
        &self.sources
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn provider_name(&self) -> String {
        self.gateway.provider_name()
    }

    pub fn channel_name(&self) -> String {
        self.delivery.channel_name()
    }

    pub async fn last_run(&self) -> Option<RunSummary> {
        self.last_run.read().await.clone()
    }

    pub async fn run(&self, mode: DeliveryMode) -> RunOutcome {
        let _guard = self.run_guard.lock().await;
        let run_id = Uuid::new_v4();
        let span = info_span!("digest_run", %run_id);

        let outcome = self.run_inner(mode).instrument(span).await;
        *self.last_run.write().await = Some(RunSummary::new(run_id, &outcome));
        outcome
    }

    async fn run_inner(&self, mode: DeliveryMode) -> RunOutcome {
        info!(
            "Digest run starting: {} feeds, provider {}, mode {:?}",
            self.sources.len(),
            self.gateway.provider_name(),
            mode
        );

        let articles = self.aggregator.collect_articles(&self.sources).await;
        let summaries = self.gateway.summarize_all(&articles).await;
        if summaries.is_empty() {
            info!("No relevant articles among {}, nothing to deliver", articles.len());
            return RunOutcome::NothingToReport {
                articles: articles.len(),
            };
        }

        let now = Utc::now();
        let message = self.composer.compose(&summaries, &date_label(now));

        let report = match &mode {
            DeliveryMode::Broadcast => self.delivery.deliver(&message, &self.recipients).await,
            DeliveryMode::Direct(recipient) => self.delivery.deliver_direct(&message, recipient).await,
        };

        if report.all_failed() {
            error!(
                "All {} sends failed, surfacing digest via {}",
                report.total,
                self.fallback.channel_name()
            );
            if let Err(e) = self.fallback.send(OPERATIONS_RECIPIENT, &message).await {
                error!("Fallback channel failed too: {:#}", e);
            }
        } else if report.failed > 0 {
            warn!("{} of {} sends failed", report.failed, report.total);
        }

        if mode == DeliveryMode::Broadcast && report.sent > 0 {
            if let Some(recent_links) = &self.recent_links {
                let mut recent_links = recent_links.lock().await;
                for summary in &summaries {
                    recent_links.remember(&summary.link, now);
                }
            }
        }

        info!(
            "Digest run finished: {} articles, {} summaries, {}/{} delivered",
            articles.len(),
            summaries.len(),
            report.sent,
            report.total
        );
        RunOutcome::Delivered {
            report,
            articles: articles.len(),
            summaries: summaries.len(),
        }
    }
}

/// Pipeline builder for easier configuration
pub struct PipelineBuilder {
    summarizer: Arc<dyn Summarizer>,
    channel: Arc<dyn MessageChannel>,
    sources: Vec<Box<dyn PullFeed>>,
    enricher: Option<Arc<dyn ContentEnricher>>,
    fallback: Option<Arc<dyn MessageChannel>>,
    recipients: Vec<String>,
    limits: PipelineLimits,
    fetch_config: FetchConfig,
    composer: DigestComposer,
    dedup_ttl: Option<ChronoDuration>,
}

impl PipelineBuilder {
    pub fn new(summarizer: Arc<dyn Summarizer>, channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            summarizer,
            channel,
            sources: Vec::new(),
            enricher: None,
            fallback: None,
            recipients: Vec::new(),
            limits: PipelineLimits::default(),
            fetch_config: FetchConfig::default(),
            composer: DigestComposer::default(),
            dedup_ttl: None,
        }
    }

    pub fn add_source(mut self, source: Box<dyn PullFeed>) -> Self {
        info!("Adding source to pipeline: {}", source.feed_url());
        self.sources.push(source);
        self
    }

    pub fn enricher(mut self, enricher: Arc<dyn ContentEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn fallback_channel(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.fallback = Some(channel);
        self
    }

    pub fn recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn limits(mut self, limits: PipelineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn fetch_config(mut self, fetch_config: FetchConfig) -> Self {
        self.fetch_config = fetch_config;
        self
    }

    pub fn composer(mut self, composer: DigestComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Remember delivered links for `ttl` and leave them out of later runs.
    pub fn dedup_ttl(mut self, ttl: Option<ChronoDuration>) -> Self {
        self.dedup_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<DigestPipeline> {
        let enricher: Arc<dyn ContentEnricher> = match self.enricher {
            Some(enricher) => enricher,
            None => Arc::new(PageEnricher::new(self.fetch_config.clone(), self.limits.clone())?),
        };

        let recent_links = self
            .dedup_ttl
            .map(|ttl| Arc::new(Mutex::new(RecentLinks::new(ttl, RECENT_LINKS_CAPACITY))));

        let mut aggregator = FeedAggregator::new(enricher, self.limits.clone());
        if let Some(recent_links) = &recent_links {
            aggregator = aggregator.with_recent_links(recent_links.clone());
        }

        if self.recipients.is_empty() {
            warn!("Pipeline built without broadcast recipients");
        }

        Ok(DigestPipeline {
            sources: self.sources,
            aggregator,
            gateway: SummarizationGateway::new(self.summarizer, self.limits.clone()),
            composer: self.composer,
            delivery: DeliveryCoordinator::new(self.channel, self.limits.send_delay),
            fallback: self.fallback.unwrap_or_else(|| Arc::new(LogChannel)),
            recipients: self.recipients,
            recent_links,
            run_guard: Mutex::new(()),
            last_run: RwLock::new(None),
        })
    }
}
