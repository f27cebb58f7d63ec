use crate::channels::{LogChannel, WebhookChannel};
use crate::commands::{CommandReply, CommandRouter};
use crate::config::BotConfig;
use crate::connection::{maintain_connection, ConnectionManager, ReconnectPolicy};
use crate::fetcher::Fetcher;
use crate::llm_adapter::SummarizerRegistry;
use crate::pipeline::{DeliveryMode, DigestPipeline, PipelineBuilder, RunOutcome};
use crate::scheduler::DailyScheduler;
use crate::sources::RssFeedSource;
use crate::types::{BotError, InboundMessage, MessageChannel, Result};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Startup switches that do not come from the environment.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Send every message to the log instead of the messaging channel.
    pub dry_run: bool,
}

/// Feed check result for one configured feed.
#[derive(Debug)]
pub struct FeedCheck {
    pub url: String,
    pub title: Option<String>,
    pub result: Result<usize>,
}

pub struct BotApp {
    config: BotConfig,
    channel: Arc<dyn MessageChannel>,
    pipeline: Arc<DigestPipeline>,
    connection: Arc<ConnectionManager>,
    router: Arc<CommandRouter>,
}

impl BotApp {
    pub fn new(config: BotConfig, options: AppOptions) -> Result<Self> {
        let registry = SummarizerRegistry::from_config(&config.providers, &config.fetch)?;
        let summarizer = registry
            .default_summarizer()
            .ok_or_else(|| BotError::General("No summarizer configured".to_string()))?;
        info!("Summarizers available: {}", registry.list().join(", "));

        let channel: Arc<dyn MessageChannel> = match (&config.webhook, options.dry_run) {
            (Some(webhook), false) => Arc::new(WebhookChannel::new(webhook, &config.fetch)?),
            (None, false) => {
                warn!("WEBHOOK_URL not set, messages will only be logged");
                Arc::new(LogChannel)
            }
            (_, true) => Arc::new(LogChannel),
        };

        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let mut builder = PipelineBuilder::new(summarizer, channel.clone())
            .recipients(config.recipients.recipients().to_vec())
            .limits(config.limits.clone())
            .fetch_config(config.fetch.clone())
            .dedup_ttl(config.dedup_ttl_hours.map(ChronoDuration::hours));
        for url in &config.feed_urls {
            builder = builder.add_source(Box::new(RssFeedSource::new(url.clone(), fetcher.clone())));
        }
        let pipeline = Arc::new(builder.build()?);

        let connection = Arc::new(ConnectionManager::new(ReconnectPolicy::default()));
        let router = CommandRouter::new(
            pipeline.clone(),
            config.recipients.clone(),
            channel.clone(),
            connection.clone(),
        )
        .with_schedule(config.digest_time)
        .with_security_alerts(config.security_alerts);

        Ok(Self {
            config,
            channel,
            pipeline,
            connection,
            router: Arc::new(router),
        })
    }

    pub fn pipeline(&self) -> Arc<DigestPipeline> {
        self.pipeline.clone()
    }

    pub async fn run_once(&self) -> RunOutcome {
        self.pipeline.run(DeliveryMode::Broadcast).await
    }

    pub async fn command(&self, sender: &str, text: &str) -> Option<CommandReply> {
        self.router.handle(&InboundMessage::new(sender, text)).await
    }

    pub async fn check_feeds(&self) -> Vec<FeedCheck> {
        let mut checks = Vec::with_capacity(self.pipeline.feed_count());
        for source in self.pipeline.sources() {
            let (title, result) = match source.pull().await {
                Ok(feed) => (feed.title, Ok(feed.entries.len())),
                Err(e) => (None, Err(e)),
            };
            checks.push(FeedCheck {
                url: source.feed_url(),
                title,
                result,
            });
        }
        checks
    }

    /// Connect, schedule the daily broadcast and dispatch commands read from
    /// stdin (`<sender> <text>` per line) until Ctrl-C or end of input.
    pub async fn serve(self) -> anyhow::Result<()> {
        maintain_connection(self.channel.clone(), self.connection.clone()).await?;

        let mut scheduler = DailyScheduler::new().await?;
        let pipeline = self.pipeline.clone();
        scheduler
            .add_daily_job(self.config.digest_time, move || {
                let pipeline = pipeline.clone();
                async move {
                    let outcome = pipeline.run(DeliveryMode::Broadcast).await;
                    info!("Scheduled run outcome: {}", outcome.label());
                    Ok(())
                }
            })
            .await?;
        scheduler.start().await?;
        info!("Next digest at {}", self.config.digest_time);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.dispatch_line(&line).await,
                    Ok(None) => {
                        info!("Command input closed, waiting for Ctrl-C");
                        tokio::signal::ctrl_c().await?;
                        break;
                    }
                    Err(e) => {
                        error!("Reading commands failed: {}", e);
                        break;
                    }
                },
            }
        }

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn dispatch_line(&self, line: &str) {
        let Some((sender, text)) = line.trim().split_once(char::is_whitespace) else {
            if !line.trim().is_empty() {
                warn!("Expected '<sender> <text>', got {:?}", line);
            }
            return;
        };
        let message = InboundMessage::new(sender, text.trim());
        self.router.handle_and_reply(&message).await;
    }
}
