use crate::connection::ConnectionManager;
use crate::pipeline::{DeliveryMode, DigestPipeline, RunOutcome};
use crate::recipients::RecipientDirectory;
use crate::scheduler::ScheduleTime;
use crate::types::{InboundMessage, MessageChannel};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub const HELP_TEXT: &str = "Available commands:\n\
!digest - send me a digest now\n\
!status - bot status\n\
!recipients - who gets the daily digest\n\
!help - this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Digest,
    Status,
    Recipients,
    Help,
    Unknown(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let word = text.split_whitespace().next().unwrap_or("").to_lowercase();
        match word.as_str() {
            "!digest" => Self::Digest,
            "!status" => Self::Status,
            "!recipients" => Self::Recipients,
            "!help" => Self::Help,
            _ => Self::Unknown(text.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub recipient: String,
    pub text: String,
}

/// Dispatches inbound messages from authorized identities.
pub struct CommandRouter {
    pipeline: Arc<DigestPipeline>,
    directory: RecipientDirectory,
    channel: Arc<dyn MessageChannel>,
    connection: Arc<ConnectionManager>,
    schedule: Option<ScheduleTime>,
    security_alerts: bool,
}

impl CommandRouter {
    pub fn new(
        pipeline: Arc<DigestPipeline>,
        directory: RecipientDirectory,
        channel: Arc<dyn MessageChannel>,
        connection: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            pipeline,
            directory,
            channel,
            connection,
            schedule: None,
            security_alerts: true,
        }
    }

    pub fn with_schedule(mut self, schedule: ScheduleTime) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_security_alerts(mut self, enabled: bool) -> Self {
        self.security_alerts = enabled;
        self
    }

    /// Build the reply for a message. Messages from unauthorized senders are
    /// dropped and yield `None`.
    pub async fn handle(&self, message: &InboundMessage) -> Option<CommandReply> {
        if !self.directory.is_authorized(&message.sender) {
            warn!("Ignoring message from unauthorized sender {}", message.sender);
            self.alert_admin(message).await;
            return None;
        }

        let command = Command::parse(&message.text);
        info!("Command {:?} from {}", command, message.sender);

        let text = match command {
            Command::Digest => self.digest(&message.sender).await,
            Command::Status => self.status().await,
            Command::Recipients => self.recipients(),
            Command::Help | Command::Unknown(_) => HELP_TEXT.to_string(),
        };

        Some(CommandReply {
            recipient: message.sender.clone(),
            text,
        })
    }

    /// `handle`, then send the reply back through the channel.
    pub async fn handle_and_reply(&self, message: &InboundMessage) -> Option<CommandReply> {
        let reply = self.handle(message).await?;
        if let Err(e) = self.channel.send(&reply.recipient, &reply.text).await {
            warn!("Failed to reply to {}: {:#}", reply.recipient, e);
        }
        Some(reply)
    }

    async fn digest(&self, sender: &str) -> String {
        match self.pipeline.run(DeliveryMode::Direct(sender.to_string())).await {
            RunOutcome::Delivered { report, summaries, .. } if report.sent > 0 => {
                format!("Digest sent with {} stories.", summaries)
            }
            RunOutcome::Delivered { .. } => "The digest could not be delivered. Check the bot logs.".to_string(),
            RunOutcome::NothingToReport { articles } => format!(
                "Nothing to report: none of the {} recent articles were relevant.",
                articles
            ),
        }
    }

    async fn status(&self) -> String {
        let snapshot = self.connection.snapshot().await;
        let mut lines = vec![
            "🤖 *Bot status*".to_string(),
            format!("Connection: {}", snapshot.state),
            format!("Recipients: {}", self.directory.recipients().len()),
            format!("Feeds: {}", self.pipeline.feed_count()),
            format!("Summarizer: {}", self.pipeline.provider_name()),
        ];

        if let Some(schedule) = self.schedule {
            let next = schedule.next_after(Utc::now());
            lines.push(format!("Next digest: {}", next.format("%Y-%m-%d %H:%M UTC")));
        }

        match self.pipeline.last_run().await {
            Some(run) => lines.push(format!(
                "Last run: {} at {} ({} articles, {} summaries, {} sent, {} failed)",
                run.outcome,
                run.finished_at.format("%Y-%m-%d %H:%M UTC"),
                run.articles,
                run.summaries,
                run.sent,
                run.failed
            )),
            None => lines.push("Last run: none yet".to_string()),
        }

        lines.join("\n")
    }

    fn recipients(&self) -> String {
        let recipients = self.directory.recipients();
        if recipients.is_empty() {
            return "No recipients configured.".to_string();
        }
        let mut text = format!("📋 {} recipients:", recipients.len());
        for recipient in recipients {
            text.push_str(&format!("\n- {}", recipient));
        }
        text
    }

    async fn alert_admin(&self, message: &InboundMessage) {
        if !self.security_alerts {
            return;
        }
        let Some(admin) = self.directory.first_admin() else {
            return;
        };

        let alert = format!(
            "⚠️ Unauthorized message from {} at {}:\n{}",
            message.sender,
            message.received_at.format("%Y-%m-%d %H:%M UTC"),
            message.text
        );
        if let Err(e) = self.channel.send(admin, &alert).await {
            warn!("Failed to send security alert to {}: {:#}", admin, e);
        }
    }
}
