use crate::types::{DeliveryOutcome, DeliveryReport, MessageChannel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const BROADCAST_GREETING: &str = "Hi there! 👋";

/// Sends a digest through the messaging channel, one recipient at a time.
/// Send failures are recorded in the report, never returned as errors.
pub struct DeliveryCoordinator {
    channel: Arc<dyn MessageChannel>,
    send_delay: Duration,
}

impl DeliveryCoordinator {
    pub fn new(channel: Arc<dyn MessageChannel>, send_delay: Duration) -> Self {
        Self { channel, send_delay }
    }

    pub fn channel_name(&self) -> String {
        self.channel.channel_name()
    }

    /// Broadcast to every recipient. With more than one recipient each copy
    /// carries a greeting line.
    pub async fn deliver(&self, message: &str, recipients: &[String]) -> DeliveryReport {
        let text = if recipients.len() > 1 {
            format!("{}\n\n{}", BROADCAST_GREETING, message)
        } else {
            message.to_string()
        };

        let mut outcomes = Vec::with_capacity(recipients.len());
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            outcomes.push(self.send_one(recipient, &text).await);
        }

        let report = DeliveryReport::from_outcomes(outcomes);
        info!(
            "Delivery via {}: {} sent, {} failed, {} total",
            self.channel.channel_name(),
            report.sent,
            report.failed,
            report.total
        );
        report
    }

    /// Unprefixed reply to a single recipient, used for on-demand digests.
    pub async fn deliver_direct(&self, message: &str, recipient: &str) -> DeliveryReport {
        DeliveryReport::from_outcomes(vec![self.send_one(recipient, message).await])
    }

    async fn send_one(&self, recipient: &str, text: &str) -> DeliveryOutcome {
        match self.channel.send(recipient, text).await {
            Ok(()) => DeliveryOutcome::success(recipient),
            Err(e) => {
                warn!("Failed to send digest to {}: {:#}", recipient, e);
                DeliveryOutcome::failure(recipient, format!("{:#}", e))
            }
        }
    }
}
