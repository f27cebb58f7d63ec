use crate::types::MessageChannel;
use async_trait::async_trait;
use tracing::info;

/// Writes messages to the log instead of sending them. Used for dry runs and
/// as the last resort when every real send in a run has failed.
#[derive(Debug, Clone, Default)]
pub struct LogChannel;

#[async_trait]
impl MessageChannel for LogChannel {
    fn channel_name(&self) -> String {
        "log".to_string()
    }

    async fn send(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        info!(recipient = %recipient, chars = text.chars().count(), "Message for {}:\n{}", recipient, text);
        Ok(())
    }
}
