use crate::config::WebhookConfig;
use crate::types::{FetchConfig, MessageChannel, Result};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    to: &'a str,
    text: &'a str,
}

/// Hands messages to an HTTP gateway that owns the actual chat session.
/// Each message is a POST of `{"to": ..., "text": ...}`.
pub struct WebhookChannel {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookChannel {
    pub fn new(config: &WebhookConfig, fetch_config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&fetch_config.user_agent)
            .timeout(Duration::from_secs(fetch_config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl MessageChannel for WebhookChannel {
    fn channel_name(&self) -> String {
        "webhook".to_string()
    }

    async fn connect(&self) -> anyhow::Result<()> {
        let response = self
            .authorized(self.client.head(&self.url))
            .send()
            .await
            .with_context(|| format!("gateway {} unreachable", self.url))?;

        // Any answer at all means the gateway is up; 405 is common for HEAD.
        info!("Gateway {} answered HTTP {}", self.url, response.status());
        Ok(())
    }

    async fn send(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        let body = OutgoingMessage { to: recipient, text };
        let response = self
            .authorized(self.client.post(&self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("send to {} failed", recipient))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("gateway returned HTTP {} for {}", status, recipient);
        }
        debug!("Gateway accepted message for {}", recipient);
        Ok(())
    }
}
