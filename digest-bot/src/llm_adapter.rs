use crate::config::ProviderConfig;
use crate::types::{BotError, FetchConfig, Result, Summarizer};
use crate::utils::text::truncate_chars;
use anyhow::Context;
use async_trait::async_trait;
use interfaces::BaselineSummarizer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You summarize technology news for a daily digest. \
Write 2-3 plain sentences covering what happened and why it matters. \
No preamble, no markdown, no links.";

const MAX_PROMPT_CONTENT_CHARS: usize = 5000;
const PROVIDER_TIMEOUT_SECONDS: u64 = 60;

fn user_prompt(title: &str, content: &str) -> String {
    format!(
        "Title: {}\n\nArticle:\n{}",
        title.trim(),
        truncate_chars(content.trim(), MAX_PROMPT_CONTENT_CHARS)
    )
}

fn provider_client(fetch_config: &FetchConfig) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(&fetch_config.user_agent)
        .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECONDS))
        .build()?)
}

/// Any endpoint speaking the OpenAI chat-completions shape.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, base_url: String, model: String, fetch_config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: provider_client(fetch_config)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn provider_name(&self) -> String {
        "openai".to_string()
    }

    async fn summarize(&self, title: &str, content: &str) -> anyhow::Result<String> {
        let prompt = user_prompt(title, content);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            max_tokens: 300,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("provider returned HTTP {}: {}", status, truncate_chars(&body, 200));
        }

        let parsed: ChatResponse = response.json().await.context("malformed chat completion response")?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("provider returned an empty summary");
        }
        debug!("Summarized '{}' with {}", title, self.model);
        Ok(text)
    }
}

pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiSummarizer {
    const BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta/models";

    pub fn new(api_key: String, model: String, fetch_config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: provider_client(fetch_config)?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn provider_name(&self) -> String {
        "gemini".to_string()
    }

    async fn summarize(&self, title: &str, content: &str) -> anyhow::Result<String> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart { text: SYSTEM_PROMPT.to_string() }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: user_prompt(title, content) }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/{}:generateContent", Self::BASE_URL, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("generateContent request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("provider returned HTTP {}: {}", status, truncate_chars(&body, 200));
        }

        let parsed: GeminiResponse = response.json().await.context("malformed generateContent response")?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("provider returned an empty summary");
        }
        Ok(text)
    }
}

/// Registry of configured summarizers, one of which is the default
pub struct SummarizerRegistry {
    summarizers: HashMap<String, Arc<dyn Summarizer>>,
    default_summarizer: Option<String>,
}

impl SummarizerRegistry {
    pub fn new() -> Self {
        Self {
            summarizers: HashMap::new(),
            default_summarizer: None,
        }
    }

    /// Build every provider the configuration has credentials for. The
    /// selected provider becomes the default.
    pub fn from_config(providers: &ProviderConfig, fetch_config: &FetchConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(BaselineSummarizer));

        if let Some(openai) = &providers.openai {
            registry.register(Arc::new(OpenAiSummarizer::new(
                openai.api_key.clone(),
                openai.base_url.clone(),
                openai.model.clone(),
                fetch_config,
            )?));
        }
        if let Some(gemini) = &providers.gemini {
            registry.register(Arc::new(GeminiSummarizer::new(
                gemini.api_key.clone(),
                gemini.model.clone(),
                fetch_config,
            )?));
        }

        registry.set_default(&providers.selected)?;
        Ok(registry)
    }

    /// Register a summarizer under its provider name
    pub fn register(&mut self, summarizer: Arc<dyn Summarizer>) {
        let name = summarizer.provider_name();
        info!("Registering summarizer: {}", name);

        if self.default_summarizer.is_none() {
            self.default_summarizer = Some(name.clone());
        }
        self.summarizers.insert(name, summarizer);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Summarizer>> {
        self.summarizers.get(name).cloned()
    }

    pub fn default_summarizer(&self) -> Option<Arc<dyn Summarizer>> {
        self.default_summarizer.as_deref().and_then(|name| self.get(name))
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if self.summarizers.contains_key(name) {
            self.default_summarizer = Some(name.to_string());
            info!("Using summarizer: {}", name);
            Ok(())
        } else {
            Err(BotError::General(format!("Summarizer '{}' is not configured", name)))
        }
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.summarizers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SummarizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
