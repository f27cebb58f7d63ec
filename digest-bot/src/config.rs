use crate::recipients::{parse_identity_list, RecipientDirectory};
use crate::scheduler::ScheduleTime;
use crate::types::{FetchConfig, PipelineLimits};
use crate::utils::url::is_valid_feed_url;
use std::env;

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://techcrunch.com/feed/",
    "https://www.theverge.com/rss/index.xml",
    "https://feeds.arstechnica.com/arstechnica/technology-lab",
    "https://venturebeat.com/category/ai/feed/",
    "https://www.wired.com/feed/tag/ai/latest/rss",
];

pub const DEFAULT_DIGEST_TIME: &str = "09:00";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub selected: String,
    pub openai: Option<OpenAiConfig>,
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub feed_urls: Vec<String>,
    pub recipients: RecipientDirectory,
    pub providers: ProviderConfig,
    pub digest_time: ScheduleTime,
    pub security_alerts: bool,
    pub dedup_ttl_hours: Option<i64>,
    pub webhook: Option<WebhookConfig>,
    pub limits: PipelineLimits,
    pub fetch: FetchConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_provider(None)
    }

    /// Environment configuration with `AI_PROVIDER` replaced, for the CLI flag.
    pub fn from_env_with_provider(provider: Option<&str>) -> Result<Self, ConfigError> {
        // A missing .env is fine; variables may be set by the service manager
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| match (key, provider) {
            ("AI_PROVIDER", Some(provider)) => Some(provider.to_string()),
            _ => env::var(key).ok(),
        })
    }

    /// Build the configuration from any key lookup. Every problem that would
    /// make a run impossible is reported here, before the bot starts.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let feed_urls = match get("FEED_URLS") {
            Some(raw) => parse_feed_urls(&raw)?,
            None => DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
        };

        let recipients_raw = get("RECIPIENTS").ok_or(ConfigError::Missing("RECIPIENTS"))?;
        let recipients = parse_identity_list("RECIPIENTS", &recipients_raw)?;
        if recipients.is_empty() {
            return Err(ConfigError::Missing("RECIPIENTS"));
        }
        let admins = match get("ADMIN_NUMBERS") {
            Some(raw) => parse_identity_list("ADMIN_NUMBERS", &raw)?,
            None => Vec::new(),
        };

        let providers = parse_providers(&get)?;

        let digest_time_raw = get("DIGEST_TIME").unwrap_or_else(|| DEFAULT_DIGEST_TIME.to_string());
        let digest_time = ScheduleTime::parse(&digest_time_raw).ok_or_else(|| ConfigError::Invalid {
            key: "DIGEST_TIME",
            value: digest_time_raw.clone(),
            reason: "expected HH:MM".to_string(),
        })?;

        let security_alerts = match get("SECURITY_ALERTS") {
            Some(raw) => parse_bool("SECURITY_ALERTS", &raw)?,
            None => true,
        };

        let dedup_ttl_hours = match get("DEDUP_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => Some(hours),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DEDUP_TTL_HOURS",
                        value: raw,
                        reason: "expected a positive number of hours".to_string(),
                    })
                }
            },
            None => None,
        };

        let webhook = match get("WEBHOOK_URL") {
            Some(url) if is_valid_feed_url(&url) => Some(WebhookConfig {
                url,
                token: get("WEBHOOK_TOKEN"),
            }),
            Some(url) => {
                return Err(ConfigError::Invalid {
                    key: "WEBHOOK_URL",
                    value: url,
                    reason: "expected an http(s) URL".to_string(),
                })
            }
            None => None,
        };

        Ok(Self {
            feed_urls,
            recipients: RecipientDirectory::new(recipients, admins),
            providers,
            digest_time,
            security_alerts,
            dedup_ttl_hours,
            webhook,
            limits: PipelineLimits::default(),
            fetch: FetchConfig::default(),
        })
    }
}

fn parse_feed_urls(raw: &str) -> Result<Vec<String>, ConfigError> {
    let urls: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(bad) = urls.iter().find(|url| !is_valid_feed_url(url)) {
        return Err(ConfigError::Invalid {
            key: "FEED_URLS",
            value: bad.clone(),
            reason: "expected an http(s) URL".to_string(),
        });
    }
    if urls.is_empty() {
        return Err(ConfigError::Missing("FEED_URLS"));
    }
    Ok(urls)
}

fn parse_providers<G>(get: &G) -> Result<ProviderConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let selected = get("AI_PROVIDER").unwrap_or_else(|| "openai".to_string()).to_lowercase();

    let openai = get("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
        api_key,
        base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
    });
    let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiConfig {
        api_key,
        model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
    });

    match selected.as_str() {
        "openai" if openai.is_none() => return Err(ConfigError::Missing("OPENAI_API_KEY")),
        "gemini" if gemini.is_none() => return Err(ConfigError::Missing("GEMINI_API_KEY")),
        "openai" | "gemini" | "baseline" => {}
        _ => {
            return Err(ConfigError::Invalid {
                key: "AI_PROVIDER",
                value: selected,
                reason: "expected openai, gemini or baseline".to_string(),
            })
        }
    }

    Ok(ProviderConfig { selected, openai, gemini })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn minimal_baseline_config() {
        let cfg = config(&[("RECIPIENTS", "15550100"), ("AI_PROVIDER", "baseline")]).unwrap();
        assert_eq!(cfg.feed_urls.len(), DEFAULT_FEEDS.len());
        assert_eq!(cfg.recipients.recipients(), &["15550100@c.us".to_string()]);
        assert_eq!(cfg.digest_time, ScheduleTime { hour: 9, minute: 0 });
        assert!(cfg.security_alerts);
        assert!(cfg.dedup_ttl_hours.is_none());
    }

    #[test]
    fn selected_provider_needs_its_key() {
        let err = config(&[("RECIPIENTS", "1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));

        let err = config(&[("RECIPIENTS", "1"), ("AI_PROVIDER", "gemini")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));

        let cfg = config(&[("RECIPIENTS", "1"), ("AI_PROVIDER", "Gemini"), ("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.providers.selected, "gemini");
    }

    #[test]
    fn malformed_lists_fail_fast() {
        assert!(matches!(
            config(&[("AI_PROVIDER", "baseline")]).unwrap_err(),
            ConfigError::Missing("RECIPIENTS")
        ));
        assert!(config(&[("RECIPIENTS", "1,two"), ("AI_PROVIDER", "baseline")]).is_err());
        assert!(config(&[("RECIPIENTS", "1"), ("ADMIN_NUMBERS", "x"), ("AI_PROVIDER", "baseline")]).is_err());
        assert!(config(&[("RECIPIENTS", "1"), ("FEED_URLS", "notaurl"), ("AI_PROVIDER", "baseline")]).is_err());
        assert!(config(&[("RECIPIENTS", "1"), ("DIGEST_TIME", "25:00"), ("AI_PROVIDER", "baseline")]).is_err());
        assert!(config(&[("RECIPIENTS", "1"), ("DEDUP_TTL_HOURS", "0"), ("AI_PROVIDER", "baseline")]).is_err());
    }

    #[test]
    fn optional_settings() {
        let cfg = config(&[
            ("RECIPIENTS", "1"),
            ("AI_PROVIDER", "baseline"),
            ("FEED_URLS", "https://a.example/feed, https://b.example/rss"),
            ("SECURITY_ALERTS", "off"),
            ("DEDUP_TTL_HOURS", "48"),
            ("WEBHOOK_URL", "http://localhost:3000/send"),
        ])
        .unwrap();
        assert_eq!(cfg.feed_urls.len(), 2);
        assert!(!cfg.security_alerts);
        assert_eq!(cfg.dedup_ttl_hours, Some(48));
        assert_eq!(cfg.webhook.unwrap().url, "http://localhost:3000/send");
    }
}
