use crate::traits::ContentEnricher;
use crate::types::{BotError, FetchConfig, PipelineLimits};
use crate::utils::text::{clean_text, truncate_chars};
use crate::Fetcher;
use async_trait::async_trait;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Article-body containers, best first. The first one whose text clears
/// `min_selector_chars` wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[itemprop='articleBody']",
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".story-body",
    "main",
    "#content",
    ".content",
];

const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "button", "svg",
    "figure",
];

/// Class or id values marking ads, comment threads and share widgets.
const NOISE_MARKERS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "advertisement",
    "sponsored",
    "comments",
    "comment-list",
    "social-share",
    "share-buttons",
    "newsletter",
    "related",
    "related-posts",
    "sidebar",
    "promo",
];

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] BotError),

    #[error("no usable article text at {url}")]
    NoContent { url: String },
}

/// Fetches the live article page and extracts its body text.
pub struct PageEnricher {
    fetcher: Fetcher,
    limits: PipelineLimits,
}

impl PageEnricher {
    pub fn new(fetch_config: FetchConfig, limits: PipelineLimits) -> crate::types::Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
            limits,
        })
    }
}

#[async_trait]
impl ContentEnricher for PageEnricher {
    async fn fetch_full_text(&self, url: &str) -> Result<String, EnrichError> {
        let html = self.fetcher.fetch_page(url).await.map_err(|e| {
            warn!("Enrichment fetch failed for {}: {}", url, e);
            EnrichError::Fetch(e)
        })?;

        match extract_article_text(&html, &self.limits) {
            Some(text) => {
                debug!("Extracted {} chars from {}", text.chars().count(), url);
                Ok(text)
            }
            None => Err(EnrichError::NoContent { url: url.to_string() }),
        }
    }
}

fn is_noise(element: &Element) -> bool {
    if STRIPPED_TAGS.contains(&element.name()) {
        return true;
    }
    let marked = |value: &str| NOISE_MARKERS.contains(&value.to_ascii_lowercase().as_str());
    element.id().is_some_and(marked) || element.classes().any(marked)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if !is_noise(el) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    clean_text(&raw)
}

fn inside_noise(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .any(|node| node.value().as_element().is_some_and(is_noise))
}

/// Pull the readable body out of an article page. Returns `None` when the
/// page yields no text at all.
pub fn extract_article_text(html: &str, limits: &PipelineLimits) -> Option<String> {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for candidate in document.select(&selector) {
            if inside_noise(&candidate) {
                continue;
            }
            let text = visible_text(candidate);
            if text.chars().count() > limits.min_selector_chars {
                debug!("Content selector '{}' matched", selector_str);
                return Some(truncate_chars(&text, limits.max_content_chars));
            }
        }
    }

    let paragraphs = Selector::parse("p").ok()?;
    let joined = document
        .select(&paragraphs)
        .filter(|p| !inside_noise(p))
        .map(visible_text)
        .filter(|text| text.chars().count() > limits.min_paragraph_chars)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return None;
    }
    Some(truncate_chars(&joined, limits.max_content_chars))
}
