use crate::types::{BotError, ParsedEntry, ParsedFeed, Result};
use crate::utils::text::html_to_text;
use chrono::Utc;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info};

/// Turns RSS, Atom or JSON Feed documents into plain-text entries.
pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| BotError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| html_to_text(&t.content))
            .filter(|t| !t.is_empty());

        let mut seen_urls = HashSet::new();
        let mut entries = Vec::new();

        for entry in feed.entries {
            if let Some(parsed_entry) = Self::parse_entry(entry) {
                if seen_urls.insert(parsed_entry.url.clone()) {
                    entries.push(parsed_entry);
                } else {
                    debug!("Skipping duplicate entry with URL: {}", parsed_entry.url);
                }
            }
        }

        info!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        let title = entry
            .title
            .map(|t| html_to_text(&t.content))
            .filter(|t| !t.is_empty());
        let Some(title) = title else {
            debug!("Skipping entry without a title: {}", entry.id);
            return None;
        };

        let url = entry.links.first()?.href.clone();

        let description = entry
            .summary
            .map(|s| html_to_text(&s.content))
            .filter(|d| !d.is_empty());

        let content = entry
            .content
            .and_then(|c| c.body)
            .map(|body| html_to_text(&body))
            .filter(|c| !c.is_empty());

        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        Some(ParsedEntry {
            url,
            title,
            description,
            content,
            published_at,
        })
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();

        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("\"https://jsonfeed.org/version/")
    }
}
