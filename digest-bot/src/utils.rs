/// Text processing utilities
pub mod text {
    use scraper::Html;

    /// Collapse every run of whitespace into a single space
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn is_kept_char(c: char) -> bool {
        c.is_alphanumeric()
            || c.is_whitespace()
            || ".,!?;:-'\"()%$&/+#@".contains(c)
            || matches!(c, '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2013}' | '\u{2014}' | '\u{20AC}' | '\u{00A3}')
    }

    /// Drop control characters and symbol noise, then normalize whitespace
    pub fn clean_text(text: &str) -> String {
        let kept: String = text.chars().filter(|c| is_kept_char(*c)).collect();
        normalize_whitespace(&kept)
    }

    /// Truncate to at most `max_chars` characters, never splitting a char
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_index, _)) => text[..byte_index].trim_end().to_string(),
            None => text.to_string(),
        }
    }

    /// Plain text of an HTML fragment such as a feed description
    pub fn html_to_text(fragment: &str) -> String {
        if !fragment.contains('<') && !fragment.contains('&') {
            return normalize_whitespace(fragment);
        }
        let parsed = Html::parse_fragment(fragment);
        let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
        normalize_whitespace(&text)
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.domain().map(|d| d.trim_start_matches("www.").to_string()))
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::text::*;
    use super::url::*;

    #[test]
    fn clean_text_strips_noise_and_whitespace() {
        assert_eq!(clean_text("Hello\u{0007}   world ★★ \n\t again."), "Hello world again.");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn html_fragments_become_plain_text() {
        assert_eq!(html_to_text("<p>New <b>AI</b> model &amp; tools</p>"), "New AI model & tools");
        assert_eq!(html_to_text("  plain   text "), "plain text");
    }

    #[test]
    fn domains_and_feed_urls() {
        assert_eq!(extract_domain("https://www.theverge.com/rss"), Some("theverge.com".to_string()));
        assert!(is_valid_feed_url("https://techcrunch.com/feed/"));
        assert!(!is_valid_feed_url("ftp://example.com/feed"));
        assert!(!is_valid_feed_url("not a url"));
    }
}
