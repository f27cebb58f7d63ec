use anyhow::Result;
use async_trait::async_trait;

use crate::defs::Summarizer;

const SENTENCE_COUNT: usize = 2;
const MAX_SUMMARY_CHARS: usize = 400;

/// Extractive summarizer that needs no provider: the first sentences of the
/// content, or the title when there is no content at all.
pub struct BaselineSummarizer;

fn leading_sentences(content: &str, count: usize) -> String {
    let mut out = String::new();
    let mut taken = 0;
    for piece in content.split_inclusive(['.', '!', '?']) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
        taken += 1;
        if taken == count {
            break;
        }
    }
    out
}

#[async_trait]
impl Summarizer for BaselineSummarizer {
    fn provider_name(&self) -> String {
        "baseline".to_owned()
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
        if content.is_empty() {
            if title.trim().is_empty() {
                anyhow::bail!("nothing to summarize");
            }
            return Ok(title.trim().to_owned());
        }
        let summary = leading_sentences(&content, SENTENCE_COUNT);
        Ok(summary.chars().take(MAX_SUMMARY_CHARS).collect())
    }
}
