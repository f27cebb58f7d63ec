use crate::types::SummaryResult;
use chrono::{DateTime, Utc};

/// Formats summaries into the single message sent to recipients.
///
/// Summaries are written in the order given; ordering and capping belong to
/// the summarization gateway.
#[derive(Debug, Clone)]
pub struct DigestComposer {
    heading: String,
}

impl DigestComposer {
    pub fn new(heading: impl Into<String>) -> Self {
        Self { heading: heading.into() }
    }

    pub fn compose(&self, summaries: &[SummaryResult], date_label: &str) -> String {
        let mut digest = String::new();
        digest.push_str(&format!("📰 *{}*\n📅 {}\n\n", self.heading, date_label));

        for (i, summary) in summaries.iter().enumerate() {
            digest.push_str(&format!("*{}. {}*\n", i + 1, summary.title));
            digest.push_str(&format!("📌 {}\n", summary.source));
            digest.push_str(&format!("{}\n", summary.summary_text));
            digest.push_str(&format!("🔗 {}\n\n", summary.link));
        }

        digest.push_str(&format!("_{} stories summarized_", summaries.len()));
        digest
    }

    pub fn compose_empty(&self, date_label: &str) -> String {
        format!(
            "📰 *{}*\n📅 {}\n\nNo relevant stories were published in the last couple of days.",
            self.heading, date_label
        )
    }
}

impl Default for DigestComposer {
    fn default() -> Self {
        Self::new("Daily Tech Digest")
    }
}

pub fn date_label(now: DateTime<Utc>) -> String {
    now.format("%A, %B %-d, %Y").to_string()
}
