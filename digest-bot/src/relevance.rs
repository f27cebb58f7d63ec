//! Keyword heuristic deciding which articles are worth a summarizer call.
//!
//! The combination is deliberately permissive: an irrelevant article costs
//! one summarizer call, a dropped relevant one is lost silently.

use crate::types::Article;

/// Topical keywords matched as substrings of the lowercased article text.
pub const KEYWORDS: &[&str] = &[
    // AI / ML
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "large language model",
    "llm",
    "gpt",
    "chatgpt",
    "openai",
    "anthropic",
    "claude",
    "gemini",
    "deepmind",
    "generative",
    "transformer",
    "computer vision",
    "robotics",
    "chatbot",
    "inference",
    "training data",
    // software engineering
    "software",
    "developer",
    "programming",
    "open source",
    "open-source",
    "github",
    "api",
    "kubernetes",
    "devops",
    "cloud computing",
    "database",
    "framework",
    "rust",
    "python",
    "javascript",
    "typescript",
    "cybersecurity",
    "vulnerability",
    "algorithm",
    // tech industry
    "startup",
    "funding round",
    "venture capital",
    "silicon valley",
    "semiconductor",
    "nvidia",
    "microsoft",
    "google",
    "big tech",
    "technology",
    "tech industry",
    "automation",
    "saas",
];

/// Terms that make an article relevant on the title alone. Substring
/// matches, so "GenAI" and "fintech" qualify along with some noise.
pub const HIGH_SIGNAL_TERMS: &[&str] = &[
    "ai", "software", "startup", "api", "llm", "gpt", "openai", "developer", "programming", "coding", "tech",
];

pub const MIN_KEYWORD_MATCHES: usize = 2;

/// Number of distinct keywords present in `text` (case-insensitive). A
/// keyword found only inside a longer matched keyword ("gpt" in "chatgpt",
/// "api" in "venture capital") is not counted again.
pub fn keyword_matches(text: &str) -> usize {
    let lowered = text.to_lowercase();
    let mut longest_first: Vec<&str> = KEYWORDS.to_vec();
    longest_first.sort_by_key(|keyword| std::cmp::Reverse(keyword.len()));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut count = 0;
    for keyword in longest_first {
        let spans: Vec<(usize, usize)> = lowered
            .match_indices(keyword)
            .map(|(start, found)| (start, start + found.len()))
            .collect();
        let stands_alone = spans
            .iter()
            .any(|&(start, end)| !claimed.iter().any(|&(from, to)| from <= start && end <= to));
        if stands_alone {
            count += 1;
        }
        claimed.extend(spans);
    }
    count
}

pub fn title_has_high_signal_term(title: &str) -> bool {
    let lowered = title.to_lowercase();
    HIGH_SIGNAL_TERMS.iter().any(|term| lowered.contains(term))
}

pub fn is_relevant(title: &str, content: &str, description: &str) -> bool {
    let combined = format!("{} {} {}", title, content, description);
    keyword_matches(&combined) >= MIN_KEYWORD_MATCHES || title_has_high_signal_term(title)
}

pub fn is_relevant_article(article: &Article) -> bool {
    is_relevant(&article.title, article.effective_content(), &article.description)
}
