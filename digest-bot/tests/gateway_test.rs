mod common;

use chrono::Duration;
use common::{article, init_tracing, ScriptedSummarizer, BORING_BODY, RELEVANT_BODY};
use rss_digest_bot::{Article, PipelineLimits, SummarizationGateway};
use std::sync::Arc;

fn gateway(summarizer: Arc<ScriptedSummarizer>) -> SummarizationGateway {
    SummarizationGateway::new(summarizer, PipelineLimits::default().without_delays())
}

#[tokio::test]
async fn summarizer_calls_are_capped() {
    init_tracing();

    let articles: Vec<Article> = (0..50)
        .map(|i| article(i, &format!("Story {}", i), RELEVANT_BODY, Duration::minutes(i as i64)))
        .collect();
    let summarizer = Arc::new(ScriptedSummarizer::default());

    let summaries = gateway(summarizer.clone()).summarize_all(&articles).await;
    assert_eq!(summarizer.call_count(), 10);
    assert_eq!(summaries.len(), 10);
    // newest first
    assert_eq!(summaries[0].title, "Story 0");
    assert_eq!(summaries[9].title, "Story 9");
}

#[tokio::test]
async fn one_failure_does_not_stop_the_rest() {
    init_tracing();

    let articles: Vec<Article> = (1..=5)
        .map(|i| article(i, &format!("Story {}", i), RELEVANT_BODY, Duration::minutes(i as i64)))
        .collect();
    let summarizer = Arc::new(ScriptedSummarizer::failing_on(&[3]));

    let summaries = gateway(summarizer.clone()).summarize_all(&articles).await;
    assert_eq!(summarizer.call_count(), 5);
    let titles: Vec<&str> = summaries.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Story 1", "Story 2", "Story 4", "Story 5"]);
}

#[tokio::test]
async fn nothing_relevant_means_no_calls() {
    init_tracing();

    let articles = vec![
        article(1, "Local bakery wins bread contest", BORING_BODY, Duration::hours(1)),
        article(2, "Town parade returns", BORING_BODY, Duration::hours(2)),
    ];
    let summarizer = Arc::new(ScriptedSummarizer::default());

    let summaries = gateway(summarizer.clone()).summarize_all(&articles).await;
    assert!(summaries.is_empty());
    assert_eq!(summarizer.call_count(), 0);

    let summaries = gateway(summarizer.clone()).summarize_all(&[]).await;
    assert!(summaries.is_empty());
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn summaries_carry_article_fields_and_trimmed_text() {
    init_tracing();

    let articles = vec![
        article(1, "Local bakery wins bread contest", BORING_BODY, Duration::hours(1)),
        article(2, "OpenAI opens a new developer API", "", Duration::hours(2)),
    ];
    let summarizer = Arc::new(ScriptedSummarizer::default());

    let summaries = gateway(summarizer).summarize_all(&articles).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].link, "https://news.example/2");
    assert_eq!(summaries[0].source, "Example News");
    assert_eq!(summaries[0].summary_text, "Summary of OpenAI opens a new developer API.");
}

#[tokio::test]
async fn summarizer_calls_are_paced() {
    init_tracing();

    let articles: Vec<Article> = (0..3)
        .map(|i| article(i, &format!("Story {}", i), RELEVANT_BODY, Duration::minutes(i as i64)))
        .collect();
    let summarizer = Arc::new(ScriptedSummarizer::default());
    let limits = PipelineLimits {
        summarize_delay: std::time::Duration::from_millis(40),
        ..PipelineLimits::default()
    };

    let started = std::time::Instant::now();
    let summaries = SummarizationGateway::new(summarizer.clone(), limits).summarize_all(&articles).await;
    assert_eq!(summaries.len(), 3);
    assert_eq!(summarizer.call_count(), 3);
    // two pauses between three calls
    assert!(started.elapsed() >= std::time::Duration::from_millis(80));
}
