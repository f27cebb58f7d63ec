mod common;

use chrono::Duration;
use common::{entry, init_tracing, RecordingChannel, ScriptedSummarizer, StaticFeed, StubEnricher, BORING_BODY};
use rss_digest_bot::{DeliveryMode, DigestPipeline, PipelineBuilder, PipelineLimits, RunOutcome};
use std::sync::Arc;

fn feed(name: &str, relevant_title: &str) -> StaticFeed {
    let slug = name.to_lowercase();
    StaticFeed::new(
        &format!("https://{}.example/feed", slug),
        name,
        vec![
            entry(&format!("https://{}.example/1", slug), relevant_title, BORING_BODY, Duration::hours(1)),
            entry(&format!("https://{}.example/2", slug), "Local bakery wins bread contest", BORING_BODY, Duration::hours(2)),
            entry(&format!("https://{}.example/3", slug), "Town parade returns", BORING_BODY, Duration::hours(3)),
        ],
    )
}

fn pipeline(
    summarizer: Arc<ScriptedSummarizer>,
    channel: Arc<RecordingChannel>,
    fallback: Option<Arc<RecordingChannel>>,
    recipients: &[&str],
) -> DigestPipeline {
    let mut builder = PipelineBuilder::new(summarizer, channel)
        .enricher(Arc::new(StubEnricher::default()))
        .limits(PipelineLimits::default().without_delays())
        .recipients(recipients.iter().map(|r| r.to_string()).collect())
        .add_source(Box::new(feed("Alpha", "OpenAI releases a developer API")))
        .add_source(Box::new(feed("Beta", "Startup raises money for robots")));
    if let Some(fallback) = fallback {
        builder = builder.fallback_channel(fallback);
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn end_to_end_broadcast() {
    init_tracing();

    let summarizer = Arc::new(ScriptedSummarizer::default());
    let channel = Arc::new(RecordingChannel::default());
    let recipients = ["1@c.us", "2@c.us", "3@c.us"];
    let pipeline = pipeline(summarizer.clone(), channel.clone(), None, &recipients);

    let outcome = pipeline.run(DeliveryMode::Broadcast).await;
    let RunOutcome::Delivered {
        report,
        articles,
        summaries,
    } = outcome
    else {
        panic!("expected a delivered digest");
    };

    assert_eq!(articles, 6);
    assert_eq!(summaries, 2);
    assert_eq!(summarizer.call_count(), 2);
    assert_eq!(report.total, recipients.len());
    assert_eq!(report.sent, recipients.len());

    let messages = channel.messages();
    assert_eq!(messages.len(), 3);
    let text = &messages[0].1;
    assert!(text.contains("OpenAI releases a developer API"));
    assert!(text.contains("Startup raises money for robots"));
    assert!(!text.contains("bakery"));
    assert!(messages.iter().all(|(_, t)| t == text));

    let last = pipeline.last_run().await.unwrap();
    assert_eq!(last.outcome, "delivered");
    assert_eq!(last.summaries, 2);
    assert_eq!(last.sent, 3);
}

#[tokio::test]
async fn nothing_relevant_sends_nothing() {
    init_tracing();

    let summarizer = Arc::new(ScriptedSummarizer::default());
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = PipelineBuilder::new(summarizer.clone(), channel.clone())
        .enricher(Arc::new(StubEnricher::default()))
        .limits(PipelineLimits::default().without_delays())
        .recipients(vec!["1@c.us".to_string()])
        .add_source(Box::new(StaticFeed::new(
            "https://quiet.example/feed",
            "Quiet",
            vec![entry("https://quiet.example/1", "Town parade returns", BORING_BODY, Duration::hours(1))],
        )))
        .build()
        .unwrap();

    let outcome = pipeline.run(DeliveryMode::Broadcast).await;
    assert!(matches!(outcome, RunOutcome::NothingToReport { articles: 1 }));
    assert_eq!(summarizer.call_count(), 0);
    assert!(channel.messages().is_empty());
    assert_eq!(pipeline.last_run().await.unwrap().outcome, "nothing to report");
}

#[tokio::test]
async fn total_delivery_failure_goes_to_the_fallback() {
    init_tracing();

    let channel = Arc::new(RecordingChannel::broken());
    let fallback = Arc::new(RecordingChannel::default());
    let pipeline = pipeline(
        Arc::new(ScriptedSummarizer::default()),
        channel,
        Some(fallback.clone()),
        &["1@c.us", "2@c.us"],
    );

    let outcome = pipeline.run(DeliveryMode::Broadcast).await;
    match &outcome {
        RunOutcome::Delivered { report, .. } => assert!(report.all_failed()),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(outcome.label(), "delivery failed");

    let surfaced = fallback.messages();
    assert_eq!(surfaced.len(), 1);
    assert!(surfaced[0].1.contains("OpenAI releases a developer API"));
}

#[tokio::test]
async fn direct_mode_replies_only_to_the_requester() {
    init_tracing();

    let channel = Arc::new(RecordingChannel::default());
    let pipeline = pipeline(
        Arc::new(ScriptedSummarizer::default()),
        channel.clone(),
        None,
        &["1@c.us", "2@c.us"],
    );

    let outcome = pipeline.run(DeliveryMode::Direct("9@c.us".to_string())).await;
    assert!(matches!(outcome, RunOutcome::Delivered { .. }));

    let messages = channel.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "9@c.us");
    assert!(messages[0].1.starts_with("📰"));
}

#[tokio::test]
async fn delivered_links_are_skipped_on_the_next_run_when_dedup_is_on() {
    init_tracing();

    let summarizer = Arc::new(ScriptedSummarizer::default());
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = PipelineBuilder::new(summarizer.clone(), channel.clone())
        .enricher(Arc::new(StubEnricher::default()))
        .limits(PipelineLimits::default().without_delays())
        .recipients(vec!["1@c.us".to_string()])
        .dedup_ttl(Some(Duration::hours(48)))
        .add_source(Box::new(feed("Alpha", "OpenAI releases a developer API")))
        .build()
        .unwrap();

    assert!(matches!(
        pipeline.run(DeliveryMode::Broadcast).await,
        RunOutcome::Delivered { summaries: 1, .. }
    ));
    assert!(matches!(
        pipeline.run(DeliveryMode::Broadcast).await,
        RunOutcome::NothingToReport { articles: 2 }
    ));
    assert_eq!(summarizer.call_count(), 1);
}

#[tokio::test]
async fn concurrent_triggers_run_one_after_the_other() {
    init_tracing();

    let summarizer = Arc::new(ScriptedSummarizer::default());
    let channel = Arc::new(RecordingChannel::default());
    let pipeline = Arc::new(pipeline(summarizer.clone(), channel.clone(), None, &["1@c.us"]));

    let (first, second) = tokio::join!(
        pipeline.run(DeliveryMode::Broadcast),
        pipeline.run(DeliveryMode::Direct("9@c.us".to_string()))
    );
    assert!(matches!(first, RunOutcome::Delivered { .. }));
    assert!(matches!(second, RunOutcome::Delivered { .. }));
    assert_eq!(summarizer.call_count(), 4);
    assert_eq!(channel.messages().len(), 2);
}
