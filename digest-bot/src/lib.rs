pub mod aggregator;
pub mod app;
pub mod channels;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dedup;
pub mod delivery;
pub mod digest;
pub mod enricher;
pub mod fetcher;
pub mod llm_adapter;
pub mod parser;
pub mod pipeline;
pub mod recipients;
pub mod relevance;
pub mod scheduler;
pub mod sources;
pub mod summarization;
pub mod traits;
pub mod types;
pub mod utils;

pub use types::*;
pub use aggregator::FeedAggregator;
pub use app::{AppOptions, BotApp};
pub use commands::{Command, CommandReply, CommandRouter};
pub use config::{BotConfig, ConfigError};
pub use connection::{ConnectionManager, ConnectionSnapshot, ConnectionState, DisconnectReason, ReconnectPolicy};
pub use delivery::DeliveryCoordinator;
pub use digest::DigestComposer;
pub use enricher::{EnrichError, PageEnricher};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use pipeline::{DeliveryMode, DigestPipeline, PipelineBuilder, RunOutcome, RunSummary};
pub use recipients::RecipientDirectory;
pub use summarization::SummarizationGateway;
pub use traits::{ContentEnricher, PullFeed};
