pub mod baseline;
pub mod defs;

pub use baseline::BaselineSummarizer;
pub use defs::{Article, DeliveryOutcome, InboundMessage, MessageChannel, Summarizer, SummaryResult};
