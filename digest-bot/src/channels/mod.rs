pub mod log_channel;
pub mod webhook;

pub use log_channel::LogChannel;
pub use webhook::WebhookChannel;
