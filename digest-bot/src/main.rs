use clap::{Parser, Subcommand};
use rss_digest_bot::{AppOptions, BotApp, BotConfig, RunOutcome};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rss-digest-bot")]
#[command(about = "Daily AI-summarized tech news digest for chat recipients")]
struct Cli {
    /// Summarizer to use instead of AI_PROVIDER (openai, gemini, baseline)
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one broadcast digest now
    Run {
        /// Log the digest instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Connect, schedule the daily digest and read commands from stdin
    Serve,
    /// Dispatch a single command as if sent by <from>
    Command {
        #[arg(long)]
        from: String,
        text: Vec<String>,
    },
    /// Pull every configured feed and report item counts
    CheckFeeds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BotConfig::from_env_with_provider(cli.provider.as_deref()).map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let dry_run = matches!(cli.command, Commands::Run { dry_run: true });
    let app = BotApp::new(config, AppOptions { dry_run })?;

    match cli.command {
        Commands::Run { .. } => match app.run_once().await {
            RunOutcome::Delivered { report, summaries, .. } => {
                info!("Delivered {} stories: {}/{} sends succeeded", summaries, report.sent, report.total);
            }
            RunOutcome::NothingToReport { articles } => {
                info!("Nothing to report ({} articles checked)", articles);
            }
        },
        Commands::Serve => app.serve().await?,
        Commands::Command { from, text } => {
            let identity = rss_digest_bot::recipients::normalize_identity("--from", &from)?;
            match app.command(&identity, &text.join(" ")).await {
                Some(reply) => println!("{}", reply.text),
                None => println!("{} is not authorized to issue commands", identity),
            }
        }
        Commands::CheckFeeds => {
            for check in app.check_feeds().await {
                match check.result {
                    Ok(count) => println!(
                        "✓ {} ({}): {} items",
                        check.url,
                        check.title.unwrap_or_else(|| "untitled".to_string()),
                        count
                    ),
                    Err(e) => println!("✗ {}: {}", check.url, e),
                }
            }
        }
    }

    Ok(())
}
