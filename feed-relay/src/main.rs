use anyhow::{Context, Result};
use clap::Parser;
use feed_relay::{parse_items, DedupGuard, Dispatcher, FeedPipeline, LogPublisher, RelayConfig, SourceKind};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turn a webhook batch of feed items into social posts.
#[derive(Debug, Parser)]
#[command(name = "feed-relay", version)]
struct Cli {
    /// Source kind the batch came from
    #[arg(value_enum)]
    kind: SourceKind,

    /// Webhook body `{ "items": [...] }`; `-` reads stdin
    #[arg(long, default_value = "-")]
    items: String,

    /// JSON config file (defaults to $FEED_RELAY_CONFIG, then built-in tables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the payloads through the dispatcher with a logging publisher
    #[arg(long)]
    publish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RelayConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => RelayConfig::from_env().context("loading config from environment")?,
    };
    let pipeline = FeedPipeline::from_config(&config).context("building pipeline")?;

    let raw = read_body(&cli.items)?;
    let body: serde_json::Value = serde_json::from_str(&raw).context("webhook body is not JSON")?;
    let items = parse_items(&body)?;
    info!("POST at {} with {} items", cli.kind.endpoint(), items.len());

    let outgoing = pipeline.process(cli.kind, &items).await;
    println!("{}", serde_json::to_string_pretty(&outgoing)?);

    if cli.publish {
        let dispatcher = Dispatcher::new(Arc::new(LogPublisher), Arc::new(DedupGuard::new()));
        let outcome = dispatcher.dispatch(&outgoing).await?;
        info!("Dispatch finished: {:?}", outcome);
    }
    Ok(())
}

fn read_body(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).context("reading stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))
    }
}
