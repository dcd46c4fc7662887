use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bsky_announce::bluesky::{BskyClient, Publisher, SimulatedPublisher, DEFAULT_PDS_URL};
use bsky_announce::candidates;
use bsky_announce::marker::FrontMatterStore;
use bsky_announce::pipeline::{self, RunOptions};

/// Announce newly published pages on Bluesky and mark them in their front
/// matter so they are never announced twice.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// PDS URL for the Bluesky account
    #[arg(short = 'p', long, default_value = DEFAULT_PDS_URL)]
    pds_url: String,

    /// Bluesky account identifier
    #[arg(short = 'u', long)]
    username: String,

    /// App password for the account
    #[arg(short = 'w', long, env = "APP_PASSWORD", hide_env_values = true)]
    app_password: String,

    /// Path to the `hugo list published` CSV; reads stdin when omitted
    #[arg(short = 'f', long)]
    hugo_list_csv: Option<PathBuf>,

    /// Directory the CSV page paths are relative to
    #[arg(long, default_value = "..")]
    content_root: PathBuf,

    /// Print composed records to stdout instead of submitting them
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, still write markers using a placeholder URI
    #[arg(long)]
    simulate_push: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    // Load (and validate) the full candidate list before touching the network.
    let candidates = candidates::load_source(args.hugo_list_csv.as_deref())?;
    info!(count = candidates.len(), "loaded candidates");

    let store = FrontMatterStore::new(&args.content_root);

    let mut publisher: Box<dyn Publisher> = if args.dry_run {
        Box::new(SimulatedPublisher)
    } else {
        Box::new(BskyClient::new(&args.pds_url)?)
    };
    if !args.dry_run {
        publisher
            .authenticate(&args.username, &args.app_password)
            .await?;
    }

    let opts = RunOptions {
        dry_run: args.dry_run,
        simulate_push: args.simulate_push,
    };
    let summary = pipeline::run(candidates, &store, publisher.as_ref(), opts).await?;
    info!(
        announced = summary.announced,
        skipped = summary.skipped,
        previewed = summary.previewed,
        "run complete"
    );

    Ok(())
}
