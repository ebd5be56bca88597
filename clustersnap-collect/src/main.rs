//! Cluster configuration snapshot tool.
//!
//! This binary reads cluster configuration objects from the API server,
//! masks their sensitive fields, and writes them into an archive directory.
//!
//! # Security Guarantees
//! - Read-only API operations only
//! - Sensitive fields masked before anything is written
//! - No credentials stored or logged

use clap::Parser;
use clustersnap_collect::{Cli, Command, collect, gatherer_ids, load_kube_config};
use clustersnap_core::{GatherContext, Gatherer, default_units, init_logging};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let units = default_units();

    if let Some(Command::List) = cli.command {
        for id in gatherer_ids(&units) {
            println!("{id}");
        }
        return Ok(());
    }

    let config = cli.collect.runner_config()?;
    let kube_config = load_kube_config(cli.collect.kubeconfig.as_deref())
        .await
        .inspect_err(|e| error!("{:#}", e))?;

    let ctx = GatherContext::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining gatherers");
            interrupt.cancel();
        }
    });

    let gatherer = Gatherer::new(kube_config, ctx);
    let summary = collect(&gatherer, &units, config, &cli.collect.output).await?;

    info!(
        "✓ Snapshot written: {} files from {} gatherers, {} failures",
        summary.files_written, summary.gatherers_run, summary.failures
    );

    Ok(())
}
