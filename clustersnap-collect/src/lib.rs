//! Library module for clustersnap-collect
//!
//! This module exposes the CLI definition and the collection flow for
//! testing purposes. The binary entry point is in main.rs.

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use clustersnap_core::{
    GatherUnit, Gatherer, GatherRunner, RunnerConfig, error::redact_url, write_archive_dir,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "clustersnap-collect")]
#[command(about = "Anonymized cluster configuration snapshot tool")]
#[command(version)]
#[command(long_about = "
clustersnap collector - anonymized cluster configuration snapshots

Reads cluster configuration objects from the API server, masks sensitive
fields, and writes one JSON file per object into an archive directory.

Missing objects are skipped silently. A gatherer that fails is recorded in
clustersnap/failures.json and never stops the other gatherers.

EXAMPLES:
  clustersnap-collect
  clustersnap-collect --kubeconfig ~/.kube/config --output snapshot
  clustersnap-collect --disable clusterconfig/netnamespaces --timeout 30
  clustersnap-collect list
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub collect: CollectArgs,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available gatherers
    List,
}

/// Options of a collection run
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Path to the kubeconfig file, or a path list merged in order
    #[arg(
        long,
        value_name = "FILE",
        help = "Kubeconfig file or path list (defaults to $KUBECONFIG, in-cluster or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    /// Output directory
    #[arg(
        short,
        long,
        default_value = "clustersnap-archive",
        help = "Directory the archive is written to"
    )]
    pub output: PathBuf,

    /// Per-gatherer timeout in seconds
    #[arg(
        long,
        default_value = "60",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Deadline for each gatherer, in seconds"
    )]
    pub timeout: u64,

    /// Maximum concurrent gatherers
    #[arg(
        long,
        default_value = "4",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Maximum number of gatherers running at once"
    )]
    pub concurrency: u64,

    /// Gatherers to skip
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated gatherer ids or id prefixes to skip"
    )]
    pub disable: Vec<String>,
}

/// Global flags
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,
}

impl CollectArgs {
    /// Builds the runner configuration from the CLI options.
    ///
    /// # Errors
    /// Returns an error when the resulting configuration is invalid.
    pub fn runner_config(&self) -> anyhow::Result<RunnerConfig> {
        let config = RunnerConfig::new()
            .with_max_concurrency(usize::try_from(self.concurrency).unwrap_or(usize::MAX))
            .with_unit_timeout(Duration::from_secs(self.timeout))
            .with_disabled(self.disable.clone());
        config.validate()?;
        Ok(config)
    }
}

/// Outcome of a collection run, as reported to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    /// Files written into the output directory
    pub files_written: usize,
    /// Gatherers that ran
    pub gatherers_run: usize,
    /// Failures recorded in the archive
    pub failures: usize,
}

/// Loads the API client configuration.
///
/// An explicit kubeconfig wins. It may be a path list in `KUBECONFIG`
/// syntax, merged in order. Otherwise `KUBECONFIG`, the in-cluster
/// environment and the default kubeconfig location are tried.
///
/// # Errors
/// Returns an error when no usable configuration can be found.
pub async fn load_kube_config(kubeconfig: Option<&Path>) -> anyhow::Result<kube::Config> {
    let config = match kubeconfig {
        Some(paths) => {
            let kubeconfig = read_kubeconfigs(paths)?;
            let options = kube::config::KubeConfigOptions::default();
            kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .with_context(|| format!("Failed to load kubeconfig {}", paths.display()))?
        }
        None => kube::Config::infer()
            .await
            .context("Failed to infer cluster configuration")?,
    };

    info!("Target: {}", redact_url(&config.cluster_url.to_string()));
    Ok(config)
}

/// Reads every file of a kubeconfig path list and merges them in order.
fn read_kubeconfigs(paths: &Path) -> anyhow::Result<kube::config::Kubeconfig> {
    let mut merged: Option<kube::config::Kubeconfig> = None;
    for path in std::env::split_paths(paths.as_os_str()) {
        if path.as_os_str().is_empty() {
            continue;
        }
        let next = kube::config::Kubeconfig::read_from(&path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
        merged = Some(match merged {
            Some(current) => current
                .merge(next)
                .with_context(|| format!("Failed to merge kubeconfig {}", path.display()))?,
            None => next,
        });
    }
    merged.with_context(|| format!("No kubeconfig files in {}", paths.display()))
}

/// Runs `units` and writes the archive below `output`.
///
/// Gatherer failures are recorded in the archive and do not fail the run.
///
/// # Errors
/// Returns an error only when the archive cannot be written.
pub async fn collect(
    gatherer: &Gatherer,
    units: &[Box<dyn GatherUnit>],
    config: RunnerConfig,
    output: &Path,
) -> anyhow::Result<CollectSummary> {
    info!("Output: {}", output.display());

    let report = GatherRunner::new(config).run(gatherer, units).await;
    let gatherers_run = report.metadata.units_run;

    let bundle = report.into_archive(gatherer.context());
    for failure in &bundle.failures {
        warn!("{}: {}", failure.gatherer, failure.error_message);
    }

    let files_written = write_archive_dir(output, &bundle)
        .await
        .with_context(|| format!("Failed to write archive to {}", output.display()))?;

    Ok(CollectSummary {
        files_written,
        gatherers_run,
        failures: bundle.failures.len(),
    })
}

/// Ids of `units`, in registry order.
pub fn gatherer_ids(units: &[Box<dyn GatherUnit>]) -> Vec<&'static str> {
    units.iter().map(|unit| unit.id()).collect()
}
