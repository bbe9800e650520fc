//! spreadd: run the controller spread filter outside a scheduler.
//!
//! Loads Kubernetes objects into a local cluster index and evaluates one
//! pending pod against a set of candidate nodes, the way a scheduling cycle
//! would: one concurrent evaluation per node, all sharing a single filter.
//!
//! # Usage
//!
//! ```text
//! spreadd import --data-dir /var/lib/spreadd cluster.json
//! spreadd filter --data-dir /var/lib/spreadd --namespace default --pod web-7c9d-x2 \
//!     --node worker-1 --node worker-2 --node worker-3
//! ```

mod evaluate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use spread_filter::{ControllerSpreadFilter, CycleContext, FilterConfig};
use spread_index::ClusterIndex;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,spreadd=debug,spread_filter=debug";
const INDEX_FILE: &str = "cluster.redb";

#[derive(Parser)]
#[command(name = "spreadd", about = "Controller spread filter harness")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load pods and workload controllers from a JSON manifest.
    Import {
        /// Directory holding the cluster index.
        #[arg(long, default_value = "/var/lib/spreadd")]
        data_dir: PathBuf,

        /// JSON array, `kind: List`, or single object.
        manifest: PathBuf,
    },

    /// Evaluate a pod against candidate nodes.
    Filter {
        /// Directory holding the cluster index.
        #[arg(long, default_value = "/var/lib/spreadd")]
        data_dir: PathBuf,

        /// Namespace of the pod being scheduled.
        #[arg(long, default_value = "default")]
        namespace: String,

        /// Name of the pod being scheduled.
        #[arg(long)]
        pod: String,

        /// Candidate node (repeatable).
        #[arg(long = "node", required = true)]
        nodes: Vec<String>,

        /// Filter config (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Import { data_dir, manifest } => run_import(&data_dir, &manifest),
        Command::Filter {
            data_dir,
            namespace,
            pod,
            nodes,
            config,
        } => run_filter(&data_dir, &namespace, &pod, nodes, config.as_deref()).await,
    }
}

fn open_index(data_dir: &Path) -> anyhow::Result<ClusterIndex> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db_path = data_dir.join(INDEX_FILE);
    let index = ClusterIndex::open(&db_path)?;
    info!(path = ?db_path, "cluster index opened");
    Ok(index)
}

fn run_import(data_dir: &Path, manifest: &Path) -> anyhow::Result<()> {
    let index = open_index(data_dir)?;
    let bytes = std::fs::read(manifest)
        .with_context(|| format!("reading manifest {}", manifest.display()))?;
    let summary = index.import_manifest(&bytes)?;
    info!(
        pods = summary.pods,
        controllers = summary.controllers,
        skipped = summary.skipped,
        "manifest imported"
    );
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

async fn run_filter(
    data_dir: &Path,
    namespace: &str,
    pod_name: &str,
    nodes: Vec<String>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let index = open_index(data_dir)?;
    let pod = index
        .get_pod(namespace, pod_name)?
        .with_context(|| format!("pod {namespace}/{pod_name} not found in index"))?;

    let config = match config_path {
        Some(path) => FilterConfig::from_file(path)?,
        None => FilterConfig::default(),
    };

    let index = Arc::new(index);
    let filter = Arc::new(ControllerSpreadFilter::new(config, index.clone(), index)?);
    info!(filter = filter.name(), nodes = nodes.len(), "evaluating candidate nodes");

    // The sender stays alive for the whole cycle; dropping it would cancel.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let cancel_tx = Arc::new(cancel_tx);
    let signal_tx = cancel_tx.clone();
    let signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, cancelling cycle");
                let _ = signal_tx.send(true);
            }
            Err(e) => warn!(error = %e, "could not install interrupt handler"),
        }
    });

    let ctx = CycleContext::new().with_cancel(cancel_rx);
    let results = evaluate::evaluate_nodes(filter, ctx, Arc::new(pod), nodes).await?;
    signal.abort();
    drop(cancel_tx);

    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}
