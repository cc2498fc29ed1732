use chrono::Utc;
use clap::Parser;
use raft_proxy::{ClusterMember, ProxyConfig, ProxyOptions};
use slog::Drain;
use std::error::Error;
use std::fs::OpenOptions;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

/// Routes commands to the leader of a Raft cluster and fans log reads out to every node.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address callers reach the proxy on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// RPC address of a cluster node. Repeat once per node; the order defines node ids.
    #[arg(long = "node", required = true)]
    nodes: Vec<SocketAddr>,

    /// Deadline for a whole write, retries included.
    #[arg(long)]
    write_timeout_ms: Option<u64>,

    /// Deadline for a fan-out log read.
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Write logs to a timestamped file in this directory instead of the terminal.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let logger = match &cli.log_dir {
        Some(directory) => create_root_logger_for_file(directory)?,
        None => create_root_logger_for_stdout(),
    };

    let read_timeout = cli.read_timeout_ms.map(Duration::from_millis);
    let proxy = raft_proxy::try_create_proxy(ProxyConfig {
        listen_addr: cli.listen,
        cluster_members: cli.nodes.into_iter().map(ClusterMember::from).collect(),
        info_logger: logger.clone(),
        options: ProxyOptions {
            write_timeout: cli.write_timeout_ms.map(Duration::from_millis),
            read_node_timeout: read_timeout,
            read_overall_timeout: read_timeout,
            ..ProxyOptions::default()
        },
    })
    .await?;

    let handle = proxy.serve()?;
    slog::info!(logger, "Launched http server on {}", handle.local_addr());

    wait_for_shutdown_signal().await?;

    slog::info!(logger, "Shutting down http server");
    handle.shutdown().await;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

fn create_root_logger_for_file(directory: &Path) -> io::Result<slog::Logger> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let log_path = directory.join(format!("{}_proxy.log", now));
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!()))
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
