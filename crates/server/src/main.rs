use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube_mcp::{init_toolsets, McpServer, SERVER_NAME};
use kube_mcp_core::KubeClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod config;
mod logging;
mod signal;
mod supervisor;
mod transport;

use config::{GlobalArgs, RunConfig};
use supervisor::Outcome;
use transport::{SseConfig, Transport};

#[derive(Parser, Debug)]
#[command(name = "kubernetes-mcp-server", version)]
#[command(about = "Kubernetes MCP Server", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the server on stdin/stdout
    Stdio,

    /// Start the server as an HTTP listener with Server-Sent Events
    Sse {
        /// Address to bind
        #[arg(long, env = "K8S_SSE_ADDRESS", default_value = "127.0.0.1:8080")]
        address: SocketAddr,

        /// Base URL advertised to clients
        #[arg(long, env = "K8S_SSE_BASE_URL", default_value = "http://localhost:8080")]
        base_url: String,
    },
}

impl Command {
    fn into_transport(self) -> Transport {
        match self {
            Self::Stdio => Transport::Stdio,
            Self::Sse { address, base_url } => Transport::Sse(SseConfig { address, base_url }),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A stdin read may still be pending after shutdown, so exit explicitly
    // instead of waiting for the runtime to drop it.
    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Failed to run server: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::load(&cli.global)?;
    logging::init(config.log_file.as_deref())?;

    let transport = cli.command.into_transport();
    tracing::info!(
        transport = transport.name(),
        toolsets = ?config.toolsets,
        read_only = config.read_only,
        "Starting Kubernetes MCP Server"
    );

    let client = KubeClient::from_kubeconfig(config.kubeconfig.as_deref())
        .context("failed to create Kubernetes client")?;
    tracing::debug!(server = %client.server(), "Kubernetes client ready");

    let toolsets = init_toolsets(config.toolsets.as_slice(), config.read_only, Arc::new(client))
        .context("failed to initialize toolsets")?;

    let mut server = McpServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION"));
    toolsets
        .register_tools(&mut server)
        .context("failed to register tools")?;
    let server = Arc::new(server);

    let shutdown = CancellationToken::new();
    let _signals = signal::cancel_on_signal(shutdown.clone());

    eprintln!("Kubernetes MCP Server is running on {}", transport.name());

    let outcome = supervisor::supervise(transport.serve(server, shutdown.clone()), shutdown).await?;
    if outcome == Outcome::Cancelled {
        tracing::debug!("Shutdown complete");
    }

    Ok(())
}
