use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argo_mcp_api::ArgoClient;
use argo_mcp_server::config::ArgoMcpConfig;
use argo_mcp_server::{
    ArgoToolServices, McpHttpServer, ObserveOptions, WatchTarget, load_config, load_config_from_path, observe, render_narrative,
    resolve_bind_address, serve_stdio,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MCP server for Argo Workflows.
#[derive(Debug, Parser)]
#[command(name = "argo-mcp", version, about)]
struct Cli {
    /// Configuration file. Defaults to $ARGO_MCP_CONFIG_PATH or <config_dir>/argo-mcp/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP tools over stdio or streamable HTTP.
    Serve(ServeArgs),
    /// Block until a workflow finishes and print its final state.
    Wait(ObserveArgs),
    /// Follow a workflow's events until it finishes.
    Watch(ObserveArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,
    /// Loopback address for the HTTP transport, for example 127.0.0.1:62890.
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Args)]
struct ObserveArgs {
    /// Workflow name.
    name: String,
    #[arg(short, long)]
    namespace: Option<String>,
    /// Overall deadline such as 30s, 10m or 1h30m.
    #[arg(long)]
    timeout: Option<String>,
    /// Print the structured record instead of the narrative.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
    .context("failed to load argo-mcp configuration")?;
    let client = ArgoClient::new(config.argo_server.client_settings()).context("failed to build Argo Server client")?;
    info!(server = %client.base_url(), namespace = %config.argo_server.namespace, "using Argo Server");
    let services = Arc::new(ArgoToolServices::new(Arc::new(client), config.argo_server.namespace.clone()));

    match cli.command {
        Command::Serve(args) => run_serve(&config, services, args).await,
        Command::Wait(args) => run_observe(&services, args, ObserveOptions::wait()).await,
        Command::Watch(args) => run_observe(&services, args, ObserveOptions::watch()).await,
    }
}

/// Logs go to stderr; stdout carries the stdio transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_serve(config: &ArgoMcpConfig, services: Arc<ArgoToolServices>, args: ServeArgs) -> Result<()> {
    let shutdown = cancel_on_interrupt();
    match args.transport {
        Transport::Stdio => serve_stdio(services, shutdown).await.context("stdio MCP server failed"),
        Transport::Http => {
            let bind = args.bind.as_deref().or(config.http_server.bind_address.as_deref());
            let address = resolve_bind_address(bind)?;
            let running = McpHttpServer::new(address, services)
                .start()
                .await
                .context("failed to start MCP HTTP server")?;
            info!(address = %running.bound_address(), "serving MCP over HTTP; press Ctrl-C to stop");
            shutdown.cancelled().await;
            running.stop().await.context("failed to stop MCP HTTP server")
        }
    }
}

async fn run_observe(services: &ArgoToolServices, args: ObserveArgs, options: ObserveOptions) -> Result<()> {
    let namespace = services.namespace(args.namespace.as_deref());
    let target = WatchTarget::parse(&args.name, &namespace, args.timeout.as_deref())?;
    let cancellation = cancel_on_interrupt();
    let record = observe(services.backend(), &target, options, &cancellation)
        .await
        .with_context(|| format!("failed to observe workflow {namespace}/{}", target.name()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render_narrative(&record));
    }
    Ok(())
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; shutting down");
            interrupt.cancel();
        }
    });
    token
}
