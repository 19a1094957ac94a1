//! Local MCP server hosts: streamable HTTP and stdio.

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use axum::Router;
use rmcp::ServiceExt;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::server::core::{ArgoMcpCore, ArgoToolServices};

/// Failure to host the MCP server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid MCP HTTP bind address '{address}': {message}")]
    InvalidBindAddress { address: String, message: String },

    #[error("MCP HTTP server must bind to a loopback address, got {0}")]
    NotLoopback(IpAddr),

    #[error("MCP server I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("MCP server task failed: {0}")]
    Task(String),
}

/// Host configuration for a local MCP HTTP server instance.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    services: Arc<ArgoToolServices>,
}

impl McpHttpServer {
    /// Create a new MCP HTTP server bound to the provided address.
    pub fn new(bind_address: SocketAddr, services: Arc<ArgoToolServices>) -> Self {
        Self { bind_address, services }
    }

    /// Start the server and return a handle for runtime inspection and shutdown.
    pub async fn start(self) -> Result<RunningMcpHttpServer, ServeError> {
        let cancellation_token = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());
        let client_counter = Arc::new(AtomicUsize::new(0));
        let monitor_handle = spawn_session_monitor(
            Arc::clone(&session_manager),
            Arc::clone(&client_counter),
            cancellation_token.child_token(),
        );

        let services = Arc::clone(&self.services);
        let service: StreamableHttpService<ArgoMcpCore, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(ArgoMcpCore::new(Arc::clone(&services))),
            Arc::clone(&session_manager),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: Some(Duration::from_secs(15)),
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, "MCP HTTP server listening on /mcp");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                let _ = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await;
            }
        });

        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
            monitor_handle,
            client_counter,
        })
    }
}

/// Runtime handle for a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
    monitor_handle: JoinHandle<()>,
    client_counter: Arc<AtomicUsize>,
}

impl RunningMcpHttpServer {
    /// Return the bound socket address for the running server.
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Return the most recently observed client count.
    pub fn connected_clients(&self) -> usize {
        self.client_counter.load(Ordering::Relaxed)
    }

    /// Stop the server and wait for background tasks to finish.
    ///
    /// Cancelling the server token also cancels in-flight wait and watch calls.
    pub async fn stop(self) -> Result<(), ServeError> {
        self.cancellation_token.cancel();
        self.monitor_handle
            .await
            .map_err(|error| ServeError::Task(format!("monitor task: {error}")))?;
        self.server_handle
            .await
            .map_err(|error| ServeError::Task(format!("server task: {error}")))?;
        Ok(())
    }
}

/// Serve MCP over stdin/stdout until the peer disconnects or `cancellation` fires.
pub async fn serve_stdio(services: Arc<ArgoToolServices>, cancellation: CancellationToken) -> Result<(), ServeError> {
    let running = ArgoMcpCore::new(services)
        .serve_with_ct(rmcp::transport::stdio(), cancellation)
        .await
        .map_err(|error| ServeError::Task(format!("stdio initialization: {error}")))?;
    info!("MCP stdio server ready");
    let quit_reason = running
        .waiting()
        .await
        .map_err(|error| ServeError::Task(format!("stdio server: {error}")))?;
    info!(reason = ?quit_reason, "MCP stdio server stopped");
    Ok(())
}

/// Resolve a safe local bind address for the MCP HTTP server.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr, ServeError> {
    let address = bind_address.unwrap_or("127.0.0.1:0");
    let parsed: SocketAddr = address.parse().map_err(|error: std::net::AddrParseError| ServeError::InvalidBindAddress {
        address: address.to_string(),
        message: error.to_string(),
    })?;
    if !is_loopback(parsed.ip()) {
        return Err(ServeError::NotLoopback(parsed.ip()));
    }
    Ok(parsed)
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn spawn_session_monitor(
    session_manager: Arc<LocalSessionManager>,
    client_counter: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {
                    let count = session_manager.sessions.read().await.len();
                    client_counter.store(count, Ordering::Relaxed);
                }
            }
        }
    })
}
