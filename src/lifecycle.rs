//! Process lifecycle: startup checks, serving, and shutdown.
//!
//! Startup is strictly linear. The required variables are checked first, then the database is
//! probed, then the memory client is built exactly once and wrapped in a [`LifespanContext`]
//! that every request handler shares. Serving ends on SIGINT/SIGTERM, which cancels the
//! transport immediately without draining in-flight requests, or when the transport fails.

use std::{fmt, sync::Arc};

use anyhow::Context as _;
use rmcp::{
    service::ServiceExt,
    transport::{
        stdio,
        streamable_http_server::{
            StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use thiserror::Error;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

use crate::{
    config::{ConfigError, Settings, Transport},
    database::ConnectivityProbe,
    mcp::{Mem0McpServer, SettingsSnapshot},
    memory::{MemoryClient, MemoryError, ResolvedConfig, Secret, create_memory_client},
};

/// Path the HTTP transport is mounted on.
pub const HTTP_ENDPOINT: &str = "/mcp";

/// Startup-to-shutdown scoped state handed to every request handler.
pub struct LifespanContext {
    /// Memory client shared by all requests.
    pub memory_client: Arc<dyn MemoryClient>,
}

/// Phases the process moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing checked yet.
    Uninitialized,
    /// Required variables are present.
    EnvironmentChecked,
    /// The database answered the probe.
    DbVerified,
    /// The memory client exists.
    ClientConstructed,
    /// A transport is accepting requests.
    Serving,
    /// Serving stopped; resources are being released.
    ShuttingDown,
    /// Everything has been released.
    Terminated,
}

/// Fatal errors raised before serving starts.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Required variables are missing or malformed.
    #[error(transparent)]
    Environment(#[from] ConfigError),
    /// The database probe failed.
    #[error("Database connection failed")]
    Database,
    /// The memory service could not be configured.
    #[error("Failed to create memory client: {0}")]
    MemoryClient(#[from] MemoryError),
}

/// How serving ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An interrupt or termination signal arrived.
    Signal(&'static str),
    /// The peer closed the transport.
    TransportClosed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "received {name}"),
            Self::TransportClosed => f.write_str("transport closed"),
        }
    }
}

/// Transport selection and bind address.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Channel to listen on.
    pub transport: Transport,
    /// Host name or address for the HTTP transport, resolved only when that transport starts.
    pub host: String,
    /// Port for the HTTP transport.
    pub port: u16,
}

/// Drives the process through [`LifecycleState`].
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Start in [`LifecycleState::Uninitialized`].
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    /// Current phase.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn advance(&mut self, next: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "Lifecycle transition");
        self.state = next;
    }

    /// Run the startup checks and build the shared context.
    ///
    /// The database is not contacted unless every required variable is present.
    pub async fn start(
        &mut self,
        settings: &Settings,
        resolved: &ResolvedConfig,
        probe: &dyn ConnectivityProbe,
    ) -> Result<LifespanContext, StartupError> {
        tracing::debug!("Starting server initialization");
        settings.check_required()?;
        if resolved.provider.is_none() {
            tracing::warn!(
                selector = settings.llm_provider.as_deref().unwrap_or_default(),
                "Unsupported LLM_PROVIDER; configuration carries no llm or embedder block"
            );
        }
        self.advance(LifecycleState::EnvironmentChecked);

        if !probe.check(settings.database_url.as_deref()).await {
            return Err(StartupError::Database);
        }
        self.advance(LifecycleState::DbVerified);

        let memory_client = create_memory_client(
            &settings.memory_api_url,
            settings.memory_api_key.clone().map(Secret::new),
            &resolved.memory,
        )
        .await?;
        self.advance(LifecycleState::ClientConstructed);

        Ok(LifespanContext { memory_client })
    }

    /// Serve `server` until `shutdown` resolves or the transport stops.
    ///
    /// `shutdown` yields the name of the signal that ended the run.
    pub async fn serve<S>(
        &mut self,
        server: Mem0McpServer,
        options: ServeOptions,
        shutdown: S,
    ) -> anyhow::Result<ShutdownReason>
    where
        S: Future<Output = &'static str>,
    {
        self.advance(LifecycleState::Serving);
        tracing::info!(transport = %options.transport, "Serving MCP requests");

        let outcome = tokio::select! {
            result = run_transport(server, options) => {
                result.map(|()| ShutdownReason::TransportClosed)
            }
            name = shutdown => {
                tracing::info!(signal = name, "Received shutdown signal");
                Ok(ShutdownReason::Signal(name))
            }
        };

        self.advance(LifecycleState::ShuttingDown);
        outcome
    }

    /// Release the lifespan context.
    pub fn finish(&mut self, context: Arc<LifespanContext>) {
        drop(context);
        self.advance(LifecycleState::Terminated);
    }
}

/// Full process run: startup, serving, shutdown. Returns the process exit status.
///
/// SIGINT and SIGTERM are caught from the first await on, so a signal during startup also ends
/// the run with status 0.
pub async fn run(
    settings: &Settings,
    resolved: &ResolvedConfig,
    options: ServeOptions,
    probe: &dyn ConnectivityProbe,
) -> u8 {
    let signals = ShutdownSignal::install();
    run_until(settings, resolved, options, probe, signals.recv()).await
}

/// [`run`] with an explicit shutdown trigger in place of process signals.
pub async fn run_until<S>(
    settings: &Settings,
    resolved: &ResolvedConfig,
    options: ServeOptions,
    probe: &dyn ConnectivityProbe,
    shutdown: S,
) -> u8
where
    S: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);
    let mut lifecycle = Lifecycle::new();

    let started = tokio::select! {
        result = lifecycle.start(settings, resolved, probe) => Ok(result),
        name = shutdown.as_mut() => Err(name),
    };
    let context = match started {
        Ok(Ok(context)) => Arc::new(context),
        Ok(Err(error)) => {
            tracing::error!(error = %error, state = ?lifecycle.state(), "Startup failed");
            return 1;
        }
        Err(name) => {
            tracing::info!(signal = name, state = ?lifecycle.state(), "Shutdown during startup");
            return 0;
        }
    };

    let server = Mem0McpServer::new(
        Arc::clone(&context),
        SettingsSnapshot::from_config(&resolved.memory),
    );
    let status = match lifecycle.serve(server, options, shutdown.as_mut()).await {
        Ok(reason) => {
            tracing::info!(%reason, "Server stopped");
            0
        }
        Err(error) => {
            tracing::error!(error = ?error, "Transport failed");
            1
        }
    };

    lifecycle.finish(context);
    status
}

/// Drive `future` on a fresh current-thread runtime and return its output.
///
/// Work parked on the blocking pool is abandoned rather than awaited. The stdio transport
/// reads stdin there, and that read only returns once the client writes or closes the pipe.
pub fn block_on_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

async fn run_transport(server: Mem0McpServer, options: ServeOptions) -> anyhow::Result<()> {
    match options.transport {
        Transport::Stdio => {
            let service = server
                .serve(stdio())
                .await
                .context("failed to start MCP server over stdio")?;
            service
                .waiting()
                .await
                .context("MCP server terminated unexpectedly")?;
        }
        Transport::Http => {
            let listener = bind_listener(&options).await?;
            let local = listener.local_addr()?;
            tracing::info!("Listening on http://{}{}", local, HTTP_ENDPOINT);
            axum::serve(listener, http_router(server))
                .await
                .context("HTTP transport failed")?;
        }
    }
    Ok(())
}

/// Resolve `options.host` and bind the HTTP listener.
async fn bind_listener(options: &ServeOptions) -> anyhow::Result<TcpListener> {
    TcpListener::bind((options.host.as_str(), options.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", options.host, options.port))
}

/// Router exposing `server` over the streamable HTTP (event-stream) transport.
pub fn http_router(server: Mem0McpServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    axum::Router::new().nest_service(HTTP_ENDPOINT, service)
}

/// SIGINT/SIGTERM listeners, registered eagerly so signals are caught before serving starts.
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: Option<Signal>,
    #[cfg(unix)]
    terminate: Option<Signal>,
}

impl ShutdownSignal {
    /// Register the handlers. Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> Self {
        Self {
            interrupt: listen(SignalKind::interrupt(), "SIGINT"),
            terminate: listen(SignalKind::terminate(), "SIGTERM"),
        }
    }

    /// Register the handlers. Must be called from within a tokio runtime.
    #[cfg(not(unix))]
    pub fn install() -> Self {
        Self {}
    }

    /// Wait for the first signal and return its name.
    #[cfg(unix)]
    pub async fn recv(self) -> &'static str {
        tokio::select! {
            () = next_signal(self.interrupt) => "SIGINT",
            () = next_signal(self.terminate) => "SIGTERM",
        }
    }

    /// Wait for the first signal and return its name.
    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}

#[cfg(unix)]
fn listen(kind: SignalKind, name: &'static str) -> Option<Signal> {
    match signal(kind) {
        Ok(stream) => Some(stream),
        Err(error) => {
            tracing::error!(error = %error, signal = name, "Failed to install signal handler");
            None
        }
    }
}

#[cfg(unix)]
async fn next_signal(stream: Option<Signal>) {
    match stream {
        Some(mut stream) => {
            stream.recv().await;
        }
        None => std::future::pending().await,
    }
}
