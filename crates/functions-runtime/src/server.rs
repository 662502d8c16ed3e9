//! Server setup and lifecycle management
//!
//! `Initializing → Serving → Draining → Stopped`
//!
//! [`Server::new`] validates every function and builds both routers.
//! [`Server::bind`] binds the listeners and enters `Serving`.
//! [`ServerHandle::wait`] blocks until the shutdown signal fires, then gives
//! both listeners the grace period to drain before aborting them.

use crate::adapter::FunctionHandler;
use crate::admin;
use crate::config::ServerConfig;
use crate::error::{RegistrationError, RuntimeError};
use crate::registry::{Registry, SymbolTable};
use crate::shutdown::{forward_os_signals, ShutdownSignal};
use axum::Router;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Lifecycle state of a [`Server`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Initializing,
    Serving,
    Draining,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Initializing => "initializing",
            ServerState::Serving => "serving",
            ServerState::Draining => "draining",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Functions server
pub struct Server {
    config: ServerConfig,
    registry: Arc<Registry>,
    functions: Router,
    admin: Option<Router>,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Validate every registered function and build the routers
    pub fn new(registry: Registry, config: ServerConfig) -> Result<Self, RuntimeError> {
        let registry = Arc::new(registry);
        let shutdown = ShutdownSignal::new();

        let functions = function_router(&registry, config.max_body_size)?;
        let admin = config
            .admin_enabled()
            .then(|| admin::router(registry.clone(), shutdown.clone()));

        Ok(Self {
            config,
            registry,
            functions,
            admin,
            shutdown,
        })
    }

    /// Server for `symbols`, configured from `PORT` and `ADMIN_PORT`
    pub fn from_env(symbols: SymbolTable) -> Result<Self, RuntimeError> {
        let config = ServerConfig::from_env()?;
        Self::new(Registry::from_symbols(symbols), config)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Signal that starts draining; also fired by `/quitquitquit`
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind both listeners and start serving
    pub async fn bind(self) -> Result<ServerHandle, RuntimeError> {
        let (state_tx, _) = watch::channel(ServerState::Initializing);

        let addr = SocketAddr::new(self.config.host, self.config.port);
        let listener = bind_listener(addr).await?;
        let local_addr = listener.local_addr()?;

        let admin = match (self.admin, self.config.admin_port) {
            (Some(router), Some(port)) => {
                let addr = SocketAddr::new(self.config.host, port);
                let listener = bind_listener(addr).await?;
                let admin_addr = listener.local_addr()?;
                Some((listener, router, admin_addr))
            }
            _ => None,
        };

        info!("Serving functions at http://{}", local_addr);
        for symbol in self.registry.names() {
            info!("Serving function at http://{}/{}", local_addr, symbol);
        }

        let functions_task = tokio::spawn(serve_listener(
            listener,
            self.functions,
            self.shutdown.clone(),
        ));

        let (admin_addr, admin_task) = match admin {
            Some((listener, router, admin_addr)) => {
                info!("Serving admin API at http://{}", admin_addr);
                let task = tokio::spawn(serve_listener(listener, router, self.shutdown.clone()));
                (Some(admin_addr), Some(task))
            }
            None => (None, None),
        };

        let signals_task = tokio::spawn(forward_os_signals(self.shutdown.clone()));

        state_tx.send_replace(ServerState::Serving);

        Ok(ServerHandle {
            local_addr,
            admin_addr,
            grace_period: self.config.grace_period,
            shutdown: self.shutdown,
            state_tx,
            functions_task,
            admin_task,
            signals_task,
        })
    }

    /// Bind, serve until shutdown, then drain
    pub async fn serve(self) -> Result<(), RuntimeError> {
        self.bind().await?.wait().await
    }
}

/// A running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    grace_period: Duration,
    shutdown: ShutdownSignal,
    state_tx: watch::Sender<ServerState>,
    functions_task: JoinHandle<io::Result<()>>,
    admin_task: Option<JoinHandle<io::Result<()>>>,
    signals_task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address of the function listener
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address of the admin listener, when enabled
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state_tx.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ServerState> {
        self.state_tx.subscribe()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Start draining without waiting for an OS signal
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the shutdown signal, then drain both listeners.
    ///
    /// A listener still busy at the grace deadline has its accept loop
    /// aborted. Connections it already accepted run on their own tasks and
    /// may still be answering after `Stopped` is reported; they end when
    /// they finish or the runtime shuts down.
    pub async fn wait(self) -> Result<(), RuntimeError> {
        self.shutdown.wait().await;
        self.state_tx.send_replace(ServerState::Draining);
        info!(grace_period = ?self.grace_period, "Draining listeners");

        let deadline = Instant::now() + self.grace_period;
        let admin_task = self.admin_task;
        let admin = async move {
            match admin_task {
                Some(task) => drain("admin", task, deadline).await,
                None => Ok(()),
            }
        };
        let (functions, admin) = tokio::join!(drain("functions", self.functions_task, deadline), admin);

        self.signals_task.abort();
        self.state_tx.send_replace(ServerState::Stopped);
        info!("Functions server stopped");

        functions.and(admin)
    }
}

fn function_router(registry: &Registry, max_body_size: usize) -> Result<Router, RegistrationError> {
    let mut router = Router::new();

    for (symbol, descriptor) in registry.iter() {
        if !is_routable(symbol) {
            return Err(RegistrationError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }
        descriptor
            .validate()
            .map_err(|source| RegistrationError::Invalid {
                symbol: symbol.to_string(),
                source,
            })?;

        let handler = FunctionHandler::for_descriptor(symbol, descriptor.as_ref(), max_body_size)?;
        router = router.route(&format!("/{symbol}"), handler.into_method_router());
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}

// Symbols become single path segments; reject anything the router would
// treat as a separator or parameter.
fn is_routable(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol
            .chars()
            .any(|c| matches!(c, '/' | ':' | '*' | '{' | '}' | '?' | '#') || c.is_whitespace())
}

async fn bind_listener(addr: SocketAddr) -> Result<TcpListener, RuntimeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RuntimeError::Bind { addr, source })
}

async fn serve_listener(listener: TcpListener, router: Router, shutdown: ShutdownSignal) -> io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}

async fn drain(
    name: &'static str,
    mut task: JoinHandle<io::Result<()>>,
    deadline: Instant,
) -> Result<(), RuntimeError> {
    match tokio::time::timeout_at(deadline, &mut task).await {
        Ok(Ok(Ok(()))) => {
            info!("{} listener stopped", name);
            Ok(())
        }
        Ok(Ok(Err(err))) => Err(RuntimeError::Server(format!("{name} listener failed: {err}"))),
        Ok(Err(err)) => Err(RuntimeError::Server(format!("{name} listener panicked: {err}"))),
        Err(_) => {
            warn!("Grace period expired, closing {} listener", name);
            // Stops accepting; spawned connection tasks are not tracked here.
            task.abort();
            Ok(())
        }
    }
}
