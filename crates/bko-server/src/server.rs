use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bko_service::BucketService;
use bko_store::ObjectRegistry;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Bucket organizer HTTP server.
pub struct BucketServer {
    config: ServerConfig,
    state: AppState,
}

impl BucketServer {
    pub fn new(config: ServerConfig, registry: Arc<dyn ObjectRegistry>) -> Self {
        let state = AppState::new(
            BucketService::new(registry),
            &config.service_name,
            config.environment,
        );
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.request_timeout())
    }

    /// Serve until SIGINT or SIGTERM, then drain.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        self.config.validate()?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// After the signal, new connections are refused and in-flight requests
    /// get the configured shutdown timeout to finish.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = listener.local_addr()?;
        let shutdown_timeout = self.config.shutdown_timeout();
        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
        let mut task = tokio::spawn(async move { server.await });
        info!(%addr, service = %self.config.service_name, "start serving http requests");

        tokio::select! {
            joined = &mut task => return flatten(joined),
            () = signal => {}
        }

        info!(timeout = ?shutdown_timeout, "shutting down server");
        let _ = stop_tx.send(());
        match tokio::time::timeout(shutdown_timeout, task).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(timeout = ?shutdown_timeout, "server graceful shutdown failed");
                Err(ServerError::ShutdownTimeout(shutdown_timeout))
            }
        }
    }
}

fn flatten(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> ServerResult<()> {
    match joined {
        Ok(result) => result.map_err(ServerError::from),
        Err(e) => Err(ServerError::Internal(e.to_string())),
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
