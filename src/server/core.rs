use log::{error, info, warn};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ServerConfig;
use crate::server::router::build_router;
use crate::server::state::AppState;

pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Validates the base directory and binds the listener.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let socket = config.listen_socket();
        let state = AppState::new(config)?;

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", listener.local_addr()?);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        info!("Base directory: {}", state.base_dir().display());
        if !state.config().index_file().is_file() {
            warn!(
                "Front-end not found at {}; unmatched routes will answer 404",
                state.config().index_file().display()
            );
        }

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn run(self) -> io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            "Starting RAX file manager on {} (admin user '{}')",
            self.listener.local_addr()?,
            self.state.credentials().username()
        );

        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal, shutting down");
}
