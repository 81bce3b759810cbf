//! Exporter HTTP server
//!
//! Accepts connections on one listener and serves each on its own task, so a
//! slow speed test on one connection never delays another.

pub mod router;
pub mod static_files;

use crate::{
    collector::SpeedtestCollector,
    error::{AppError, Result},
    logging::Logger,
    types::ServeMode,
};
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    service::TowerToHyperService,
};
use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::net::TcpListener;

pub use router::AppState;

/// Where and how the server listens
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub mode: ServeMode,
    pub static_dir: PathBuf,
}

/// Bound exporter server, ready to serve
pub struct ExporterServer {
    listener: TcpListener,
    router: Router,
    logger: Logger,
    mode: ServeMode,
}

impl ExporterServer {
    /// Bind the listener; failure here is the only fatal runtime error
    pub async fn bind(config: ServerConfig, collector: SpeedtestCollector, logger: Logger) -> Result<Self> {
        let listener = TcpListener::bind(config.listen)
            .await
            .map_err(|e| AppError::bind(format!("Failed to bind {}: {}", config.listen, e)))?;

        let state = AppState::new(Arc::new(collector), logger.clone(), config.static_dir);

        Ok(Self {
            listener,
            router: router::router(state, config.mode),
            logger,
            mode: config.mode,
        })
    }

    /// Address actually bound, useful with port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process is terminated
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` completes; in-flight connections keep running
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let local_addr = self.local_addr()?;
        self.logger.info(&format!("Listening on http://{}", local_addr))
            .field("mode", self.mode.as_str())
            .field("probe_path", self.mode.probe_path())
            .log()
            .await;

        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                _ = &mut shutdown => {
                    crate::log_info!(self.logger, "Shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(connection) => connection,
                Err(e) => {
                    crate::log_warn!(self.logger, "Accept failed: {}", e);
                    // Back off so fd exhaustion does not spin the loop
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };

            self.logger.trace("Connection accepted")
                .field("peer", peer.to_string())
                .log()
                .await;

            let service = TowerToHyperService::new(self.router.clone());
            let logger = self.logger.clone();

            tokio::spawn(async move {
                let connection = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .keep_alive(false)
                    .serve_connection(TokioIo::new(stream), service);

                if let Err(e) = connection.await {
                    logger.debug(&format!("Connection error: {}", e))
                        .field("peer", peer.to_string())
                        .log()
                        .await;
                }
            });
        }
    }
}
