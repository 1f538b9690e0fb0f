// src/server/mod.rs

//! Live-reload development server.
//!
//! Serves the output tree over HTTP and pushes reload / style-injection
//! messages to connected browsers over a websocket:
//!
//! ```text
//! task run ──► ReloadHandle ──broadcast──► /__livereload (websocket) ──► browser
//!                                          /__livereload.js (client script)
//!                                          /*  static files from base_dir
//! ```
//!
//! The server has an explicit lifecycle: [`LiveReloadServer::start`] binds
//! and returns a [`ServerHandle`], and [`ServerHandle::shutdown`] stops it.

mod app;
mod client;
pub mod hub;
mod static_files;
mod websocket;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::config::model::ServerSection;
use crate::errors::{AssetpipeError, Result};

pub use hub::{ReloadHandle, ReloadMessage};

/// Static server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    /// Port to listen on; `0` picks a free port (tests).
    pub port: u16,
    /// Document root (absolute, or relative to the working directory).
    pub base_dir: PathBuf,
    /// Show an in-page toast for each reload signal.
    pub notify: bool,
}

impl ServerConfig {
    /// Resolve the `[server]` section against the project root.
    pub fn from_section(section: &ServerSection, root: &Path) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            base_dir: root.join(&section.base_dir),
            notify: section.notify,
        }
    }
}

/// Shared state for all handlers.
#[derive(Debug)]
pub(crate) struct AppState {
    /// Document root service; directories map to their `index.html`.
    pub files: ServeDir,
    pub reload: ReloadHandle,
    pub notify: bool,
    /// Flips to `true` when the server is shutting down; open websockets
    /// close themselves so graceful shutdown can complete.
    pub shutdown: watch::Receiver<bool>,
}

/// Entry point for starting the server.
#[derive(Debug)]
pub struct LiveReloadServer;

impl LiveReloadServer {
    /// Bind the listener and start serving in a background task.
    pub async fn start(config: ServerConfig, reload: ReloadHandle) -> Result<ServerHandle> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| AssetpipeError::Server(format!("failed to bind {addr}: {err}")))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(AppState {
            files: ServeDir::new(&config.base_dir),
            reload,
            notify: config.notify,
            shutdown: shutdown_rx.clone(),
        });
        let router = app::create_router(state);

        let mut signal_rx = shutdown_rx;
        let task = tokio::spawn(async move {
            let signal = async move {
                // A dropped sender also means shutdown.
                let _ = signal_rx.changed().await;
            };
            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
            {
                error!(error = %err, "live-reload server failed");
            }
        });

        info!(
            address = %local_addr,
            base_dir = ?config.base_dir,
            "live-reload server listening"
        );

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Handle to a running server. Dropping it also stops the server, but
/// without waiting for in-flight requests.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections, close live-reload sockets and wait for
    /// the server task to finish.
    pub async fn shutdown(self) -> Result<()> {
        info!("stopping live-reload server");
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|err| anyhow!("live-reload server task panicked: {err}"))?;
        info!("live-reload server stopped");
        Ok(())
    }
}
