//! Reload notifications.
//!
//! [`ReloadHandle`] is the injected service tasks use to tell connected
//! browsers that outputs changed. It is a cheap clone around a broadcast
//! channel; the websocket handler subscribes to it.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::pipeline::TaskReport;

/// Capacity of the broadcast channel; slow clients skip lagged messages.
const CHANNEL_CAPACITY: usize = 64;

/// Message pushed to browsers over the live-reload websocket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Swap the stylesheet served at `path` without reloading.
    Inject { path: String },
}

/// Handle used to notify connected browsers.
#[derive(Clone, Debug)]
pub struct ReloadHandle {
    tx: broadcast::Sender<ReloadMessage>,
    /// Document root, relative to the project root.
    base_dir: PathBuf,
    inject_changes: bool,
}

impl ReloadHandle {
    pub fn new(base_dir: impl Into<PathBuf>, inject_changes: bool) -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            base_dir: base_dir.into(),
            inject_changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Ask every browser to reload the page.
    pub fn reload(&self) {
        self.send(ReloadMessage::Reload);
    }

    /// Push the outputs of a finished task run: stylesheets are injected
    /// when possible, anything else reloads the page.
    pub fn stream(&self, report: &TaskReport) {
        for message in self.messages_for(&report.written) {
            self.send(message);
        }
    }

    /// Messages for a set of written files (paths relative to the project
    /// root). Files outside the document root are ignored.
    pub fn messages_for(&self, written: &[PathBuf]) -> Vec<ReloadMessage> {
        let served: Vec<(String, bool)> = written
            .iter()
            .filter_map(|p| {
                let url = self.url_for(p)?;
                let is_css = p.extension().is_some_and(|e| e.eq_ignore_ascii_case("css"));
                Some((url, is_css))
            })
            .collect();

        if served.is_empty() {
            return Vec::new();
        }

        if self.inject_changes && served.iter().all(|(_, is_css)| *is_css) {
            served
                .into_iter()
                .map(|(path, _)| ReloadMessage::Inject { path })
                .collect()
        } else {
            vec![ReloadMessage::Reload]
        }
    }

    /// URL path under which the server exposes `rel` (relative to the
    /// project root), if it lies inside the document root.
    pub fn url_for(&self, rel: &Path) -> Option<String> {
        let base = normal_components(&self.base_dir);
        let path = normal_components(rel);
        if path.len() <= base.len() || path[..base.len()] != base[..] {
            return None;
        }
        Some(format!("/{}", path[base.len()..].join("/")))
    }

    fn send(&self, message: ReloadMessage) {
        // No subscribers is the normal state before any browser connects.
        match self.tx.send(message.clone()) {
            Ok(receivers) => debug!(?message, receivers, "sent reload message"),
            Err(_) => debug!(?message, "no live-reload clients connected"),
        }
    }
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
