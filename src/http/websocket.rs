//! HMR WebSocket endpoint.
//!
//! # Responsibilities
//! - Complete the upgrade handshake on the HMR path
//! - Drive one `HmrSession` per socket: client frames in, watcher events out
//! - Tear down the watcher subscription when the socket closes
//!
//! # Data Flow
//! ```text
//! Client ──── hotAccept ────→ session.handle_client_text
//! Client ←── add/remove/update ── session.handle_event ←── Watcher
//! ```
//!
//! # Design Decisions
//! - One task per socket; the session is owned by that task only
//! - Malformed frames are logged at debug and dropped
//! - A lagging watcher closes the socket; the client reconnects and resyncs
//! - Shutdown closes every open socket

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::ProtocolError;
use crate::hmr::HmrSession;
use crate::net::connection::ConnectionTracker;
use crate::observability::metrics;
use crate::project::Project;

/// Everything a socket task needs, cloned out of the app state.
#[derive(Clone)]
pub struct HmrContext {
    pub project: Arc<dyn Project>,
    pub base_url: String,
    pub dist_prefix: String,
    pub sessions: ConnectionTracker,
}

/// Accept the upgrade and hand the socket to its own task.
pub fn upgrade(ws: WebSocketUpgrade, context: HmrContext, shutdown: broadcast::Receiver<()>) -> Response {
    ws.on_upgrade(move |socket| serve_session(socket, context, shutdown))
}

/// Run one HMR session until the client leaves or the server stops.
pub async fn serve_session(socket: WebSocket, context: HmrContext, mut shutdown: broadcast::Receiver<()>) {
    let mut session = HmrSession::new(&context.base_url, &context.dist_prefix);
    let _guard = context.sessions.track(session.id());
    let mut watcher = context.project.create_watcher();
    let (mut sender, mut receiver) = socket.split();

    session.open();
    metrics::record_hmr_session_opened();
    tracing::info!(
        session = %session.id(),
        watcher = %watcher.id(),
        active = context.sessions.active_count(),
        "HMR session started"
    );

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(session = %session.id(), error = %ProtocolError::Binary, "Dropping client frame");
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(session = %session.id(), error = %e, "HMR socket error");
                        break;
                    }
                };
                let project = &context.project;
                if let Err(e) = session.handle_client_text(text.as_str(), |id| project.get_module(id)) {
                    tracing::debug!(session = %session.id(), error = %e, "Dropping client frame");
                }
            }
            event = watcher.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(session = %session.id(), skipped, "HMR session missed module changes, closing");
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(message) = session.handle_event(event) else {
                    continue;
                };
                let Some(text) = session.encode(&message) else {
                    continue;
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
                metrics::record_hmr_message(message.kind());
                tracing::debug!(session = %session.id(), kind = message.kind(), "HMR message sent");
            }
            _ = shutdown.recv() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    session.close();
    context.project.remove_watcher(watcher);
    metrics::record_hmr_session_closed();
    tracing::info!(session = %session.id(), "HMR session ended");
}
