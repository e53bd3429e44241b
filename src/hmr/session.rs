//! One HMR connection's state machine and subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProtocolError;
use crate::hmr::protocol::{ClientMessage, ServerMessage};
use crate::modules::record::hashed_module_path;
use crate::modules::{ModuleRecord, WatchEvent};
use crate::net::connection::ConnectionId;

/// Lifecycle of a session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// The client's declared interest in one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmrSubscription {
    pub module_id: String,
    pub last_known_hash: String,
}

/// Protocol state for one WebSocket.
///
/// Pure state: the socket loop feeds it frames and watcher events and
/// sends whatever it returns.
#[derive(Debug)]
pub struct HmrSession {
    id: ConnectionId,
    state: SessionState,
    subscriptions: HashMap<String, HmrSubscription>,
    update_prefix: String,
}

impl HmrSession {
    /// A new session in `Connecting`. Update URLs are built below
    /// `<base_url>/<dist_prefix>`.
    pub fn new(base_url: &str, dist_prefix: &str) -> Self {
        Self {
            id: ConnectionId::new(),
            state: SessionState::Connecting,
            subscriptions: HashMap::new(),
            update_prefix: format!("{}/{}", base_url, dist_prefix),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handshake completed.
    pub fn open(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Open;
            tracing::debug!(session = %self.id, "HMR session open");
        }
    }

    /// Socket closed. Drops every subscription.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            self.subscriptions.clear();
            tracing::debug!(session = %self.id, "HMR session closed");
        }
    }

    pub fn subscription(&self, module_id: &str) -> Option<&HmrSubscription> {
        self.subscriptions.get(module_id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handle a client text frame. Returns true when a subscription was
    /// created or replaced.
    ///
    /// `lookup` resolves module ids; unknown modules are not subscribed.
    pub fn handle_client_text<F>(&mut self, text: &str, lookup: F) -> Result<bool, ProtocolError>
    where
        F: FnOnce(&str) -> Option<Arc<ModuleRecord>>,
    {
        let ClientMessage::HotAccept { id } = ClientMessage::parse(text)?;
        if self.state != SessionState::Open {
            return Ok(false);
        }

        let Some(record) = lookup(&id) else {
            tracing::debug!(session = %self.id, module_id = %id, "hotAccept for unknown module");
            return Ok(false);
        };

        let subscription = HmrSubscription {
            module_id: record.id.clone(),
            last_known_hash: record.hash.clone(),
        };
        if self.subscriptions.insert(record.id.clone(), subscription).is_some() {
            tracing::trace!(session = %self.id, module_id = %record.id, "Subscription replaced");
        } else {
            tracing::debug!(session = %self.id, module_id = %record.id, "Subscribed");
        }
        Ok(true)
    }

    /// Translate a watcher event into the message this client should get.
    pub fn handle_event(&mut self, event: WatchEvent) -> Option<ServerMessage> {
        if self.state != SessionState::Open {
            return None;
        }

        match event {
            WatchEvent::Add { module_id, hash } => Some(ServerMessage::Add { module_id, hash }),
            WatchEvent::Remove { module_id } => {
                // detach before announcing, so no later modify can match
                self.subscriptions.remove(&module_id);
                Some(ServerMessage::Remove { module_id })
            }
            WatchEvent::Modify { module_id, hash } => {
                let subscription = self.subscriptions.get_mut(&module_id)?;
                subscription.last_known_hash = hash.clone();
                let update_url = hashed_module_path(&self.update_prefix, &module_id, &hash);
                Some(ServerMessage::Update {
                    module_id,
                    hash,
                    update_url,
                })
            }
        }
    }

    /// Encode a message for sending. `None` once the session is not open.
    pub fn encode(&self, message: &ServerMessage) -> Option<String> {
        if self.state != SessionState::Open {
            return None;
        }
        match message.to_json() {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Failed to encode HMR message");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, hash: &str) -> Arc<ModuleRecord> {
        Arc::new(ModuleRecord::with_hash(id, hash, "export {}", ""))
    }

    fn open_session() -> HmrSession {
        let mut session = HmrSession::new("/", "/_aleph/");
        session.open();
        session
    }

    fn accept(session: &mut HmrSession, id: &str) -> bool {
        let text = format!(r#"{{"type":"hotAccept","id":"{}"}}"#, id);
        session
            .handle_client_text(&text, |id| Some(record(id, "0000000000")))
            .unwrap()
    }

    fn modify(id: &str, hash: &str) -> WatchEvent {
        WatchEvent::Modify { module_id: id.into(), hash: hash.into() }
    }

    #[test]
    fn test_state_transitions() {
        let mut session = HmrSession::new("/", "/_aleph/");
        assert_eq!(session.state(), SessionState::Connecting);
        session.open();
        assert_eq!(session.state(), SessionState::Open);
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        session.open();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_update_for_subscribed_module() {
        let mut session = open_session();
        assert!(accept(&mut session, "/pages/index.js"));

        let message = session.handle_event(modify("/pages/index.js", "abcdef0123456789")).unwrap();
        assert_eq!(
            message,
            ServerMessage::Update {
                module_id: "/pages/index.js".into(),
                hash: "abcdef0123456789".into(),
                update_url: "/_aleph/pages/index.abcdef01.js".into(),
            }
        );
        assert_eq!(
            session.subscription("/pages/index.js").unwrap().last_known_hash,
            "abcdef0123456789"
        );
    }

    #[test]
    fn test_no_update_without_subscription() {
        let mut session = open_session();
        assert!(session.handle_event(modify("/pages/index.js", "abc")).is_none());
    }

    #[test]
    fn test_double_accept_yields_single_update() {
        let mut session = open_session();
        assert!(accept(&mut session, "/a.js"));
        assert!(accept(&mut session, "/a.js"));
        assert_eq!(session.subscription_count(), 1);

        let messages: Vec<_> = [modify("/a.js", "1111111111"), modify("/a.js", "2222222222")]
            .into_iter()
            .filter_map(|e| session.handle_event(e))
            .collect();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_remove_detaches_subscription() {
        let mut session = open_session();
        accept(&mut session, "/a.js");

        let removed = session.handle_event(WatchEvent::Remove { module_id: "/a.js".into() });
        assert_eq!(removed, Some(ServerMessage::Remove { module_id: "/a.js".into() }));
        assert!(session.handle_event(modify("/a.js", "stale")).is_none());
    }

    #[test]
    fn test_add_is_broadcast_to_every_open_session() {
        let mut session = open_session();
        let message = session.handle_event(WatchEvent::Add { module_id: "/b.js".into(), hash: "h".into() });
        assert_eq!(message, Some(ServerMessage::Add { module_id: "/b.js".into(), hash: "h".into() }));
    }

    #[test]
    fn test_unknown_module_is_not_subscribed() {
        let mut session = open_session();
        let subscribed = session
            .handle_client_text(r#"{"type":"hotAccept","id":"/ghost.js"}"#, |_| None)
            .unwrap();
        assert!(!subscribed);
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_malformed_frames_keep_session_open() {
        let mut session = open_session();
        assert!(session.handle_client_text("{{{", |_| None).is_err());
        assert!(session.handle_client_text(r#"{"id":"/a.js"}"#, |_| None).is_err());
        assert_eq!(session.state(), SessionState::Open);
        assert!(accept(&mut session, "/a.js"));
    }

    #[test]
    fn test_closed_session_is_silent() {
        let mut session = open_session();
        accept(&mut session, "/a.js");
        let message = ServerMessage::Remove { module_id: "/a.js".into() };
        assert!(session.encode(&message).is_some());

        session.close();
        assert_eq!(session.subscription_count(), 0);
        assert!(session.encode(&message).is_none());
        assert!(session.handle_event(modify("/a.js", "h")).is_none());
        assert!(session.handle_event(WatchEvent::Add { module_id: "/c.js".into(), hash: "h".into() }).is_none());
    }

    #[test]
    fn test_update_url_uses_base_url() {
        let mut session = HmrSession::new("/app", "/_aleph/");
        session.open();
        accept(&mut session, "/pages/index.js");
        match session.handle_event(modify("/pages/index.js", "99999999aaaa")) {
            Some(ServerMessage::Update { update_url, .. }) => {
                assert_eq!(update_url, "/app/_aleph/pages/index.99999999.js")
            }
            other => panic!("expected update, got {:?}", other),
        }
    }
}
