//! Hot module reload.
//!
//! # Data Flow
//! ```text
//! GET /_hmr (upgrade)
//!     → http/websocket.rs (handshake, socket loop)
//!     → session.rs (Connecting → Open → Closed)
//!
//! Client frame "hotAccept"  → protocol.rs parse → subscription upsert
//! Watcher event add/remove  → message to client (remove drops subscription)
//! Watcher event modify      → "update" only for subscribed modules
//! ```
//!
//! # Design Decisions
//! - Subscriptions are records owned by the session, keyed by module id,
//!   so a second hotAccept replaces instead of duplicating
//! - Malformed client frames are dropped, never fatal
//! - A closed session emits nothing

pub mod protocol;
pub mod session;

pub use protocol::{ClientMessage, ServerMessage};
pub use session::{HmrSession, HmrSubscription, SessionState};
