//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! start(port)
//!     → listener.rs (bind, AddrInUse → next port)
//!     → axum::serve accept loop (one task per connection)
//!     → connection.rs (ids and live counts for long-lived HMR sockets)
//! ```
//!
//! # Design Decisions
//! - Port conflicts are recovered by incrementing the port, bounded by
//!   `listener.max_port_attempts`
//! - Every other bind failure is fatal
//! - Long-lived sockets are tracked so shutdown can report them

pub mod connection;
pub mod listener;
