//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → path.rs (strip query, clean, percent-decode)
//!     → router.rs (fixed priority: hmr → static file → api → module → ssr)
//!     → matcher.rs (reserved path/prefix conditions)
//!     → Return: DispatchDecision
//!
//! API requests only:
//!     DispatchDecision::Api
//!     → route_table.rs (group → method → literal path → RouteEntry)
//!     → controller dispatch (found or not-found, its call)
//! ```
//!
//! # Design Decisions
//! - Route table and reserved paths frozen at startup, immutable at runtime
//! - Literal paths only: exact string equality after normalization
//! - Deterministic: same input always yields the same decision
//! - First match wins (fixed priority, static files shadow everything but HMR)

pub mod matcher;
pub mod path;
pub mod route_table;
pub mod router;

pub use route_table::{RouteEntry, RouteTable};
pub use router::{DispatchDecision, Router};
