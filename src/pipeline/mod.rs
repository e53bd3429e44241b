//! Middleware pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     [pipelines] config + code registrations
//!     → catalog.rs (pipe name → Pipe instance)
//!     → registry.rs (group → Pipeline, append in declaration order)
//!     → frozen inside ServerConfig
//!
//! Per request:
//!     DispatchDecision → group ("web" | "api")
//!     → Pipelines::run(group, &RequestContext)
//!     → every pipe's handle(), in order, no early exit
//! ```
//!
//! # Design Decisions
//! - Pipes are side-effect only; they see `&RequestContext` and cannot
//!   influence routing
//! - Registration appends; a group is never silently reset
//! - Running an unknown group is a configuration error, not a no-op

pub mod catalog;
pub mod logger;
pub mod pipe;
pub mod registry;

pub use pipe::{Pipe, Pipeline};
pub use registry::Pipelines;
