//! tails: the request-dispatch core of a small web application server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client request
//!         │
//!         ▼
//!     net::listener ──▶ http::server ──▶ routing::Router ──▶ DispatchDecision
//!                                                              │
//!            ┌───────────────┬──────────────┬──────────────────┼──────────────┐
//!            ▼               ▼              ▼                  ▼              ▼
//!          Hmr          StaticFile         Api              Module           Ssr
//!            │               │              │                  │              │
//!     hmr::HmrSession   public dir    controller::       modules::       project::
//!     (WebSocket)                     Dispatch           ModuleCache     page_html
//!
//!     Every class except Hmr runs its group's pipeline::Pipeline first.
//!     project::watcher feeds ModuleCache changes to every HmrSession.
//! ```

// Core subsystems
pub mod config;
pub mod controller;
pub mod error;
pub mod hmr;
pub mod http;
pub mod modules;
pub mod net;
pub mod pipeline;
pub mod project;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{AppConfig, ServerConfig, ServerConfigBuilder};
pub use error::{ConfigurationError, HandlerError, ListenError, ProtocolError};
pub use http::HttpServer;
pub use lifecycle::{start, Shutdown, StartError};
pub use project::{DiskProject, Project};
