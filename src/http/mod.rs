//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch handler)
//!     → routing::Router (DispatchDecision)
//!     → request.rs (RequestContext for pipes and controllers)
//!     → pipeline for the decision's group
//!     → static_files.rs | controller dispatch | dist.rs | project SSR
//!       or websocket.rs for the HMR upgrade
//!     → response.rs (content types, 500 page)
//!     → Send to client
//! ```

pub mod dist;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;
pub mod websocket;

pub use request::{RequestContext, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
