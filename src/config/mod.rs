//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! tails.toml (or config.toml) in the app root
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → server.rs (pipelines + routes registered, then frozen)
//!     → ServerConfig shared via Arc to all request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server starts accepting connections
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod server;
pub mod validation;

pub use schema::AppConfig;
pub use schema::DispatchConfig;
pub use schema::ListenerConfig;
pub use schema::RouteConfig;
pub use server::{ServerConfig, ServerConfigBuilder};
