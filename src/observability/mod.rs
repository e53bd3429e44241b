//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log shipping)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not interpolated strings
//! - Request ID flows through pipes, controllers and error pages
//! - Metrics are cheap (no-ops until an exporter is installed)

pub mod logging;
pub mod metrics;
