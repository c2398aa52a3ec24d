//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, one span per submission)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Submission id (UUID v4) flows through every attempt log line
//! - Metrics are recorded through the `metrics` facade; without an
//!   installed exporter they are no-ops

pub mod logging;
pub mod metrics;
