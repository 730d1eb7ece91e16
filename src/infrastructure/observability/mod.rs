//! Observability for the funnel
//!
//! Outbound only: metrics are rendered as Prometheus text on demand (the CLI
//! prints them after a report). No HTTP server is started.

pub mod metrics;

pub use metrics::Metrics;
