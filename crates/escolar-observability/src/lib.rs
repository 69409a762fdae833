//! Escolar Observability
//!
//! Logging and metrics for the identity engine:
//! - Structured logging via `tracing` (console, rolling error file, JSON file)
//! - Resolution metrics via `metrics` with a Prometheus recorder
//!
//! Compiled in by the `observability` feature (default). At runtime it can be
//! switched off with `OBSERVABILITY_ENABLED=false`, in which case the track
//! functions return immediately. Without the feature every export is a no-op
//! stub and [`init_basic_console_logging`] is the only subscriber available.
//!
//! # Examples
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     escolar_observability::init_tracing()?;
//!     let metrics = escolar_observability::init_metrics();
//!     // ... run sessions ...
//!     Ok(())
//! }
//! ```

pub mod basic_logging;
#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::init_basic_console_logging;

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, is_observability_enabled};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, track_corrective_write, track_pipeline_duration, track_probe_match,
    track_resolution, track_safety_timeout, track_tenant_block, track_trigger_dropped,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    /// Placeholder for the Prometheus handle when metrics are compiled out.
    #[derive(Debug, Clone)]
    pub struct PrometheusHandle;

    impl PrometheusHandle {
        pub fn render(&self) -> String {
            String::new()
        }
    }

    pub fn is_observability_enabled() -> bool {
        false
    }

    /// Falls back to console logging when the feature is disabled.
    pub fn init_tracing() -> anyhow::Result<()> {
        crate::basic_logging::init_basic_console_logging();
        Ok(())
    }

    pub fn init_metrics() -> Option<PrometheusHandle> {
        None
    }

    pub fn track_resolution(_outcome: &str) {}
    pub fn track_probe_match(_probe: &str) {}
    pub fn track_tenant_block(_kind: &str) {}
    pub fn track_corrective_write(_kind: &str, _success: bool) {}
    pub fn track_safety_timeout() {}
    pub fn track_trigger_dropped(_source: &str) {}
    pub fn track_pipeline_duration(_secs: f64) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
