use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing::warn;

use crate::logging::is_observability_enabled;

/// Installs the Prometheus recorder and spawns its upkeep task.
/// Returns None if observability is disabled or a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("identity_pipeline_duration_seconds".to_string()),
        &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
    ) {
        Ok(builder) => builder,
        Err(e) => {
            warn!(error = %e, "Invalid metric buckets, metrics disabled");
            return None;
        }
    };

    let handle = match builder.install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder");
            return None;
        }
    };

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Terminal outcome of a resolution run: resolved, unresolved, blocked, error.
pub fn track_resolution(outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("identity_resolutions_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn track_probe_match(probe: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("identity_probe_matches_total", "probe" => probe.to_string()).increment(1);
}

pub fn track_tenant_block(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("identity_tenant_blocks_total", "kind" => kind.to_string()).increment(1);
}

pub fn track_corrective_write(kind: &str, success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "error" };
    counter!("identity_corrective_writes_total", "kind" => kind.to_string(), "status" => status)
        .increment(1);
}

pub fn track_safety_timeout() {
    if !is_observability_enabled() {
        return;
    }
    counter!("session_safety_timeouts_total").increment(1);
}

/// A trigger dropped because a pipeline was already running.
pub fn track_trigger_dropped(source: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("session_triggers_dropped_total", "source" => source.to_string()).increment(1);
}

pub fn track_pipeline_duration(secs: f64) {
    if !is_observability_enabled() {
        return;
    }
    histogram!("identity_pipeline_duration_seconds").record(secs);
}
