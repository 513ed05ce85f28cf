//! Prometheus metrics

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe the signaling metrics.
///
/// Can only succeed once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_gauge!(
        "signaling_online_users",
        "Number of users currently present on the relay"
    );
    describe_gauge!(
        "signaling_active_calls",
        "Number of call sessions, ringing or active"
    );
    describe_counter!(
        "signaling_calls_total",
        "Total number of call requests admitted"
    );
    describe_counter!(
        "signaling_calls_answered",
        "Total number of calls answered by the callee"
    );
    describe_counter!(
        "signaling_calls_failed",
        "Total number of call requests refused"
    );
    describe_counter!(
        "signaling_calls_ended",
        "Total number of call sessions torn down"
    );

    Ok(handle)
}

/// Update online users gauge
pub fn update_online_users(count: usize) {
    gauge!("signaling_online_users").set(count as f64);
}

/// Update active calls gauge
pub fn update_active_calls(count: usize) {
    gauge!("signaling_active_calls").set(count as f64);
}

/// Record an admitted call request
pub fn record_call_initiated() {
    counter!("signaling_calls_total").increment(1);
}

/// Record an answered call
pub fn record_call_answered() {
    counter!("signaling_calls_answered").increment(1);
}

/// Record a refused call request
pub fn record_call_failed(reason: &str) {
    counter!("signaling_calls_failed", "reason" => reason.to_string()).increment(1);
}

/// Record a torn down session
pub fn record_call_ended(reason: &str) {
    counter!("signaling_calls_ended", "reason" => reason.to_string()).increment(1);
}
