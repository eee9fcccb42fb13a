//! Prometheus metrics for the request lifecycle (default registry).

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

pub static TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "homeserv_transitions_total",
        "Service request transitions committed, by operation",
        &["op"]
    )
    .expect("register transitions_total")
});

pub static TRANSITION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "homeserv_transition_failures_total",
        "Service request transitions refused or failed, by operation and error kind",
        &["op", "kind"]
    )
    .expect("register transition_failures_total")
});

pub fn record_transition(op: &str) {
    TRANSITIONS_TOTAL.with_label_values(&[op]).inc();
}

pub fn record_failure(op: &str, kind: &str) {
    TRANSITION_FAILURES_TOTAL.with_label_values(&[op, kind]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
