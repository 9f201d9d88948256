use std::net::SocketAddr;

use crate::engine::EngineError;
use crate::model::Receipt;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests decided. Labels: outcome.
pub const BOOKINGS_TOTAL: &str = "podium_bookings_total";

/// Histogram: booking decide+persist latency in seconds.
pub const BOOKING_DURATION_SECONDS: &str = "podium_booking_duration_seconds";

/// Counter: login attempts. Labels: status.
pub const LOGINS_TOTAL: &str = "podium_logins_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: full-ledger save duration in seconds.
pub const LEDGER_SAVE_DURATION_SECONDS: &str = "podium_ledger_save_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a booking outcome to a short label for metrics.
pub fn outcome_label(outcome: &Result<Receipt, EngineError>) -> &'static str {
    match outcome {
        Ok(_) => "committed",
        Err(EngineError::InvalidPlaces(_)) => "invalid_input",
        Err(EngineError::NonPositivePlaces(_)) => "non_positive",
        Err(EngineError::CapExceeded { .. }) => "cap_exceeded",
        Err(EngineError::InsufficientCapacity { .. }) => "insufficient_capacity",
        Err(EngineError::InsufficientPoints { .. }) => "insufficient_points",
        Err(EngineError::UnknownClub(_) | EngineError::UnknownCompetition(_)) => "not_found",
        Err(EngineError::Ledger(_)) => "ledger_error",
    }
}
