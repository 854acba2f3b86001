use std::net::SocketAddr;

// ── Reservation flow ─────────────────────────────────────────────

/// Counter: reservations committed.
pub const RESERVATIONS_CONFIRMED_TOTAL: &str = "rentdesk_reservations_confirmed_total";

/// Counter: reservations removed by a confirmed cancel.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "rentdesk_reservations_cancelled_total";

/// Counter: guests created during booking.
pub const GUESTS_REGISTERED_TOTAL: &str = "rentdesk_guests_registered_total";

/// Counter: rejected workflow actions. Labels: kind.
pub const WORKFLOW_ERRORS_TOTAL: &str = "rentdesk_workflow_errors_total";

// ── Catalog ──────────────────────────────────────────────────────

/// Counter: catalog loads. Labels: status.
pub const CATALOG_LOADS_TOTAL: &str = "rentdesk_catalog_loads_total";

/// Histogram: catalog load duration in seconds.
pub const CATALOG_LOAD_DURATION_SECONDS: &str = "rentdesk_catalog_load_duration_seconds";

/// Gauge: properties currently held by the catalog.
pub const CATALOG_PROPERTIES: &str = "rentdesk_catalog_properties";

/// Histogram: listings left visible after filtering.
pub const FILTER_RESULTS: &str = "rentdesk_filter_results";

/// Install the Prometheus exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics"),
        Err(e) => tracing::error!("failed to install Prometheus metrics exporter: {e}"),
    }
}
