//! Prometheus metrics for database connection pool
//!
//! Tracks pool size by state and read-snapshot failures

use prometheus::{register_int_counter_vec, register_int_gauge_vec, IntCounterVec, IntGaugeVec};
use sqlx::PgPool;

lazy_static::lazy_static! {
    /// Database connection pool size by state (idle/active/max)
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connection count by state",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Failures while opening a read snapshot, by stage
    static ref DB_SNAPSHOT_ERRORS: IntCounterVec = register_int_counter_vec!(
        "db_read_snapshot_errors_total",
        "Errors while opening read-only snapshot transactions",
        &["service", "stage"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Update connection pool metrics (called periodically)
pub fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = pool.size() as i64;
    let idle = pool.num_idle() as i64;
    let active = size - idle;

    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "idle"])
        .set(idle);

    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "active"])
        .set(active);

    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "max"])
        .set(pool.options().get_max_connections() as i64);
}

/// Count a failed snapshot open (`stage` is `begin` or `isolation`)
pub fn record_snapshot_error(service: &str, stage: &str) {
    DB_SNAPSHOT_ERRORS
        .with_label_values(&[service, stage])
        .inc();
}
