//! Observability infrastructure for the heal backend
//!
//! Provides:
//! - Prometheus metrics (prediction and store latency, outcome counters)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Prediction outcome labels
pub mod outcomes {
    pub const ANCHORED: &str = "anchored";
    pub const FALLBACK: &str = "fallback";
    pub const UNAVAILABLE: &str = "unavailable";
    pub const NOT_FOUND: &str = "not_found";
    pub const ERROR: &str = "error";
    pub const SERVED: &str = "served";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    store_read_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    landing_requests_total: IntCounterVec,
    seeded_users_total: IntCounter,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "heal_prediction_latency_seconds",
                "Time spent fetching history and computing a prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            store_read_latency_seconds: register_histogram!(
                "heal_store_read_latency_seconds",
                "Time spent reading a document from the store",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register store_read_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "heal_predictions_total",
                "Prediction requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register predictions_total"),

            landing_requests_total: register_int_counter_vec!(
                "heal_landing_requests_total",
                "Landing summary requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register landing_requests_total"),

            seeded_users_total: register_int_counter!(
                "heal_seeded_users_total",
                "Users created by the demo data seeder"
            )
            .expect("Failed to register seeded_users_total"),
        }
    }
}

/// Handle to the process-wide service metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_store_read_latency(&self, duration_secs: f64) {
        self.inner().store_read_latency_seconds.observe(duration_secs);
    }

    /// Count a prediction request under one of the `outcomes` labels
    pub fn inc_predictions(&self, outcome: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn predictions(&self, outcome: &str) -> u64 {
        self.inner()
            .predictions_total
            .with_label_values(&[outcome])
            .get()
    }

    pub fn inc_landing_requests(&self, outcome: &str) {
        self.inner()
            .landing_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn add_seeded_users(&self, count: u64) {
        self.inner().seeded_users_total.inc_by(count);
    }
}

/// Structured logger for service events
///
/// Emits consistently named JSON events for predictions, landing reads
/// and lifecycle changes.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_startup(&self, version: &str, project_id: &str, port: u16) {
        info!(
            event = "server_started",
            instance = %self.instance,
            version = %version,
            project_id = %project_id,
            port = port,
            "Heal backend started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Heal backend shutting down"
        );
    }

    pub fn log_prediction(
        &self,
        user_id: &str,
        screening_id: &str,
        predicted_date: &str,
        basis: &str,
        cycle_length_days: i32,
        adjustment_days: i32,
    ) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            user_id = %user_id,
            screening_id = %screening_id,
            predicted_date = %predicted_date,
            basis = %basis,
            cycle_length_days = cycle_length_days,
            adjustment_days = adjustment_days,
            "Generated next period prediction"
        );
    }

    pub fn log_prediction_unavailable(&self, user_id: &str, screening_id: &str) {
        info!(
            event = "prediction_unavailable",
            instance = %self.instance,
            user_id = %user_id,
            screening_id = %screening_id,
            "Screening has no cycle history"
        );
    }

    pub fn log_prediction_failed(&self, user_id: &str, screening_id: &str, error: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            user_id = %user_id,
            screening_id = %screening_id,
            error = %error,
            "Prediction failed"
        );
    }

    pub fn log_landing(&self, user_id: &str, found: bool) {
        info!(
            event = "landing_served",
            instance = %self.instance,
            user_id = %user_id,
            found = found,
            "Landing summary requested"
        );
    }

    pub fn log_seed(&self, users_created: usize, users_skipped: usize, documents: usize) {
        if users_created == 0 {
            info!(
                event = "seed_completed",
                instance = %self.instance,
                users_skipped = users_skipped,
                "Seed data already present"
            );
        } else {
            info!(
                event = "seed_completed",
                instance = %self.instance,
                users_created = users_created,
                users_skipped = users_skipped,
                documents_written = documents,
                "Seeded demo data"
            );
        }
    }
}
