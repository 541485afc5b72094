use anyhow::Result;
use metrics::{counter, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::models::AnalysisResult;
use crate::responder::ResponseBranch;

/// Metric names exported through the `metrics` facade
pub mod names {
    /// Messages analyzed, by category
    pub const MESSAGES_ANALYZED_TOTAL: &str = "recovery_messages_analyzed_total";
    /// Messages flagged as crisis
    pub const CRISIS_DETECTED_TOTAL: &str = "recovery_crisis_detected_total";
    /// Sentiment distribution
    pub const MESSAGE_SENTIMENT: &str = "recovery_message_sentiment";
    /// Replies sent, by branch
    pub const RESPONSES_SELECTED_TOTAL: &str = "recovery_responses_selected_total";
    /// Unconfirmed writes, by store
    pub const PERSIST_FAILURES_TOTAL: &str = "recovery_persist_failures_total";
    /// Patient record updates, by kind
    pub const PATIENT_UPDATES_TOTAL: &str = "recovery_patient_updates_total";
    /// Dashboard view loads, by view and status
    pub const DASHBOARD_LOADS_TOTAL: &str = "recovery_dashboard_loads_total";
    /// Dashboard view load time
    pub const DASHBOARD_LOAD_DURATION: &str = "recovery_dashboard_load_duration_seconds";
    /// Errors, by type and operation
    pub const ERRORS_TOTAL: &str = "recovery_errors_total";
}

/// Metrics collection and management
///
/// Every record call is forwarded to the global `metrics` recorder and also
/// tallied locally so callers (and tests) can read the totals back.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    messages_analyzed: AtomicU64,
    crisis_detected: AtomicU64,
    responses_selected: AtomicU64,
    persist_failures: AtomicU64,
    patient_updates: AtomicU64,
    dashboard_loads: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {e}"))?;

        Ok(())
    }

    /// Record one analyzed message
    pub fn record_analysis(&self, analysis: &AnalysisResult) {
        self.messages_analyzed.fetch_add(1, Ordering::Relaxed);
        counter!(names::MESSAGES_ANALYZED_TOTAL, "category" => analysis.category.as_str()).increment(1);
        histogram!(names::MESSAGE_SENTIMENT).record(analysis.sentiment);

        if analysis.crisis_flag {
            self.crisis_detected.fetch_add(1, Ordering::Relaxed);
            counter!(names::CRISIS_DETECTED_TOTAL).increment(1);
        }
    }

    /// Record which response branch was used
    pub fn record_response(&self, branch: ResponseBranch) {
        self.responses_selected.fetch_add(1, Ordering::Relaxed);
        counter!(names::RESPONSES_SELECTED_TOTAL, "branch" => branch.as_str()).increment(1);
    }

    /// Record a write to `store` that was not confirmed
    pub fn record_persist_failure(&self, store: &'static str) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        counter!(names::PERSIST_FAILURES_TOTAL, "store" => store).increment(1);
        self.record_error("storage", store);
    }

    /// Record a change to the patient's own records
    pub fn record_patient_update(&self, kind: &'static str) {
        self.patient_updates.fetch_add(1, Ordering::Relaxed);
        counter!(names::PATIENT_UPDATES_TOTAL, "kind" => kind).increment(1);
    }

    /// Record a dashboard view load
    pub fn record_dashboard_load(&self, view: &'static str, duration: Duration, success: bool) {
        self.dashboard_loads.fetch_add(1, Ordering::Relaxed);
        let status = if success { "success" } else { "error" };
        counter!(names::DASHBOARD_LOADS_TOTAL, "view" => view, "status" => status).increment(1);
        histogram!(names::DASHBOARD_LOAD_DURATION, "view" => view).record(duration.as_secs_f64());

        if !success {
            self.record_error("database", view);
        }
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!(names::ERRORS_TOTAL, "type" => error_type, "operation" => operation).increment(1);
    }

    /// Messages analyzed so far
    pub fn messages_analyzed(&self) -> u64 {
        self.messages_analyzed.load(Ordering::Relaxed)
    }

    /// Crisis messages seen so far
    pub fn crisis_detected(&self) -> u64 {
        self.crisis_detected.load(Ordering::Relaxed)
    }

    /// Responses produced so far
    pub fn responses_selected(&self) -> u64 {
        self.responses_selected.load(Ordering::Relaxed)
    }

    /// Unconfirmed history writes so far
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Patient record updates so far
    pub fn patient_updates(&self) -> u64 {
        self.patient_updates.load(Ordering::Relaxed)
    }

    /// Dashboard loads so far
    pub fn dashboard_loads(&self) -> u64 {
        self.dashboard_loads.load(Ordering::Relaxed)
    }

    /// Errors recorded so far
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}
