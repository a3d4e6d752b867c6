//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Provider fallback (fetch attempts, search results, transfer durations)
//! - Acquisition workflow (runs by outcome, run durations)
//! - Queue and worker pool (depth, slot occupancy)
//! - Library cache (refreshes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Provider Fallback Metrics
// =============================================================================

/// Fetch attempts per provider by result.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cratedigger_fetch_attempts_total",
            "Total per-provider fetch attempts",
        ),
        // result: "success", "no_candidates", "search_timeout", "search_error",
        //         "transfer_failed", "cancelled"
        &["provider", "result"],
    )
    .unwrap()
});

/// Search results returned per provider query.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cratedigger_search_results",
            "Number of search results returned per provider query",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &["provider"],
    )
    .unwrap()
});

/// Transfer duration in seconds per provider.
pub static TRANSFER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cratedigger_transfer_duration_seconds",
            "Duration of provider transfers",
        )
        .buckets(vec![
            5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["provider", "result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Workflow Metrics
// =============================================================================

/// Workflow runs total by terminal outcome.
pub static WORKFLOW_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cratedigger_workflow_runs_total", "Total workflow runs"),
        &["outcome"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// End-to-end workflow duration in seconds.
pub static WORKFLOW_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cratedigger_workflow_duration_seconds",
            "End-to-end duration of workflow runs",
        )
        .buckets(vec![
            1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["outcome"],
    )
    .unwrap()
});

/// Candidates scored per release.
pub static CANDIDATES_SCORED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cratedigger_candidates_scored",
            "Number of release candidates scored per run",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics
// =============================================================================

/// Items waiting in the queue.
pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cratedigger_queue_pending",
        "Items currently waiting in the download queue",
    )
    .unwrap()
});

/// Slots currently running a workflow.
pub static SLOTS_BUSY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cratedigger_slots_busy",
        "Worker slots currently running a workflow",
    )
    .unwrap()
});

// =============================================================================
// Library Metrics
// =============================================================================

/// Library cache rebuilds by result.
pub static LIBRARY_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cratedigger_library_refreshes_total",
            "Total library cache rebuilds",
        ),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Provider fallback
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(TRANSFER_DURATION.clone()),
        // Workflow
        Box::new(WORKFLOW_RUNS.clone()),
        Box::new(WORKFLOW_DURATION.clone()),
        Box::new(CANDIDATES_SCORED.clone()),
        // Queue
        Box::new(QUEUE_PENDING.clone()),
        Box::new(SLOTS_BUSY.clone()),
        // Library
        Box::new(LIBRARY_REFRESHES.clone()),
    ]
}
