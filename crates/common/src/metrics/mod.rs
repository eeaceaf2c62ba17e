//! Metrics and observability utilities
//!
//! Provides Prometheus metric registration and small recording helpers
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all QuizForge metrics
pub const METRICS_PREFIX: &str = "quizforge";

/// Histogram buckets for request-scale latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00, 30.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Ingestion metrics
    describe_counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total documents ingested"
    );

    describe_counter!(
        format!("{}_chunks_indexed_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks indexed"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Document ingestion latency in seconds"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total retrieval queries"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of chunks returned from the last retrieval"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation requests by content type"
    );

    describe_counter!(
        format!("{}_generation_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed generation requests by content type"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation request latency in seconds"
    );

    // Capability metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_counter!(
        format!("{}_embedding_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API errors"
    );

    describe_counter!(
        format!("{}_completion_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total completion API requests"
    );
}

/// Record a completed ingestion
pub fn record_ingestion(duration_secs: f64, chunk_count: usize) {
    counter!(format!("{}_documents_ingested_total", METRICS_PREFIX)).increment(1);
    counter!(format!("{}_chunks_indexed_total", METRICS_PREFIX)).increment(chunk_count as u64);
    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record a retrieval query
pub fn record_retrieval(result_count: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);
    gauge!(format!("{}_retrieval_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Record the outcome of a generation request
pub fn record_generation(content_type: &str, duration_secs: f64, success: bool) {
    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "content_type" => content_type.to_string()
    )
    .increment(1);

    if !success {
        counter!(
            format!("{}_generation_failures_total", METRICS_PREFIX),
            "content_type" => content_type.to_string()
        )
        .increment(1);
    }

    histogram!(format!("{}_generation_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}
