use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Histogram, HistogramVec, IntCounter, IntCounterVec,
};

lazy_static! {
    /// Reaction state machine outcomes (created/updated/removed).
    pub static ref REACTION_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_reaction_outcomes_total",
        "Reaction outcomes segmented by transition",
        &["outcome"]
    )
    .expect("failed to register post_reaction_outcomes_total");

    pub static ref FEED_REQUESTS_TOTAL: IntCounter = register_int_counter!(
        "post_feed_requests_total",
        "Total feed requests served"
    )
    .expect("failed to register post_feed_requests_total");

    /// Posts returned per feed page.
    pub static ref FEED_SIZE: Histogram = register_histogram!(
        "post_feed_size",
        "Number of posts returned per feed page",
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .expect("failed to register post_feed_size");

    /// Entities removed by post cascades (post/comment/reaction/saved_ref).
    pub static ref CASCADE_DELETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_cascade_deleted_total",
        "Entities removed by post delete cascades segmented by kind",
        &["kind"]
    )
    .expect("failed to register post_cascade_deleted_total");

    /// Cleanup steps that failed after retries and await reconciliation.
    pub static ref RECONCILIATION_PENDING_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_reconciliation_pending_total",
        "Post cleanup steps left for reconciliation segmented by kind",
        &["kind"]
    )
    .expect("failed to register post_reconciliation_pending_total");

    pub static ref OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "post_operation_duration_seconds",
        "Engine operation latency segmented by operation",
        &["operation"]
    )
    .expect("failed to register post_operation_duration_seconds");
}
