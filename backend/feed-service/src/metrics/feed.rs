use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Duration of feed requests by mode (relevance, recency, category).
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_request_duration_seconds",
        "Feed request duration segmented by ranking mode",
        &["mode"]
    )
    .expect("failed to register feed_request_duration_seconds");

    /// Total feed requests by mode and outcome.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Total feed requests segmented by ranking mode and outcome",
        &["mode", "result"]
    )
    .expect("failed to register feed_request_total");

    /// Eligible posts scored per relevance request, by weight source.
    pub static ref FEED_CANDIDATE_COUNT: HistogramVec = register_histogram_vec!(
        "feed_candidate_count",
        "Number of eligible posts scored segmented by weight source",
        &["source"],
        vec![0.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0, 10_000.0]
    )
    .expect("failed to register feed_candidate_count");

    /// Posts removed from a page by the category blocklist.
    pub static ref FEED_BLOCKED_POSTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_blocked_posts_total",
        "Posts dropped from feed pages by the category blocklist",
        &["mode"]
    )
    .expect("failed to register feed_blocked_posts_total");

    /// Classified posts recorded.
    pub static ref CLASSIFICATIONS_RECORDED_TOTAL: IntCounter = register_int_counter!(
        "feed_classifications_recorded_total",
        "Post classifications recorded"
    )
    .expect("failed to register feed_classifications_recorded_total");

    /// (user, category) interest increments applied.
    pub static ref INTEREST_INCREMENTS_TOTAL: IntCounter = register_int_counter!(
        "feed_interest_increments_total",
        "User interest increments applied"
    )
    .expect("failed to register feed_interest_increments_total");
}
