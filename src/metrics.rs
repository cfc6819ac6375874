use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("waitlist_requests_total", "Total number of signup requests")
            .expect("register waitlist_requests_total");
    pub static ref SIGNUPS: CounterVec = register_counter_vec!(
        "waitlist_signups_total",
        "Accepted signups by outcome (created, duplicate)",
        &["outcome"]
    )
    .expect("register waitlist_signups_total");
    pub static ref REJECTIONS: CounterVec = register_counter_vec!(
        "waitlist_rejections_total",
        "Rejected signup requests by reason",
        &["reason"]
    )
    .expect("register waitlist_rejections_total");
    pub static ref STORE_LATENCY: Histogram = register_histogram!(
        "waitlist_store_latency_seconds",
        "Datastore insert latency in seconds"
    )
    .expect("register waitlist_store_latency_seconds");
    pub static ref COUNT_CACHE_HITS: Counter =
        register_counter!("waitlist_count_cache_hits_total", "Total count cache hits")
            .expect("register waitlist_count_cache_hits_total");
    pub static ref COUNT_CACHE_MISSES: Counter =
        register_counter!("waitlist_count_cache_misses_total", "Total count cache misses")
            .expect("register waitlist_count_cache_misses_total");
    pub static ref RATE_LIMIT_TRACKED: Gauge = register_gauge!(
        "waitlist_rate_limit_tracked",
        "Client identifiers tracked by the rate limiter after the last sweep"
    )
    .expect("register waitlist_rate_limit_tracked");
}
