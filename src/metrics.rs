use tracing::trace;

// Trace-based metric helpers. The Prometheus recorder stays wired in main;
// these events give per-stage visibility without metrics macros in hot paths.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "lister.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "lister.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn inc_aspect_miss(aspect: &str) {
    trace!(
        target = "lister.metrics",
        aspect = aspect,
        "aspect_miss_total_inc"
    );
}
