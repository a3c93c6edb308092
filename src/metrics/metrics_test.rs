use super::*;

#[test]
fn custom_metrics_should_appear_in_exposition_output() {
    register_custom_metrics();

    CACHE_HIT_METRIC.with_label_values(&["test_cache"]).inc();
    CACHE_MISS_METRIC.with_label_values(&["test_cache"]).inc();
    SOURCE_FAILURE_METRIC.with_label_values(&["test_source"]).inc();

    let body = get_metrics_body();

    assert!(body.contains("discovery_cache_hit"));
    assert!(body.contains("discovery_cache_miss"));
    assert!(body.contains("discovery_source_failure"));
}

#[test]
fn counters_should_accumulate_per_label() {
    // A label no other test touches, so the delta is ours alone
    let counter = FIND_REPAIR_METRIC.with_label_values(&["probe"]);
    let before = counter.get();

    counter.inc();
    counter.inc();

    assert_eq!(counter.get(), before + 2);
}
