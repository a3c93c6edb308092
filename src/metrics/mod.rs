use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref CACHE_HIT_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("discovery_cache_hit", "discovery_cache_hit"),
        &["cache"]
    )
    .expect("metric can not be created");

    pub static ref CACHE_MISS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("discovery_cache_miss", "discovery_cache_miss"),
        &["cache"]
    )
    .expect("metric can not be created");

    pub static ref SOURCE_FAILURE_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("discovery_source_failure", "discovery_source_failure"),
        &["source"]
    )
    .expect("Should succeed to create metric");

    pub static ref CACHE_REFRESH_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("discovery_cache_refresh", "discovery_cache_refresh"),
        &["cache", "outcome"]
    )
    .expect("Should succeed to create metric");

    pub static ref FIND_REPAIR_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("find_cache_repair", "find_cache_repair"),
        &["outcome"]
    )
    .expect("Should succeed to create metric");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(CACHE_HIT_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISS_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(SOURCE_FAILURE_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(CACHE_REFRESH_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(FIND_REPAIR_METRIC.clone()))
        .expect("collector can be registered");
}

/// Renders every registered collector in Prometheus text format
pub fn get_metrics_body() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        eprintln!("could not encode custom metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        eprintln!("could not encode prometheus metrics: {}", e);
    };
    let res_default = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    let autometrics_response = prometheus_exporter::encode_http_response();
    res.push_str(&res_default);
    res.push_str(autometrics_response.body());
    res
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics() -> PrometheusResponse {
    prometheus_exporter::encode_http_response()
}
