use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Counter, Encoder, Gauge, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = build_registry();
    pub static ref READINGS_ACCEPTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_readings_accepted_total",
        "Total telemetry readings stored"
    ))
    .unwrap();
    pub static ref READINGS_REJECTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "ingestor_readings_rejected_total",
        "Total telemetry readings rejected by validation"
    ))
    .unwrap();
    pub static ref DEVICES_TRACKED: Gauge = Gauge::with_opts(Opts::new(
        "ingestor_devices_tracked",
        "Devices with stored telemetry"
    ))
    .unwrap();
}

fn build_registry() -> Registry {
    let registry = Registry::new();
    let collectors: [(&str, Box<dyn Collector>); 3] = [
        ("readings_accepted", Box::new(READINGS_ACCEPTED_TOTAL.clone())),
        ("readings_rejected", Box::new(READINGS_REJECTED_TOTAL.clone())),
        ("devices_tracked", Box::new(DEVICES_TRACKED.clone())),
    ];
    for (name, collector) in collectors {
        if let Err(e) = registry.register(collector) {
            error!("Failed to register {} metric: {}", name, e);
        }
    }
    registry
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
