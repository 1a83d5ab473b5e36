use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Proxy request duration in seconds. Tagged with status.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const UPSTREAM_BYTES_RECEIVED: MetricDef = MetricDef {
    name: "upstream.bytes_received",
    metric_type: MetricType::Counter,
    description: "Body bytes received from proxied targets",
};

pub const RANGE_REJECTED: MetricDef = MetricDef {
    name: "requests.range_rejected",
    metric_type: MetricType::Counter,
    description: "Requests refused because the Range header and range parameter disagree",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_BYTES_RECEIVED,
    RANGE_REJECTED,
];
