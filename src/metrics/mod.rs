// Metrics module
// Prometheus counters plus a JSONL request log

mod logger;
mod recorder;

pub use logger::{MetricsLogger, RequestMetric};
pub use recorder::MetricsRecorder;
