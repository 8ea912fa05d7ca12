//! Advisor call metrics.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::client::AdviceCall;

/// Metric name constants for consistency.
pub mod names {
    /// Advisor calls by call shape and outcome.
    pub const CALLS_TOTAL: &str = "shotcoach_advisor_calls_total";

    /// Advisor call latency in seconds by call shape.
    pub const LATENCY_SECONDS: &str = "shotcoach_advisor_latency_seconds";
}

/// Record one finished advisor call. `outcome` is `ok` or a failure kind.
pub fn record_call(call: AdviceCall, outcome: &str, elapsed: Duration) {
    counter!(
        names::CALLS_TOTAL,
        "call" => call.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "call" => call.as_str()
    )
    .record(elapsed.as_secs_f64());
}
