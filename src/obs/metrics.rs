// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented once per attempt and once per terminal outcome.
pub const FLOW_COUNTER: &str = "lingxing_openapi_flow_total";
/// Histogram of end-to-end flow latency in seconds, labeled by `flow` + `outcome`.
pub const FLOW_DURATION_HISTOGRAM: &str = "lingxing_openapi_flow_duration_seconds";
/// Counter of records returned by range fetches, labeled by endpoint `path`.
pub const RECORDS_COUNTER: &str = "lingxing_openapi_records_total";

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how long a finished flow took.
pub fn record_flow_duration(kind: FlowKind, outcome: FlowOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(
			FLOW_DURATION_HISTOGRAM,
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.record(elapsed.as_secs_f64());
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome, elapsed);
	}
}

/// Adds `count` fetched records for the endpoint at `path`.
pub fn record_fetched_records(path: &str, count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(RECORDS_COUNTER, "path" => path.to_owned()).increment(count as u64);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (path, count);
	}
}
