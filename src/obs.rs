//! Observability helpers for token flows and API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `lingxing_openapi.flow`
//!   with the `flow` and `path` fields, plus progress events for caching, refresh fallbacks
//!   and pagination.
//! - Enable `metrics` to increment `lingxing_openapi_flow_total{flow,outcome}`, record
//!   `lingxing_openapi_flow_duration_seconds` and count fetched records per endpoint.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

pub(crate) use self::tracing::flow_event;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Full authentication with app id + secret.
	Reissue,
	/// Refresh token exchange.
	Refresh,
	/// Single signed business call.
	SignedCall,
	/// Paginated range fetch.
	FetchRange,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Reissue => "reissue",
			FlowKind::Refresh => "refresh",
			FlowKind::SignedCall => "signed_call",
			FlowKind::FetchRange => "fetch_range",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`FlowSpan`] for `path` and records attempt, outcome and latency.
pub(crate) async fn observe<T, Fut>(kind: FlowKind, path: &str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, path);
	let started = Instant::now();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };
	let elapsed = started.elapsed();

	span.finish(outcome, elapsed);
	record_flow_outcome(kind, outcome);
	record_flow_duration(kind, outcome, elapsed);

	result
}
