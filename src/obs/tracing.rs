// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Future returned by [`FlowSpan::instrument`]; instrumented only when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; instrumented only when tracing is enabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Emits a `tracing` event when the feature is enabled; expands to nothing otherwise.
macro_rules! flow_event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use flow_event;

/// Span covering one call against a LingXing endpoint.
///
/// Carries the `flow` label and the endpoint `path`; [`FlowSpan::finish`] closes it with
/// the outcome and elapsed time.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` against `path`.
	pub fn new(kind: FlowKind, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("lingxing_openapi.flow", flow = kind.as_str(), path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, path);

			Self {}
		}
	}

	/// Runs `fut` inside the span without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Records the terminal outcome inside the span.
	pub fn finish(&self, outcome: FlowOutcome, elapsed: StdDuration) {
		#[cfg(feature = "tracing")]
		{
			let elapsed_ms = elapsed.as_millis() as u64;

			self.span.in_scope(|| match outcome {
				FlowOutcome::Failure => {
					tracing::warn!(outcome = outcome.as_str(), elapsed_ms, "Flow failed.")
				},
				_ => tracing::debug!(outcome = outcome.as_str(), elapsed_ms, "Flow finished."),
			});
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (outcome, elapsed);
		}
	}
}
