//! Optional observability helpers for intercepted requests and token refreshes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_interceptor.request` and
//!   `oauth2_interceptor.refresh` with a `stage` field, plus warn/error events for missing
//!   credentials and failed refreshes. Token values are never recorded.
//! - Enable `metrics` to increment `oauth2_interceptor_request_total` (labeled by terminal
//!   `state`) and `oauth2_interceptor_refresh_total` (labeled by `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations instrumented by the interceptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
	/// A request passing through [`Interceptor::intercept`](crate::interceptor::Interceptor::intercept).
	Request,
	/// The mutually exclusive refresh section.
	Refresh,
}
impl SpanKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SpanKind::Request => "request",
			SpanKind::Refresh => "refresh",
		}
	}
}
impl Display for SpanKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
