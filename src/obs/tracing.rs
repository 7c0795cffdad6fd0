// self
use crate::{_prelude::*, obs::SpanKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// A span builder used by the interceptor.
#[derive(Clone, Debug)]
pub struct InterceptSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl InterceptSpan {
	/// Creates a new span tagged with the provided kind + stage.
	pub fn new(kind: SpanKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = match kind {
				SpanKind::Request => tracing::info_span!("oauth2_interceptor.request", stage),
				SpanKind::Refresh => tracing::info_span!("oauth2_interceptor.refresh", stage),
			};

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
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
}

/// Emits a warning for a targeted request sent without credentials.
pub fn missing_secret(uri: &::http::Uri) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%uri, "Client secret is empty; forwarding request without authorization.");
	#[cfg(not(feature = "tracing"))]
	let _ = uri;
}

/// Emits a debug event once a refreshed token has been stored.
pub fn refresh_succeeded() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Stored refreshed access token.");
}

/// Emits a debug event when a waiter reuses a token refreshed by another caller.
pub fn refresh_reused() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Reusing access token refreshed by a concurrent request.");
}

/// Emits a warning when the token endpoint rejected the client credentials.
pub fn refresh_rejected(err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %err, "Token endpoint rejected the client credentials; signalling logout.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

/// Emits an error event for refresh failures recovered locally.
pub fn refresh_failed(err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(error = %err, "Token refresh failed; returning the unauthorized response.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = InterceptSpan::new(SpanKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn events_accept_errors_without_tracing_subscriber() {
		let err = Error::InvalidClient { status: 401, reason: "invalid_client".into() };

		refresh_rejected(&err);
		refresh_failed(&err);
		refresh_succeeded();
		refresh_reused();
		missing_secret(&"https://api.spotify.com/v1/me".parse().expect("Fixture URI should parse."));
	}
}
