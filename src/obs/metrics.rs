// self
use crate::interceptor::{InterceptState, RefreshOutcome};

/// Records the terminal state of an intercepted request (when `metrics` is enabled).
pub fn record_request_state(state: InterceptState) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_interceptor_request_total", "state" => state.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = state;
	}
}

/// Records the outcome of a refresh section (when `metrics` is enabled).
pub fn record_refresh_outcome(outcome: &RefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_interceptor_refresh_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::TokenSecret;

	#[test]
	fn recorders_noop_without_metrics() {
		record_request_state(InterceptState::PassThrough);
		record_refresh_outcome(&RefreshOutcome::Reused(TokenSecret::new("reused")));
	}
}
