//! Mutually exclusive token refresh with single-flight reuse.
//!
//! Every caller that receives a 401 enters the same [`AsyncMutex`] section held by a
//! [`RefreshLedger`]. Each caller notes the ledger generation when it sends its request; an
//! exchange performed under the section bumps the generation and records its outcome. Once a
//! waiter holds the section:
//!
//! 1. if the generation moved, another caller already talked to the token endpoint, so the
//!    waiter adopts that outcome (token, rejection, or failure) without a network call and
//!    without raising another logout;
//! 2. otherwise, if the store holds a token different from the one the failed request carried,
//!    that token is reused;
//! 3. otherwise the client-credentials exchange runs and a successful token overwrites the stored
//!    value before the section is released.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{ClientSecret, TokenSecret},
	error::ConfigError,
	http::HttpTransport,
	interceptor::Interceptor,
	oauth,
	obs::{self, InterceptSpan, SpanKind},
};

/// Result of one pass through the refresh section.
///
/// Failures are shared behind an [`Arc`] so callers that waited on the same exchange observe the
/// same error.
#[derive(Clone, Debug)]
pub enum RefreshOutcome {
	/// This caller obtained and stored a new token.
	Refreshed(TokenSecret),
	/// A concurrent caller had already stored a newer token.
	Reused(TokenSecret),
	/// The token endpoint answered 4xx; the caller must re-authenticate.
	AuthFailed(Arc<Error>),
	/// Network failure, non-4xx error status, malformed body, or storage failure.
	Failed(Arc<Error>),
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Refreshed(_) => "refreshed",
			Self::Reused(_) => "reused",
			Self::AuthFailed(_) => "auth_failed",
			Self::Failed(_) => "failed",
		}
	}

	/// Returns the token to retry with, if the refresh produced one.
	pub fn token(&self) -> Option<&TokenSecret> {
		match self {
			Self::Refreshed(token) | Self::Reused(token) => Some(token),
			Self::AuthFailed(_) | Self::Failed(_) => None,
		}
	}

	/// Returns the failure, if any.
	pub fn error(&self) -> Option<&Error> {
		match self {
			Self::AuthFailed(err) | Self::Failed(err) => Some(err.as_ref()),
			Self::Refreshed(_) | Self::Reused(_) => None,
		}
	}

	/// Returns `true` for [`RefreshOutcome::AuthFailed`].
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::AuthFailed(_))
	}

	fn failed(err: impl Into<Error>) -> Self {
		Self::Failed(Arc::new(err.into()))
	}

	fn from_exchange(err: Error) -> Self {
		if err.is_auth_failure() {
			Self::AuthFailed(Arc::new(err))
		} else {
			Self::Failed(Arc::new(err))
		}
	}

	/// The view of this outcome for a caller that waited on it.
	fn adopted(&self) -> Self {
		match self {
			Self::Refreshed(token) | Self::Reused(token) => Self::Reused(token.clone()),
			Self::AuthFailed(err) => Self::AuthFailed(err.clone()),
			Self::Failed(err) => Self::Failed(err.clone()),
		}
	}
}

/// Refresh section shared by an interceptor and its clones.
#[derive(Debug, Default)]
pub(crate) struct RefreshLedger {
	generation: AtomicU64,
	last: AsyncMutex<Option<RefreshOutcome>>,
}
impl RefreshLedger {
	/// Number of token exchanges settled so far.
	pub(crate) fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

impl<C> Interceptor<C>
where
	C: ?Sized + HttpTransport,
{
	/// Refreshes the cached token on demand, e.g. to warm the cache before the first request.
	///
	/// Shares the refresh section with [`Interceptor::intercept`]; the outcome of an exchange that
	/// settled while this call waited is adopted.
	pub async fn refresh_token(&self) -> RefreshOutcome {
		self.refresh_metrics.record_attempt();

		let stale = match self.current_token().await {
			Ok(token) => token,
			Err(err) => return self.settled(RefreshOutcome::failed(err)),
		};
		let observed = self.refresh_ledger.generation();

		match self.credentials.client_secret() {
			Some(secret) => self.refresh_locked(&secret, stale.as_ref(), observed).await,
			None => self.settled(RefreshOutcome::failed(ConfigError::MissingClientSecret)),
		}
	}

	/// Runs the refresh section for a request that failed while carrying `stale`.
	///
	/// `observed` is the ledger generation read after `stale` was loaded.
	pub(crate) async fn refresh_section(
		&self,
		secret: &ClientSecret,
		stale: Option<&TokenSecret>,
		observed: u64,
	) -> RefreshOutcome {
		self.refresh_metrics.record_attempt();
		self.refresh_locked(secret, stale, observed).await
	}

	async fn refresh_locked(
		&self,
		secret: &ClientSecret,
		stale: Option<&TokenSecret>,
		observed: u64,
	) -> RefreshOutcome {
		let span = InterceptSpan::new(SpanKind::Refresh, "refresh_section");

		span.instrument(async {
			let mut last = self.refresh_ledger.last.lock().await;

			match &*last {
				Some(settled) if self.refresh_ledger.generation() != observed =>
					return self.adopted(settled.adopted()),
				_ => {},
			}

			match self.current_token().await {
				Ok(Some(current)) if stale != Some(&current) =>
					return self.settled(RefreshOutcome::Reused(current)),
				Ok(_) => {},
				Err(err) => return self.settled(RefreshOutcome::failed(err)),
			}

			let outcome = self.exchange_and_store(secret).await;

			*last = Some(outcome.clone());
			self.refresh_ledger.generation.fetch_add(1, Ordering::AcqRel);

			self.settled(outcome)
		})
		.await
	}

	async fn exchange_and_store(&self, secret: &ClientSecret) -> RefreshOutcome {
		let token = match oauth::exchange_client_credentials(
			self.http_client.as_ref(),
			&self.config.token_endpoint,
			secret,
		)
		.await
		{
			Ok(token) => token,
			Err(err) => return RefreshOutcome::from_exchange(err),
		};

		match self.store.put(&self.config.token_store_key, token.expose().to_owned()).await {
			Ok(()) => RefreshOutcome::Refreshed(token),
			Err(err) => RefreshOutcome::failed(err),
		}
	}

	fn adopted(&self, outcome: RefreshOutcome) -> RefreshOutcome {
		self.refresh_metrics.record_reused();
		obs::refresh_reused();

		outcome
	}

	fn settled(&self, outcome: RefreshOutcome) -> RefreshOutcome {
		match &outcome {
			RefreshOutcome::Refreshed(_) => {
				self.refresh_metrics.record_refreshed();
				obs::refresh_succeeded();
			},
			RefreshOutcome::Reused(_) => {
				self.refresh_metrics.record_reused();
				obs::refresh_reused();
			},
			RefreshOutcome::AuthFailed(err) => {
				self.refresh_metrics.record_auth_failure();
				obs::refresh_rejected(err);
				self.logout.on_auth_failed(err);
			},
			RefreshOutcome::Failed(err) => {
				self.refresh_metrics.record_failure();
				obs::refresh_failed(err);
			},
		}

		obs::record_refresh_outcome(&outcome);

		outcome
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn waiters_adopt_tokens_as_reused_and_share_failures() {
		let refreshed = RefreshOutcome::Refreshed(TokenSecret::new("abc123"));
		let adopted = refreshed.adopted();

		assert_eq!(adopted.as_str(), "reused");
		assert_eq!(adopted.token().map(TokenSecret::expose), Some("abc123"));

		let rejected =
			RefreshOutcome::from_exchange(Error::InvalidClient { status: 400, reason: "x".into() });
		let adopted = rejected.adopted();

		assert!(adopted.requires_login());
		assert!(matches!(
			(&rejected, &adopted),
			(RefreshOutcome::AuthFailed(a), RefreshOutcome::AuthFailed(b)) if Arc::ptr_eq(a, b)
		));
		assert!(
			!RefreshOutcome::failed(ConfigError::MissingClientSecret).adopted().requires_login()
		);
	}
}
