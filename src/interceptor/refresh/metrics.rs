// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh-section outcomes.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	refreshed: AtomicU64,
	reused: AtomicU64,
	auth_failures: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of times a caller entered the refresh section.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that called the token endpoint and stored a token.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that reused a token stored by a concurrent refresh.
	pub fn reused(&self) -> u64 {
		self.reused.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes rejected with a 4xx status.
	pub fn auth_failures(&self) -> u64 {
		self.auth_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshes that failed for any other reason.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refreshed(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reused(&self) {
		self.reused.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_auth_failure(&self) {
		self.auth_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
