//! Logout escalation raised when the token endpoint rejects the client credentials.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

/// Hook invoked once per refresh rejected with a 4xx status.
///
/// Applications route the user back to a login flow from here. The interceptor still returns
/// the original 401 response to the caller after the hook runs.
pub trait LogoutSignal
where
	Self: Send + Sync,
{
	/// Called with the token endpoint error (always [`Error::InvalidClient`]).
	fn on_auth_failed(&self, error: &Error);
}

/// Signal that ignores logout escalations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogout;
impl LogoutSignal for NoopLogout {
	fn on_auth_failed(&self, _error: &Error) {}
}

/// Latching signal that applications can poll to learn a login is required.
#[derive(Debug, Default)]
pub struct LogoutFlag(AtomicBool);
impl LogoutFlag {
	/// Returns `true` once an escalation has been raised and not yet cleared.
	pub fn is_raised(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	/// Clears the latch, returning its previous state.
	pub fn clear(&self) -> bool {
		self.0.swap(false, Ordering::AcqRel)
	}
}
impl LogoutSignal for LogoutFlag {
	fn on_auth_failed(&self, _error: &Error) {
		self.0.store(true, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flag_latches_until_cleared() {
		let flag = LogoutFlag::default();
		let err = Error::InvalidClient { status: 400, reason: "invalid_client".into() };

		assert!(!flag.is_raised());

		flag.on_auth_failed(&err);

		assert!(flag.is_raised());
		assert!(flag.clear());
		assert!(!flag.is_raised());
	}
}
