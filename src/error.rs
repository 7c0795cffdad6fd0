//! Interceptor-level error types shared across the transport, token endpoint, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token store read or write failed.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Invalid configuration or a request that could not be built.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may retry later.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// The downstream call or the token call never produced a response.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the client credentials with a 4xx status.
	#[error("Token endpoint rejected the client credentials ({status}): {reason}.")]
	InvalidClient {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Provider- or interceptor-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns `true` when the error means the client must re-authenticate.
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Self::InvalidClient { .. })
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Interceptor configuration failed validation.
	#[error(transparent)]
	Validation(#[from] crate::config::ConfigValidationError),
	/// An `http::Request` could not be assembled.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// A header value could not be encoded.
	#[error("Header value is not valid ASCII.")]
	InvalidHeaderValue(#[from] ::http::header::InvalidHeaderValue),
	/// A refresh was requested but no client secret is configured.
	#[error("No client secret is configured.")]
	MissingClientSecret,
}

/// Token endpoint failures that do not invalidate the client credentials.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token refresh failed: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// Status reported by the token endpoint.
		status: Option<u16>,
		/// Parsed `Retry-After` header, when the endpoint sent one.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token response is not a JSON object with an access_token string.")]
	TokenResponseParse {
		/// Parse error including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// Status reported by the token endpoint.
		status: Option<u16>,
	},
}
impl TransientError {
	/// Returns the upstream Retry-After hint, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::TokenEndpoint { retry_after, .. } => *retry_after,
			Self::TokenResponseParse { .. } => None,
		}
	}
}

/// Failures that prevented a response from being received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// DNS, connect, TLS, or body read failure.
	#[error("Request failed before a response was received.")]
	Network {
		/// Error reported by the transport.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Boxes a transport error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn invalid_client_is_auth_failure() {
		let err = Error::InvalidClient { status: 400, reason: "invalid_client".into() };

		assert!(err.is_auth_failure());
		assert!(err.to_string().contains("400"));

		let transient: Error = TransientError::TokenEndpoint {
			message: "upstream unavailable".into(),
			status: Some(503),
			retry_after: Some(Duration::seconds(30)),
		}
		.into();

		assert!(!transient.is_auth_failure());
	}

	#[test]
	fn retry_after_is_exposed_for_endpoint_failures() {
		let err = TransientError::TokenEndpoint {
			message: "upstream unavailable".into(),
			status: Some(503),
			retry_after: Some(Duration::seconds(12)),
		};

		assert_eq!(err.retry_after(), Some(Duration::seconds(12)));
	}
}
