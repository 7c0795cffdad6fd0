//! Interceptor configuration (target host, token endpoint, store key) and its validating builder.

// self
use crate::_prelude::*;

/// Errors raised while constructing or validating an [`InterceptorConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ConfigValidationError {
	/// The target domain substring is empty or contains whitespace.
	#[error("Target domain must be a non-empty token without whitespace: {domain:?}.")]
	InvalidTargetDomain {
		/// Rejected domain value.
		domain: String,
	},
	/// Token endpoint must use HTTPS unless it points at a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Token endpoint string could not be parsed.
	#[error("The token endpoint is not a valid URL: {url}.")]
	InvalidEndpoint {
		/// Raw endpoint value.
		url: String,
	},
	/// The key-value store key is empty.
	#[error("Token store key must not be empty.")]
	EmptyStoreKey,
}

/// Immutable configuration consumed by [`Interceptor`](crate::interceptor::Interceptor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterceptorConfig {
	/// Substring matched against the request authority to decide whether to intercept.
	pub target_domain: String,
	/// Token endpoint for the client-credentials grant.
	pub token_endpoint: Url,
	/// Key under which the bearer token lives in the [`TokenStore`](crate::store::TokenStore).
	pub token_store_key: String,
	/// Methods forwarded without authorization (write operations, the token call itself).
	pub exempt_methods: Vec<::http::Method>,
}
impl InterceptorConfig {
	/// Default target domain substring.
	pub const DEFAULT_TARGET_DOMAIN: &'static str = "spotify";
	/// Default client-credentials token endpoint.
	pub const DEFAULT_TOKEN_ENDPOINT: &'static str = "https://accounts.spotify.com/api/token";
	/// Default namespaced store key for the bearer token.
	pub const DEFAULT_TOKEN_STORE_KEY: &'static str = "oauth2_interceptor.spotify_token";

	/// Creates a new builder seeded with defaults.
	pub fn builder() -> InterceptorConfigBuilder {
		InterceptorConfigBuilder::default()
	}

	/// Builds the default configuration targeting the Spotify Web API.
	pub fn spotify() -> Result<Self, ConfigValidationError> {
		Self::builder().build()
	}

	/// Returns `true` when the request authority contains the target domain.
	pub fn targets(&self, uri: &::http::Uri) -> bool {
		uri.authority().is_some_and(|authority| authority.as_str().contains(&self.target_domain))
	}

	/// Returns `true` when requests with `method` bypass authorization.
	pub fn is_exempt(&self, method: &::http::Method) -> bool {
		self.exempt_methods.contains(method)
	}

	fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.target_domain.is_empty() || self.target_domain.chars().any(char::is_whitespace) {
			return Err(ConfigValidationError::InvalidTargetDomain {
				domain: self.target_domain.clone(),
			});
		}
		if self.token_store_key.is_empty() {
			return Err(ConfigValidationError::EmptyStoreKey);
		}

		validate_endpoint(&self.token_endpoint)
	}
}

/// Builder for [`InterceptorConfig`] values.
#[derive(Debug, Default)]
pub struct InterceptorConfigBuilder {
	/// Optional target domain override.
	pub target_domain: Option<String>,
	/// Optional token endpoint override.
	pub token_endpoint: Option<Url>,
	/// Optional store key override.
	pub token_store_key: Option<String>,
	/// Optional exempt method set override.
	pub exempt_methods: Option<Vec<::http::Method>>,
}
impl InterceptorConfigBuilder {
	/// Sets the target domain substring.
	pub fn target_domain(mut self, domain: impl Into<String>) -> Self {
		self.target_domain = Some(domain.into());

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Parses and sets the token endpoint.
	pub fn token_endpoint_str(
		self,
		url: impl AsRef<str>,
	) -> Result<Self, ConfigValidationError> {
		let raw = url.as_ref();
		let parsed = Url::parse(raw)
			.map_err(|_| ConfigValidationError::InvalidEndpoint { url: raw.to_owned() })?;

		Ok(self.token_endpoint(parsed))
	}

	/// Sets the key-value store key.
	pub fn token_store_key(mut self, key: impl Into<String>) -> Self {
		self.token_store_key = Some(key.into());

		self
	}

	/// Replaces the exempt method set.
	pub fn exempt_methods<I>(mut self, methods: I) -> Self
	where
		I: IntoIterator<Item = ::http::Method>,
	{
		self.exempt_methods = Some(methods.into_iter().collect());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<InterceptorConfig, ConfigValidationError> {
		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => Url::parse(InterceptorConfig::DEFAULT_TOKEN_ENDPOINT).map_err(|_| {
				ConfigValidationError::InvalidEndpoint {
					url: InterceptorConfig::DEFAULT_TOKEN_ENDPOINT.into(),
				}
			})?,
		};
		let config = InterceptorConfig {
			target_domain: self
				.target_domain
				.unwrap_or_else(|| InterceptorConfig::DEFAULT_TARGET_DOMAIN.into()),
			token_endpoint,
			token_store_key: self
				.token_store_key
				.unwrap_or_else(|| InterceptorConfig::DEFAULT_TOKEN_STORE_KEY.into()),
			exempt_methods: self.exempt_methods.unwrap_or_else(|| vec![::http::Method::POST]),
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigValidationError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ConfigValidationError::InsecureEndpoint { url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_spotify() {
		let config = InterceptorConfig::spotify().expect("Defaults should validate.");

		assert_eq!(config.token_endpoint.as_str(), InterceptorConfig::DEFAULT_TOKEN_ENDPOINT);
		assert!(config.targets(&"https://api.spotify.com/v1/search".parse().expect("Valid URI.")));
		assert!(!config.targets(&"https://example.com/spotify".parse().expect("Valid URI.")));
		assert!(config.is_exempt(&::http::Method::POST));
		assert!(!config.is_exempt(&::http::Method::GET));
	}

	#[test]
	fn rejects_insecure_remote_endpoint() {
		let err = InterceptorConfig::builder()
			.token_endpoint_str("http://accounts.example.com/api/token")
			.expect("URL should parse.")
			.build()
			.expect_err("Plain HTTP endpoints on remote hosts should be rejected.");

		assert!(matches!(err, ConfigValidationError::InsecureEndpoint { .. }));

		InterceptorConfig::builder()
			.token_endpoint_str("http://127.0.0.1:8080/api/token")
			.expect("URL should parse.")
			.build()
			.expect("Loopback endpoints are accepted for local testing.");
	}

	#[test]
	fn rejects_blank_domain_and_key() {
		let err = InterceptorConfig::builder()
			.target_domain("api spotify")
			.build()
			.expect_err("Whitespace in the domain should be rejected.");

		assert!(matches!(err, ConfigValidationError::InvalidTargetDomain { .. }));

		let err = InterceptorConfig::builder()
			.token_store_key("")
			.build()
			.expect_err("Empty store keys should be rejected.");

		assert_eq!(err, ConfigValidationError::EmptyStoreKey);
	}

	#[test]
	fn unparsable_endpoint_is_reported() {
		let err = InterceptorConfig::builder()
			.token_endpoint_str("not a url")
			.expect_err("Garbage endpoints should fail to parse.");

		assert!(matches!(err, ConfigValidationError::InvalidEndpoint { .. }));
	}
}
