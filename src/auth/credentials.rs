//! Client-secret providers consulted before every intercepted request.
//!
//! The interceptor never caches the secret itself; it asks the provider on each call so
//! applications can rotate or clear credentials at runtime. Empty values are normalized to
//! `None`, which disables header attachment and refreshes.

// std
use std::env;
// self
use crate::{_prelude::*, auth::ClientSecret};

/// Source of the client secret used by the client-credentials grant.
pub trait CredentialsProvider
where
	Self: Send + Sync,
{
	/// Returns the configured secret, or `None` when credentials are absent.
	fn client_secret(&self) -> Option<ClientSecret>;
}

/// Provider returning a fixed secret supplied at construction time.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials(Option<ClientSecret>);
impl StaticCredentials {
	/// Creates a provider for the optional secret; empty strings count as absent.
	pub fn new(secret: Option<&str>) -> Self {
		Self(secret.filter(|value| !value.is_empty()).map(ClientSecret::new))
	}
}
impl CredentialsProvider for StaticCredentials {
	fn client_secret(&self) -> Option<ClientSecret> {
		self.0.clone()
	}
}

/// Provider reading the secret from an environment variable on every call.
#[derive(Clone, Debug)]
pub struct EnvCredentials {
	var: String,
}
impl EnvCredentials {
	/// Environment variable consulted by [`EnvCredentials::default`].
	pub const DEFAULT_VAR: &'static str = "SPOTIFY_CLIENT_SECRET";

	/// Creates a provider that reads `var`.
	pub fn new(var: impl Into<String>) -> Self {
		Self { var: var.into() }
	}

	/// Returns the environment variable name.
	pub fn var(&self) -> &str {
		&self.var
	}
}
impl Default for EnvCredentials {
	fn default() -> Self {
		Self::new(Self::DEFAULT_VAR)
	}
}
impl CredentialsProvider for EnvCredentials {
	fn client_secret(&self) -> Option<ClientSecret> {
		env::var(&self.var).ok().filter(|value| !value.is_empty()).map(ClientSecret::new)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn static_credentials_treat_empty_as_absent() {
		assert!(StaticCredentials::new(None).client_secret().is_none());
		assert!(StaticCredentials::new(Some("")).client_secret().is_none());

		let secret = StaticCredentials::new(Some("id:secret"))
			.client_secret()
			.expect("Non-empty secret should be returned.");

		assert_eq!(secret.expose(), "id:secret");
	}

	#[test]
	fn env_credentials_missing_variable_yields_none() {
		let provider = EnvCredentials::new("OAUTH2_INTERCEPTOR_TEST_SECRET_THAT_IS_NEVER_SET");

		assert!(provider.client_secret().is_none());
		assert_eq!(EnvCredentials::default().var(), EnvCredentials::DEFAULT_VAR);
	}
}
