//! Bearer-token request interceptor for a single upstream API.
//!
//! Cached tokens are attached to outgoing requests, refreshed through the client-credentials
//! grant on `401 Unauthorized`, and the request is retried exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod oauth;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{CredentialsProvider, StaticCredentials},
		config::InterceptorConfig,
		http::ReqwestHttpClient,
		interceptor::Interceptor,
		store::{MemoryStore, TokenStore},
	};

	/// Interceptor type alias used by reqwest-backed integration tests.
	pub type ReqwestTestInterceptor = Interceptor<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`Interceptor`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	///
	/// `secret` of `None` models an application without configured credentials.
	pub fn build_reqwest_test_interceptor(
		config: InterceptorConfig,
		secret: Option<&str>,
	) -> (ReqwestTestInterceptor, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let credentials: Arc<dyn CredentialsProvider> = Arc::new(StaticCredentials::new(secret));
		let interceptor = ReqwestTestInterceptor::with_http_client(
			config,
			store,
			credentials,
			test_reqwest_http_client(),
		);

		(interceptor, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, oauth2_interceptor as _};
