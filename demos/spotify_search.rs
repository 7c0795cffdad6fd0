//! Demonstrates wrapping search calls to a mocked catalog API with the interceptor.
//!
//! The first call goes out with an expired token, the API answers 401, the interceptor exchanges
//! the client secret for a new token, stores it, and retries once. The second call reuses the
//! stored token without touching the token endpoint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_interceptor::{
	auth::{CredentialsProvider, StaticCredentials},
	config::InterceptorConfig,
	http::ReqwestHttpClient,
	http_types::Request,
	interceptor::{Interceptor, LogoutFlag},
	reqwest::Client,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token").body("grant_type=client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\"}");
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/search").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"tracks\":{\"items\":[{\"name\":\"Windowlicker\"}]}}");
		})
		.await;
	let _expired_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/search").header("authorization", "Bearer expired");
			then.status(401);
		})
		.await;
	let config = InterceptorConfig::builder()
		.target_domain("127.0.0.1")
		.token_endpoint(Url::parse(&server.url("/api/token"))?)
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let credentials: Arc<dyn CredentialsProvider> =
		Arc::new(StaticCredentials::new(Some("demo-client:demo-secret")));
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let logout = Arc::new(LogoutFlag::default());
	let interceptor = <Interceptor<ReqwestHttpClient>>::with_http_client(
		config,
		store.clone(),
		credentials,
		http_client,
	)
	.with_logout(logout.clone());

	store.put(&interceptor.config.token_store_key, "expired".into()).await?;

	for query in ["windowlicker", "avril-14th"] {
		let request = Request::get(server.url(format!("/v1/search?q={query}&type=track")))
			.body(Vec::new())?;
		let interception = interceptor.intercept(request).await?;

		println!(
			"Search {query:?} finished as {} with HTTP {}: {}.",
			interception.state,
			interception.response.status(),
			String::from_utf8_lossy(interception.response.body()),
		);
	}

	println!("Logout requested: {}.", logout.is_raised());

	token_mock.assert_calls_async(1).await;
	search_mock.assert_calls_async(2).await;

	Ok(())
}
