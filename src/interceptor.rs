//! Authenticating request interceptor scoped to a single upstream API.
//!
//! [`Interceptor::intercept`] applies the authorization policy to each outgoing request:
//!
//! 1. requests whose authority does not contain the target domain are forwarded untouched;
//! 2. exempt methods (`POST` by default) are forwarded untouched;
//! 3. without a client secret the request is forwarded untouched and a warning is logged;
//! 4. otherwise the cached bearer token, when present, is attached as `Authorization: Bearer`.
//!
//! A `401 Unauthorized` answer enters the refresh section (see [`refresh`]). A refreshed or
//! reused token triggers exactly one retry; every other outcome hands the original 401 back.

pub mod logout;
pub mod refresh;

pub use logout::*;
pub use refresh::*;

// crates.io
use ::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{CredentialsProvider, TokenSecret},
	config::InterceptorConfig,
	error::ConfigError,
	http::{HttpRequest, HttpResponse, HttpTransport, clone_request},
	obs::{self, InterceptSpan, SpanKind},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Interceptor specialized for the crate's default reqwest transport.
pub type ReqwestInterceptor = Interceptor<ReqwestHttpClient>;

/// Terminal state reached by an intercepted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterceptState {
	/// Forwarded without modification (other host, exempt method, or missing secret).
	PassThrough,
	/// Forwarded with the cached token (if any) and answered with something other than 401.
	Success,
	/// Answered 401, the token was refreshed or reused, and the single retry was returned.
	RefreshedRetry,
	/// Answered 401 and the token endpoint rejected the client credentials.
	RefreshFailedClientError,
	/// Answered 401 and the refresh failed for any other reason.
	RefreshFailedOther,
}
impl InterceptState {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			InterceptState::PassThrough => "pass_through",
			InterceptState::Success => "success",
			InterceptState::RefreshedRetry => "refreshed_retry",
			InterceptState::RefreshFailedClientError => "refresh_failed_client_error",
			InterceptState::RefreshFailedOther => "refresh_failed_other",
		}
	}
}
impl Display for InterceptState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Response returned by [`Interceptor::intercept`] together with how it was obtained.
#[derive(Debug)]
pub struct Interception {
	/// Downstream response handed back to the caller.
	pub response: HttpResponse,
	/// Terminal state of the request.
	pub state: InterceptState,
	/// Refresh outcome, present only when the first attempt answered 401.
	pub refresh: Option<RefreshOutcome>,
}
impl Interception {
	fn new(response: HttpResponse, state: InterceptState, refresh: Option<RefreshOutcome>) -> Self {
		Self { response, state, refresh }
	}

	/// Returns `true` when the caller must route the user back to a login flow.
	pub fn requires_login(&self) -> bool {
		self.refresh.as_ref().is_some_and(RefreshOutcome::requires_login)
	}

	/// Consumes the interception and returns the downstream response.
	pub fn into_response(self) -> HttpResponse {
		self.response
	}
}

/// Attaches cached bearer tokens to requests for one API host and refreshes them on 401.
///
/// The interceptor owns the transport, token store, credentials provider, and logout signal so
/// callers wire dependencies explicitly. Clones share the same refresh section, so at most one
/// refresh runs at a time across every clone.
pub struct Interceptor<C>
where
	C: ?Sized + HttpTransport,
{
	/// Transport used for downstream requests, refreshes, and retries.
	pub http_client: Arc<C>,
	/// Key-value store holding the bearer token.
	pub store: Arc<dyn TokenStore>,
	/// Source of the client secret.
	pub credentials: Arc<dyn CredentialsProvider>,
	/// Hook invoked when the token endpoint rejects the client credentials.
	pub logout: Arc<dyn LogoutSignal>,
	/// Target host, token endpoint, store key, and exempt methods.
	pub config: InterceptorConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_ledger: Arc<RefreshLedger>,
}
impl<C> Interceptor<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates an interceptor that reuses the caller-provided transport.
	pub fn with_http_client(
		config: InterceptorConfig,
		store: Arc<dyn TokenStore>,
		credentials: Arc<dyn CredentialsProvider>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			credentials,
			logout: Arc::new(NoopLogout),
			config,
			refresh_metrics: Default::default(),
			refresh_ledger: Default::default(),
		}
	}

	/// Sets or replaces the logout signal.
	pub fn with_logout(mut self, logout: Arc<dyn LogoutSignal>) -> Self {
		self.logout = logout;

		self
	}

	/// Applies the authorization policy to `request` and returns the resulting response.
	///
	/// Downstream transport failures propagate as errors; refresh failures never do and instead
	/// surface through [`Interception::refresh`] alongside the original 401.
	pub async fn intercept(&self, request: HttpRequest) -> Result<Interception> {
		let span = InterceptSpan::new(SpanKind::Request, "intercept");
		let result = span.instrument(self.apply_policy(request)).await;

		if let Ok(interception) = &result {
			obs::record_request_state(interception.state);
		}

		result
	}

	/// Returns the cached bearer token, if any.
	pub async fn current_token(&self) -> Result<Option<TokenSecret>> {
		let value = self.store.get(&self.config.token_store_key).await?;

		Ok(value.map(TokenSecret::new))
	}

	/// Removes the cached bearer token so the next request is sent without one.
	pub async fn invalidate_token(&self) -> Result<Option<TokenSecret>> {
		let previous = self.store.remove(&self.config.token_store_key).await?;

		Ok(previous.map(TokenSecret::new))
	}

	async fn apply_policy(&self, request: HttpRequest) -> Result<Interception> {
		if !self.config.targets(request.uri()) || self.config.is_exempt(request.method()) {
			return self.pass_through(request).await;
		}

		let Some(secret) = self.credentials.client_secret() else {
			obs::missing_secret(request.uri());

			return self.pass_through(request).await;
		};
		let token = self.current_token().await?;
		let observed = self.refresh_ledger.generation();
		let attempt = authorize(clone_request(&request), token.as_ref())?;
		let response = self.http_client.execute(attempt).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(Interception::new(response, InterceptState::Success, None));
		}

		let outcome = self.refresh_section(&secret, token.as_ref(), observed).await;
		let fresh = match &outcome {
			RefreshOutcome::Refreshed(fresh) | RefreshOutcome::Reused(fresh) => fresh.clone(),
			RefreshOutcome::AuthFailed(_) =>
				return Ok(Interception::new(
					response,
					InterceptState::RefreshFailedClientError,
					Some(outcome),
				)),
			RefreshOutcome::Failed(_) =>
				return Ok(Interception::new(
					response,
					InterceptState::RefreshFailedOther,
					Some(outcome),
				)),
		};
		let retry = authorize(request, Some(&fresh))?;
		let response = self.http_client.execute(retry).await?;

		Ok(Interception::new(response, InterceptState::RefreshedRetry, Some(outcome)))
	}

	async fn pass_through(&self, request: HttpRequest) -> Result<Interception> {
		let response = self.http_client.execute(request).await?;

		Ok(Interception::new(response, InterceptState::PassThrough, None))
	}
}
#[cfg(feature = "reqwest")]
impl Interceptor<ReqwestHttpClient> {
	/// Creates an interceptor backed by a default reqwest client.
	pub fn new(
		config: InterceptorConfig,
		store: Arc<dyn TokenStore>,
		credentials: Arc<dyn CredentialsProvider>,
	) -> Self {
		Self::with_http_client(config, store, credentials, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Interceptor<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			credentials: self.credentials.clone(),
			logout: self.logout.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_ledger: self.refresh_ledger.clone(),
		}
	}
}
impl<C> Debug for Interceptor<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Interceptor")
			.field("config", &self.config)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

/// Sets `Authorization: Bearer <token>` when a token is present.
fn authorize(mut request: HttpRequest, token: Option<&TokenSecret>) -> Result<HttpRequest> {
	if let Some(token) = token {
		let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose()))
			.map_err(ConfigError::from)?;

		value.set_sensitive(true);
		request.headers_mut().insert(AUTHORIZATION, value);
	}

	Ok(request)
}
