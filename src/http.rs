//! Transport primitives shared by intercepted requests and token exchanges.
//!
//! The module exposes [`HttpTransport`], the interceptor's only dependency on an HTTP stack,
//! together with the [`HttpRequest`]/[`HttpResponse`] aliases over the `http` crate types.
//! Bodies are fully buffered so a request can be rebuilt with [`clone_request`] for the single
//! retry that follows a successful refresh.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Outgoing request with a buffered body.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Downstream response with a buffered body.
pub type HttpResponse = ::http::Response<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients able to execute a buffered request.
///
/// The interceptor uses the same transport for the downstream call, the token refresh, and the
/// retry. Implementations must be `Send + Sync + 'static` so one transport can be shared by
/// clones of the interceptor across tasks. Status codes are never turned into errors; only
/// failures that prevent a response from being read are reported as [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and buffers the response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Rebuilds `request` (method, URI, version, headers, body) so it can be sent again.
///
/// Request extensions are not carried over.
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut cloned = HttpRequest::new(request.body().clone());

	*cloned.method_mut() = request.method().clone();
	*cloned.uri_mut() = request.uri().clone();
	*cloned.version_mut() = request.version();
	*cloned.headers_mut() = request.headers().clone();

	cloned
}

/// Parses a `Retry-After` header expressed in seconds or as an RFC 2822 date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirect, timeout, and proxy policy come from the wrapped client; build it with
/// [`ReqwestClient::builder`] and pass it to [`ReqwestHttpClient::with_client`] to tune them.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(execute_reqwest(self.0.clone(), request))
	}
}

#[cfg(feature = "reqwest")]
async fn execute_reqwest(
	client: ReqwestClient,
	request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
	let request = reqwest::Request::try_from(request)?;
	let response = client.execute(request).await?;
	let status = response.status();
	let version = response.version();
	let headers = response.headers().to_owned();
	let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

	*response_new.status_mut() = status;
	*response_new.version_mut() = version;
	*response_new.headers_mut() = headers;

	Ok(response_new)
}
