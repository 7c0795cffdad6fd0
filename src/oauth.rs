//! Client-credentials exchange against the token endpoint.
//!
//! [`client_credentials_request`] builds the `grant_type=client_credentials` call authenticated
//! with HTTP Basic over the base64-encoded client secret, and [`classify_token_response`] maps
//! the endpoint's answer into the crate's error taxonomy:
//!
//! - 2xx with an `access_token` string → [`TokenSecret`];
//! - 4xx → [`Error::InvalidClient`], which the interceptor escalates as a logout;
//! - everything else (5xx, malformed JSON) → [`TransientError`].

// crates.io
use ::http::{
	HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{ClientSecret, TokenSecret},
	error::{ConfigError, TransientError},
	http::{HttpRequest, HttpResponse, HttpTransport, parse_retry_after},
};

/// Form body sent to the token endpoint.
pub const CLIENT_CREDENTIALS_BODY: &str = "grant_type=client_credentials";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
const BODY_PREVIEW_LIMIT: usize = 256;

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
}

#[derive(Default, Deserialize)]
struct TokenErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
}

/// Builds the `client_credentials` token request for `endpoint`.
pub fn client_credentials_request(endpoint: &Url, secret: &ClientSecret) -> Result<HttpRequest> {
	let basic = HeaderValue::try_from(format!("Basic {}", STANDARD.encode(secret.expose())))
		.map_err(ConfigError::from)?;
	let request = ::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(AUTHORIZATION, basic)
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(CLIENT_CREDENTIALS_BODY.as_bytes().to_vec())
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Maps a token endpoint response into a bearer token or a classified error.
pub fn classify_token_response(response: &HttpResponse) -> Result<TokenSecret> {
	let status = response.status();

	if status.is_success() {
		return parse_access_token(response.body(), status.as_u16());
	}
	if status.is_client_error() {
		return Err(Error::InvalidClient {
			status: status.as_u16(),
			reason: client_error_reason(response.body()),
		});
	}

	Err(TransientError::TokenEndpoint {
		message: format!("HTTP {status} from the token endpoint"),
		status: Some(status.as_u16()),
		retry_after: parse_retry_after(response.headers()),
	}
	.into())
}

/// Performs the client-credentials exchange through `transport`.
pub async fn exchange_client_credentials<C>(
	transport: &C,
	endpoint: &Url,
	secret: &ClientSecret,
) -> Result<TokenSecret>
where
	C: ?Sized + HttpTransport,
{
	let request = client_credentials_request(endpoint, secret)?;
	let response = transport.execute(request).await?;

	classify_token_response(&response)
}

fn parse_access_token(body: &[u8], status: u16) -> Result<TokenSecret> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::TokenResponseParse { source, status: Some(status) })?;

	let unusable = if parsed.access_token.is_empty() {
		Some("access_token is empty")
	} else if HeaderValue::try_from(format!("Bearer {}", parsed.access_token)).is_err() {
		Some("access_token cannot be sent in an Authorization header")
	} else {
		None
	};

	if let Some(message) = unusable {
		return Err(TransientError::TokenEndpoint {
			message: message.into(),
			status: Some(status),
			retry_after: None,
		}
		.into());
	}

	Ok(TokenSecret::new(parsed.access_token))
}

fn client_error_reason(body: &[u8]) -> String {
	let parsed: TokenErrorResponse = serde_json::from_slice(body).unwrap_or_default();

	match (parsed.error, parsed.error_description) {
		(Some(error), Some(description)) => format!("{error}: {description}"),
		(Some(error), None) => error,
		(None, Some(description)) => description,
		(None, None) => {
			let preview = String::from_utf8_lossy(body);
			let preview = preview.trim();

			if preview.is_empty() {
				"no error details".into()
			} else {
				preview.chars().take(BODY_PREVIEW_LIMIT).collect()
			}
		},
	}
}
