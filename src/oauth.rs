//! OAuth 1.0a protocol primitives: signing, protocol parameters, and token responses.

pub mod params;
pub mod signature;

pub use params::*;
pub use signature::*;

// self
use crate::{auth::TokenSecret, error::UpstreamError};

/// Token/secret pair parsed from a request-token or access-token response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenCredentials {
	/// `oauth_token` value.
	pub token: String,
	/// `oauth_token_secret` value.
	pub secret: TokenSecret,
}
impl TokenCredentials {
	/// Parses an `application/x-www-form-urlencoded` token response.
	///
	/// Both fields must be present and non-empty; anything else is reported as a malformed
	/// response for `endpoint` without echoing the body.
	pub fn parse(endpoint: &'static str, body: &[u8]) -> Result<Self, UpstreamError> {
		let mut token = None;
		let mut secret = None;

		for (key, value) in url::form_urlencoded::parse(body) {
			match key.as_ref() {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_token_secret" => secret = Some(value.into_owned()),
				_ => {},
			}
		}

		let missing = |field: &str| UpstreamError::MalformedResponse {
			endpoint,
			message: format!("response is missing `{field}`"),
		};
		let token =
			token.filter(|value| !value.is_empty()).ok_or_else(|| missing("oauth_token"))?;
		let secret = secret
			.filter(|value| !value.is_empty())
			.ok_or_else(|| missing("oauth_token_secret"))?;

		Ok(Self { token, secret: TokenSecret::new(secret) })
	}
}
