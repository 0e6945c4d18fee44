//! Shared helpers for flow implementations (request signing, transport dispatch).

// self
use crate::{
	_prelude::*,
	auth::AccessCredentialPair,
	error::UpstreamError,
	flows::Broker,
	http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport},
	oauth::OAuthParams,
};

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

impl<C> Broker<C>
where
	C: ?Sized + HttpTransport,
{
	/// Starts a protocol parameter set for this broker's consumer key.
	pub(crate) fn oauth_params(&self) -> OAuthParams {
		OAuthParams::new(&self.consumer.key)
	}

	/// Builds a form POST to a token endpoint with the signed parameters in the body.
	pub(crate) fn token_endpoint_request(
		&self,
		endpoint: &'static str,
		url: &Url,
		params: OAuthParams,
		token_secret: Option<&str>,
	) -> Result<HttpRequest> {
		let method = HttpMethod::Post;
		let signed =
			params.sign(method.as_str(), url, self.consumer.secret.expose(), token_secret)?;

		Ok(self.request(endpoint, method, url.clone()).body(FORM_CONTENT_TYPE, signed.form_body()))
	}

	/// Builds a request signed with the access pair, carried in the `Authorization` header.
	pub(crate) fn signed_request(
		&self,
		endpoint: &'static str,
		method: HttpMethod,
		url: &Url,
		pair: &AccessCredentialPair,
	) -> Result<HttpRequest> {
		let signed = self.oauth_params().token(pair.access_token.expose()).sign(
			method.as_str(),
			url,
			self.consumer.secret.expose(),
			Some(pair.access_token_secret.expose()),
		)?;

		Ok(self
			.request(endpoint, method, url.clone())
			.header("Authorization", signed.authorization_header()))
	}

	/// Sends `request` through the configured transport.
	pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, UpstreamError> {
		self.http_client.execute(request).await
	}

	fn request(&self, endpoint: &'static str, method: HttpMethod, url: Url) -> HttpRequest {
		HttpRequest::new(endpoint, method, url)
			.header("User-Agent", self.descriptor.quirks.user_agent.as_str())
	}
}
