//! Three-legged OAuth 1.0a handshake: request token, user authorization, verifier exchange.
//!
//! The request-token secret is written to the broker's [`RequestTokenStore`] between the
//! two legs. When the store is unavailable the handshake still proceeds and the secret is
//! handed back in the [`HandshakeSession`] so the client can present it again through
//! [`Broker::complete_handshake_with_secret`].
//!
//! [`RequestTokenStore`]: crate::store::RequestTokenStore

// self
use crate::{
	_prelude::*,
	auth::{AccessCredentialPair, TokenSecret},
	error::ConfigError,
	flows::Broker,
	http::HttpTransport,
	obs::{self, FlowKind},
	oauth::TokenCredentials,
	store::RequestTokenRecord,
};

const REQUEST_TOKEN_ENDPOINT: &str = "request_token";
const ACCESS_TOKEN_ENDPOINT: &str = "access_token";

/// Result of the first handshake leg.
#[derive(Clone, Debug)]
pub struct HandshakeSession {
	/// Provider page the user must visit (`{authorize}?oauth_token={token}`).
	pub authorize_url: Url,
	/// Provider-issued request token.
	pub request_token: String,
	/// Matching secret, for clients that keep it themselves.
	pub request_token_secret: TokenSecret,
	/// Whether the secret reached the request-token store.
	pub persisted: bool,
}

/// Parameters the provider appends to the callback URL after the user approves access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackParams {
	/// Request token echoed back by the provider.
	pub oauth_token: String,
	/// Verifier proving the user approved the request token.
	pub oauth_verifier: TokenSecret,
}
impl CallbackParams {
	/// Extracts `oauth_token` and `oauth_verifier` from the callback URL's query.
	pub fn from_url(url: &Url) -> Result<Self, ConfigError> {
		let mut token = None;
		let mut verifier = None;

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"oauth_token" => token = Some(value.into_owned()),
				"oauth_verifier" => verifier = Some(value.into_owned()),
				_ => {},
			}
		}

		let oauth_token = token
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::InvalidCallback { parameter: "oauth_token" })?;
		let oauth_verifier = verifier
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::InvalidCallback { parameter: "oauth_verifier" })?;

		Ok(Self { oauth_token, oauth_verifier: TokenSecret::new(oauth_verifier) })
	}
}

impl<C> Broker<C>
where
	C: ?Sized + HttpTransport,
{
	/// Obtains a request token and builds the authorization URL for the user.
	///
	/// Fails only when the provider call fails. A store failure is logged and reported via
	/// [`HandshakeSession::persisted`].
	pub async fn begin_handshake(&self, callback: &Url) -> Result<HandshakeSession> {
		obs::observe(FlowKind::RequestToken, "begin_handshake", async {
			let url = &self.descriptor.endpoints.request_token;
			let request = self.token_endpoint_request(
				REQUEST_TOKEN_ENDPOINT,
				url,
				self.oauth_params().callback(callback),
				None,
			)?;
			let response =
				self.send(request).await?.ensure_success(REQUEST_TOKEN_ENDPOINT)?;
			let TokenCredentials { token, secret } =
				TokenCredentials::parse(REQUEST_TOKEN_ENDPOINT, &response.body)?;
			let mut authorize_url = self.descriptor.endpoints.authorize.clone();

			authorize_url.query_pairs_mut().append_pair("oauth_token", &token);

			let record = RequestTokenRecord::new(token.clone(), secret.clone())
				.with_ttl(self.descriptor.quirks.request_token_ttl);
			let persisted = match self.store.put(record).await {
				Ok(()) => true,
				Err(e) => {
					obs::warn_event(FlowKind::RequestToken, "store_put", &e.to_string());

					false
				},
			};

			Ok(HandshakeSession {
				authorize_url,
				request_token: token,
				request_token_secret: secret,
				persisted,
			})
		})
		.await
	}

	/// Exchanges an authorized request token for an access credential pair, resolving the
	/// secret from the request-token store.
	///
	/// Unknown or expired tokens yield [`Error::ExpiredOrMissingToken`] without contacting
	/// the provider. The stored record is deleted once the exchange succeeds.
	pub async fn complete_handshake(
		&self,
		request_token: &str,
		verifier: &str,
	) -> Result<AccessCredentialPair> {
		let secret = self
			.store
			.get(request_token, OffsetDateTime::now_utc())
			.await?
			.ok_or(Error::ExpiredOrMissingToken)?;

		self.complete_handshake_with_secret(request_token, &secret, verifier).await
	}

	/// Exchanges an authorized request token using a secret presented by the client.
	///
	/// Any stored record for the token is deleted after a successful exchange.
	pub async fn complete_handshake_with_secret(
		&self,
		request_token: &str,
		request_token_secret: &TokenSecret,
		verifier: &str,
	) -> Result<AccessCredentialPair> {
		obs::observe(FlowKind::AccessToken, "complete_handshake", async {
			let url = &self.descriptor.endpoints.access_token;
			let request = self.token_endpoint_request(
				ACCESS_TOKEN_ENDPOINT,
				url,
				self.oauth_params().token(request_token).verifier(verifier),
				Some(request_token_secret.expose()),
			)?;
			let response = self.send(request).await?.ensure_success(ACCESS_TOKEN_ENDPOINT)?;
			let TokenCredentials { token, secret } =
				TokenCredentials::parse(ACCESS_TOKEN_ENDPOINT, &response.body)?;

			if let Err(e) = self.store.delete(request_token).await {
				obs::warn_event(FlowKind::AccessToken, "store_delete", &e.to_string());
			}

			Ok(AccessCredentialPair::new(token, secret.expose()))
		})
		.await
	}

	/// [`Self::complete_handshake`] driven by the parsed provider redirect.
	pub async fn complete_callback(&self, params: &CallbackParams) -> Result<AccessCredentialPair> {
		self.complete_handshake(&params.oauth_token, params.oauth_verifier.expose()).await
	}
}
