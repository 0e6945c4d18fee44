//! Consumer (application) credentials and per-user access credential pairs.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, Username},
	error::ConfigError,
};

/// Application identity registered with the provider.
///
/// Loaded once at startup and shared by every flow. Never serialized.
#[derive(Clone, Debug)]
pub struct ConsumerCredentials {
	/// Consumer key sent as `oauth_consumer_key`.
	pub key: String,
	/// Consumer secret; only ever used to derive signing keys.
	pub secret: TokenSecret,
}
impl ConsumerCredentials {
	/// Environment variable holding the consumer key.
	pub const KEY_VAR: &'static str = "DISCOGS_CONSUMER_KEY";
	/// Environment variable holding the consumer secret.
	pub const SECRET_VAR: &'static str = "DISCOGS_CONSUMER_SECRET";

	/// Creates credentials from explicit values.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: TokenSecret::new(secret) }
	}

	/// Reads [`Self::KEY_VAR`] and [`Self::SECRET_VAR`] from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Resolves both values through `lookup`, rejecting missing or blank entries.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &'static str| {
			lookup(name)
				.map(|value| value.trim().to_owned())
				.filter(|value| !value.is_empty())
				.ok_or(ConfigError::MissingEnv { name })
		};
		let key = read(Self::KEY_VAR)?;
		let secret = read(Self::SECRET_VAR)?;

		Ok(Self::new(key, secret))
	}
}

/// Access token pair produced by a completed handshake.
///
/// Both halves are always used together. The pair is owned by the calling client context,
/// which may persist it (it is serde-serializable); the broker never stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredentialPair {
	/// `oauth_token` returned by the access-token endpoint.
	pub access_token: TokenSecret,
	/// `oauth_token_secret` returned by the access-token endpoint.
	pub access_token_secret: TokenSecret,
	/// Account name required by user-scoped resource URLs, once resolved.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<Username>,
}
impl AccessCredentialPair {
	/// Creates a pair without a resolved username.
	pub fn new(access_token: impl Into<String>, access_token_secret: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			access_token_secret: TokenSecret::new(access_token_secret),
			username: None,
		}
	}

	/// Attaches the resolved username.
	pub fn with_username(mut self, username: Username) -> Self {
		self.username = Some(username);

		self
	}

	/// Returns true when neither half is empty.
	pub fn is_complete(&self) -> bool {
		!self.access_token.is_empty() && !self.access_token_secret.is_empty()
	}
}
