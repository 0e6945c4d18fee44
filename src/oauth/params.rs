//! Protocol parameter sets (`oauth_*`) with a fresh nonce/timestamp per request.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	oauth::signature::{self, SIGNATURE_METHOD, SignatureError, SignatureInput, percent_encode},
};

const NONCE_LEN: usize = 32;

/// Value sent as `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";

/// Unsigned protocol parameters for a single request.
///
/// A value is consumed by [`OAuthParams::sign`], so one nonce/timestamp pair can never be
/// attached to two requests.
pub struct OAuthParams {
	pairs: Vec<(String, String)>,
}
impl OAuthParams {
	/// Starts a parameter set with a fresh nonce and the current Unix timestamp.
	pub fn new(consumer_key: &str) -> Self {
		Self::with_nonce_and_timestamp(
			consumer_key,
			generate_nonce(),
			OffsetDateTime::now_utc().unix_timestamp(),
		)
	}

	/// Starts a parameter set with caller-chosen nonce/timestamp (tests, replays of
	/// recorded fixtures).
	pub fn with_nonce_and_timestamp(
		consumer_key: &str,
		nonce: impl Into<String>,
		timestamp: i64,
	) -> Self {
		let pairs = vec![
			("oauth_consumer_key".into(), consumer_key.to_owned()),
			("oauth_nonce".into(), nonce.into()),
			("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
			("oauth_timestamp".into(), timestamp.to_string()),
			("oauth_version".into(), OAUTH_VERSION.into()),
		];

		Self { pairs }
	}

	/// Adds `oauth_callback`.
	pub fn callback(self, callback: &Url) -> Self {
		self.with("oauth_callback", callback.as_str())
	}

	/// Adds `oauth_token` (request token during exchange, access token afterwards).
	pub fn token(self, token: &str) -> Self {
		self.with("oauth_token", token)
	}

	/// Adds `oauth_verifier`.
	pub fn verifier(self, verifier: &str) -> Self {
		self.with("oauth_verifier", verifier)
	}

	/// Returns the nonce attached to this parameter set.
	pub fn nonce(&self) -> &str {
		lookup(&self.pairs, "oauth_nonce").unwrap_or_default()
	}

	/// Signs the parameters for `method` + `url` and appends `oauth_signature`.
	pub fn sign(
		self,
		method: &str,
		url: &Url,
		consumer_secret: &str,
		token_secret: Option<&str>,
	) -> Result<SignedParams, SignatureError> {
		let OAuthParams { mut pairs } = self;
		let signature = signature::sign(&SignatureInput {
			method,
			url,
			params: &pairs,
			consumer_secret,
			token_secret,
		})?;

		pairs.push(("oauth_signature".into(), signature));

		Ok(SignedParams { pairs })
	}

	fn with(mut self, key: &str, value: &str) -> Self {
		self.pairs.push((key.to_owned(), value.to_owned()));

		self
	}
}
impl Debug for OAuthParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthParams").field("keys", &keys(&self.pairs)).finish()
	}
}

/// Protocol parameters including `oauth_signature`, ready to be serialized.
pub struct SignedParams {
	pairs: Vec<(String, String)>,
}
impl SignedParams {
	/// Returns the computed signature.
	pub fn signature(&self) -> &str {
		self.get("oauth_signature").unwrap_or_default()
	}

	/// Looks up a parameter by name.
	pub fn get(&self, key: &str) -> Option<&str> {
		lookup(&self.pairs, key)
	}

	/// Renders `OAuth k="v", ...` with each key and value percent-encoded.
	pub fn authorization_header(&self) -> String {
		let mut header = String::from("OAuth ");

		for (idx, (key, value)) in self.pairs.iter().enumerate() {
			if idx > 0 {
				header.push_str(", ");
			}

			header.push_str(&percent_encode(key));
			header.push_str("=\"");
			header.push_str(&percent_encode(value));
			header.push('"');
		}

		header
	}

	/// Renders the parameters as an `application/x-www-form-urlencoded` body.
	pub fn form_body(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.pairs).finish()
	}
}
impl Debug for SignedParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedParams").field("keys", &keys(&self.pairs)).finish()
	}
}

/// Generates a 32-character alphanumeric nonce from the thread-local CSPRNG.
pub fn generate_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
	pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn keys(pairs: &[(String, String)]) -> Vec<&str> {
	pairs.iter().map(|(k, _)| k.as_str()).collect()
}
