//! HMAC-SHA1 signature engine (RFC 5849 §3.4).
//!
//! Everything here is pure: no clocks, no randomness, no I/O. Callers supply the
//! nonce/timestamp through the parameter list so identical inputs always yield identical
//! signatures.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::_prelude::*;

type HmacSha1 = Hmac<Sha1>;

/// Value sent as `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Errors raised for malformed signature input.
///
/// Messages never include secrets or parameter values.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignatureError {
	/// The HTTP method was empty.
	#[error("HTTP method must not be empty.")]
	EmptyMethod,
	/// The HTTP method contained characters outside ASCII letters.
	#[error("HTTP method contains unsupported characters.")]
	InvalidMethod,
	/// The URL is not an absolute http(s) URL with a host.
	#[error("Signature base URL must be an absolute http(s) URL with a host.")]
	UnsupportedUrl,
	/// The HMAC key could not be initialized.
	#[error("HMAC signing key was rejected.")]
	InvalidKey,
}

/// Everything the engine needs to sign one request.
///
/// Query parameters on `url` are folded into the parameter set; the base URL used in the
/// signature base string never carries a query or fragment.
#[derive(Clone, Copy)]
pub struct SignatureInput<'a> {
	/// HTTP method (case-insensitive).
	pub method: &'a str,
	/// Target URL, possibly with a query string.
	pub url: &'a Url,
	/// Protocol and request parameters (`oauth_*` fields, form fields), unencoded.
	pub params: &'a [(String, String)],
	/// Consumer secret.
	pub consumer_secret: &'a str,
	/// Token secret; `None` while requesting a request token.
	pub token_secret: Option<&'a str>,
}
impl Debug for SignatureInput<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignatureInput")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("params", &self.params.len())
			.finish_non_exhaustive()
	}
}

/// Percent-encodes `value` with the OAuth 1.0a rules (RFC 3986 unreserved set kept as-is,
/// every other byte as uppercase `%XX`).
pub fn percent_encode(value: &str) -> String {
	let mut out = String::with_capacity(value.len());

	for byte in value.bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' =>
				out.push(char::from(byte)),
			_ => {
				const HEX: &[u8; 16] = b"0123456789ABCDEF";

				out.push('%');
				out.push(char::from(HEX[usize::from(byte >> 4)]));
				out.push(char::from(HEX[usize::from(byte & 0x0F)]));
			},
		}
	}

	out
}

/// Builds the normalized parameter string: encoded pairs sorted by key, then by value.
pub fn normalized_parameters(url: &Url, params: &[(String, String)]) -> String {
	let mut encoded = url
		.query_pairs()
		.map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
		.chain(params.iter().map(|(key, value)| (percent_encode(key), percent_encode(value))))
		.collect::<Vec<_>>();

	encoded.sort();

	let mut buf = String::new();

	for (idx, (key, value)) in encoded.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.push_str(key);
		buf.push('=');
		buf.push_str(value);
	}

	buf
}

/// Returns the signature base string `METHOD&enc(base_url)&enc(params)`.
pub fn base_string(input: &SignatureInput) -> Result<String, SignatureError> {
	let method = normalize_method(input.method)?;
	let base_url = base_url(input.url)?;
	let params = normalized_parameters(input.url, input.params);

	Ok(format!("{method}&{}&{}", percent_encode(&base_url), percent_encode(&params)))
}

/// Computes the base64-encoded HMAC-SHA1 signature for `input`.
pub fn sign(input: &SignatureInput) -> Result<String, SignatureError> {
	let base = base_string(input)?;
	let key = format!(
		"{}&{}",
		percent_encode(input.consumer_secret),
		percent_encode(input.token_secret.unwrap_or_default())
	);
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;

	mac.update(base.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn normalize_method(method: &str) -> Result<String, SignatureError> {
	if method.is_empty() {
		return Err(SignatureError::EmptyMethod);
	}
	if !method.bytes().all(|b| b.is_ascii_alphabetic()) {
		return Err(SignatureError::InvalidMethod);
	}

	Ok(method.to_ascii_uppercase())
}

fn base_url(url: &Url) -> Result<String, SignatureError> {
	if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
		return Err(SignatureError::UnsupportedUrl);
	}

	let mut base = url.clone();

	base.set_query(None);
	base.set_fragment(None);

	Ok(base.into())
}
