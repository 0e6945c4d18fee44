// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Client identifier sent as `User-Agent` on every call (the provider rejects
	/// anonymous agents).
	pub user_agent: String,
	/// Lifetime of a server-held request-token secret.
	pub request_token_ttl: Duration,
	/// `format` filter attached to catalog searches; `None` searches every format.
	pub search_format: Option<String>,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			user_agent: concat!("oauth1-broker/", env!("CARGO_PKG_VERSION")).into(),
			request_token_ttl: Duration::minutes(10),
			search_format: Some("vinyl".into()),
		}
	}
}
