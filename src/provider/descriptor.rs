//! Provider descriptor data structures shared by all flows.
//!
//! Descriptors are plain data (serde-friendly, so deployments can load them from JSON)
//! validated once by [`ProviderDescriptorBuilder::build`].

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Temporary-credential (request token) endpoint.
	pub request_token: Url,
	/// User authorization page the browser is redirected to.
	pub authorize: Url,
	/// Token-credential (access token) endpoint.
	pub access_token: Url,
	/// Base for user-scoped API resources (identity, wantlist).
	pub api_base: Url,
	/// Catalog search endpoint.
	pub search: Url,
	/// Public site base used to turn relative listing URIs into absolute links.
	pub site_base: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Provider-specific quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for the public Discogs API.
	pub fn discogs() -> Result<Self, ProviderDescriptorError> {
		Self::builder(ProviderId::new("discogs")?)
			.request_token_endpoint(parse_url("https://api.discogs.com/oauth/request_token")?)
			.authorize_endpoint(parse_url("https://www.discogs.com/oauth/authorize")?)
			.access_token_endpoint(parse_url("https://api.discogs.com/oauth/access_token")?)
			.api_base(parse_url("https://api.discogs.com")?)
			.search_endpoint(parse_url("https://api.discogs.com/database/search")?)
			.site_base(parse_url("https://www.discogs.com")?)
			.build()
	}

	/// Resolves `segments` under the API base, percent-encoding each segment.
	pub fn api_url<I, S>(&self, segments: I) -> Result<Url, ProviderDescriptorError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut url = self.endpoints.api_base.clone();

		{
			let mut path = url.path_segments_mut().map_err(|_| {
				ProviderDescriptorError::InvalidUrl { value: self.endpoints.api_base.to_string() }
			})?;

			path.pop_if_empty().extend(segments);
		}

		Ok(url)
	}

	/// Turns a listing URI (usually site-relative) into an absolute link.
	pub fn site_url(&self, uri: &str) -> Option<Url> {
		self.endpoints.site_base.join(uri).ok()
	}
}

pub(crate) fn parse_url(value: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(value).map_err(|_| ProviderDescriptorError::InvalidUrl { value: value.into() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn discogs_preset_is_valid() {
		let descriptor = ProviderDescriptor::discogs().expect("Discogs preset should validate.");

		assert_eq!(descriptor.id.as_ref(), "discogs");
		assert_eq!(descriptor.endpoints.authorize.host_str(), Some("www.discogs.com"));
		assert_eq!(descriptor.quirks.search_format.as_deref(), Some("vinyl"));
	}

	#[test]
	fn api_url_encodes_segments() {
		let descriptor = ProviderDescriptor::discogs().expect("Discogs preset should validate.");
		let url = descriptor
			.api_url(["users", "dj shadow", "wants", "123"])
			.expect("API URL should resolve.");

		assert_eq!(url.as_str(), "https://api.discogs.com/users/dj%20shadow/wants/123");
	}

	#[test]
	fn site_url_joins_relative_listing_uri() {
		let descriptor = ProviderDescriptor::discogs().expect("Discogs preset should validate.");

		assert_eq!(
			descriptor.site_url("/release/249504-Rick-Astley").map(String::from).as_deref(),
			Some("https://www.discogs.com/release/249504-Rick-Astley")
		);
	}

	#[test]
	fn descriptor_loads_from_json_with_default_quirks() {
		let payload = serde_json::json!({
			"id": "mock",
			"endpoints": {
				"request_token": "https://mock.test/oauth/request_token",
				"authorize": "https://mock.test/oauth/authorize",
				"access_token": "https://mock.test/oauth/access_token",
				"api_base": "https://mock.test",
				"search": "https://mock.test/database/search",
				"site_base": "https://mock.test"
			}
		});
		let descriptor: ProviderDescriptor =
			serde_json::from_value(payload).expect("Descriptor should deserialize.");

		assert_eq!(descriptor.quirks, ProviderQuirks::default());
	}
}
