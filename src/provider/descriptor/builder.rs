// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// A required endpoint was never set.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A URL could not be parsed or cannot carry path segments.
	#[error("URL `{value}` is invalid.")]
	InvalidUrl {
		/// Offending input.
		value: String,
	},
	/// The client identifier is empty or contains control characters.
	#[error("User-Agent must be a non-empty printable string.")]
	InvalidUserAgent,
	/// Request-token ttl must be positive.
	#[error("Request-token ttl must be positive.")]
	NonPositiveTtl,
	/// Descriptor identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Request-token endpoint.
	pub request_token_endpoint: Option<Url>,
	/// Authorization page.
	pub authorize_endpoint: Option<Url>,
	/// Access-token endpoint.
	pub access_token_endpoint: Option<Url>,
	/// API base for user-scoped resources.
	pub api_base: Option<Url>,
	/// Catalog search endpoint.
	pub search_endpoint: Option<Url>,
	/// Public site base; defaults to the API base.
	pub site_base: Option<Url>,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			request_token_endpoint: None,
			authorize_endpoint: None,
			access_token_endpoint: None,
			api_base: None,
			search_endpoint: None,
			site_base: None,
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token_endpoint = Some(url);

		self
	}

	/// Sets the authorization page.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Sets the access-token endpoint.
	pub fn access_token_endpoint(mut self, url: Url) -> Self {
		self.access_token_endpoint = Some(url);

		self
	}

	/// Sets the API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the catalog search endpoint.
	pub fn search_endpoint(mut self, url: Url) -> Self {
		self.search_endpoint = Some(url);

		self
	}

	/// Sets the public site base.
	pub fn site_base(mut self, url: Url) -> Self {
		self.site_base = Some(url);

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		fn required(
			url: Option<Url>,
			endpoint: &'static str,
		) -> Result<Url, ProviderDescriptorError> {
			url.ok_or(ProviderDescriptorError::MissingEndpoint { endpoint })
		}

		let api_base = required(self.api_base, "api_base")?;
		let endpoints = ProviderEndpoints {
			request_token: required(self.request_token_endpoint, "request_token")?,
			authorize: required(self.authorize_endpoint, "authorize")?,
			access_token: required(self.access_token_endpoint, "access_token")?,
			search: required(self.search_endpoint, "search")?,
			site_base: self.site_base.unwrap_or_else(|| api_base.clone()),
			api_base,
		};
		let descriptor = ProviderDescriptor { id: self.id, endpoints, quirks: self.quirks };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		let endpoints = &self.endpoints;

		validate_endpoint("request_token", &endpoints.request_token)?;
		validate_endpoint("authorize", &endpoints.authorize)?;
		validate_endpoint("access_token", &endpoints.access_token)?;
		validate_endpoint("api_base", &endpoints.api_base)?;
		validate_endpoint("search", &endpoints.search)?;
		validate_endpoint("site_base", &endpoints.site_base)?;

		if endpoints.api_base.cannot_be_a_base() {
			return Err(ProviderDescriptorError::InvalidUrl {
				value: endpoints.api_base.to_string(),
			});
		}

		let agent = &self.quirks.user_agent;

		if agent.trim().is_empty() || agent.chars().any(char::is_control) {
			return Err(ProviderDescriptorError::InvalidUserAgent);
		}
		if !self.quirks.request_token_ttl.is_positive() {
			return Err(ProviderDescriptorError::NonPositiveTtl);
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(url::Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
