//! Catalog search gated by the lookup cache and the per-minute rate gate.
//!
//! Searches are unsigned: the consumer key and secret travel as query parameters, so the
//! request URL must never be logged.

pub mod cache;

pub use cache::*;

// self
use crate::{
	_prelude::*,
	auth::{ConsumerCredentials, ReleaseId},
	error::UpstreamError,
	ext::RateLimitGate,
	flows::Broker,
	http::{HttpMethod, HttpRequest, HttpTransport},
	obs::{self, FlowKind},
	provider::ProviderDescriptor,
};

const SEARCH_ENDPOINT: &str = "search";

/// One catalog listing returned by a search.
///
/// Unknown fields are ignored and missing ones take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogListing {
	/// Release id, usable with the wantlist endpoints.
	pub id: u64,
	/// "Artist - Title" display string.
	pub title: String,
	/// Release country.
	pub country: Option<String>,
	/// Release year as reported by the provider.
	pub year: Option<String>,
	/// Label names.
	pub label: Vec<String>,
	/// Format descriptors (e.g. `Vinyl`, `LP`).
	pub format: Vec<String>,
	/// Site-relative link to the release page.
	pub uri: Option<String>,
	/// Thumbnail image URL.
	pub thumb: Option<String>,
	/// Cover image URL.
	pub cover_image: Option<String>,
}
impl CatalogListing {
	/// Release id in the form the wantlist endpoints expect.
	pub fn release_id(&self) -> ReleaseId {
		ReleaseId::from(self.id)
	}
}

#[derive(Debug, Default, Deserialize)]
struct SearchPage {
	#[serde(default)]
	results: Vec<CatalogListing>,
}

/// Where a [`SearchOutcome`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchSource {
	/// Served from the lookup cache; no request was made.
	Cache,
	/// Fetched from the provider.
	Network,
}

/// Result of [`CatalogClient::search`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
	/// Matching listings; empty when the provider found nothing.
	pub listings: Vec<CatalogListing>,
	/// Cache hit or network fetch.
	pub source: SearchSource,
	/// True when the request was issued after the minute budget was exhausted.
	pub over_budget: bool,
}

/// Search client combining [`LookupCache`] and [`RateLimitGate`].
///
/// The gate is a soft limit: once the budget is spent the request is still sent, and the
/// outcome is flagged so callers can surface the warning.
pub struct CatalogClient<C>
where
	C: ?Sized + HttpTransport,
{
	http_client: Arc<C>,
	descriptor: ProviderDescriptor,
	consumer: ConsumerCredentials,
	cache: Arc<LookupCache>,
	gate: Arc<RateLimitGate>,
}
impl<C> CatalogClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client with a fresh in-memory cache and the default gate.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		consumer: ConsumerCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor,
			consumer,
			cache: Default::default(),
			gate: Default::default(),
		}
	}

	/// Creates a client sharing the broker's transport, descriptor, and consumer credentials.
	pub fn from_broker(broker: &Broker<C>) -> Self {
		Self {
			http_client: broker.http_client.clone(),
			descriptor: broker.descriptor.clone(),
			consumer: broker.consumer.clone(),
			cache: Default::default(),
			gate: Default::default(),
		}
	}

	/// Replaces the lookup cache (e.g. with one opened from disk).
	pub fn with_cache(mut self, cache: Arc<LookupCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Replaces the rate gate.
	pub fn with_gate(mut self, gate: Arc<RateLimitGate>) -> Self {
		self.gate = gate;

		self
	}

	/// Shared lookup cache.
	pub fn cache(&self) -> &Arc<LookupCache> {
		&self.cache
	}

	/// Shared rate gate.
	pub fn gate(&self) -> &Arc<RateLimitGate> {
		&self.gate
	}

	/// Looks up listings for (artist, track).
	pub async fn search(&self, artist: &str, track: &str) -> Result<SearchOutcome> {
		self.search_at(artist, track, OffsetDateTime::now_utc()).await
	}

	/// [`Self::search`] with the rate window evaluated at `now`.
	pub async fn search_at(
		&self,
		artist: &str,
		track: &str,
		now: OffsetDateTime,
	) -> Result<SearchOutcome> {
		if let Some(entry) = self.cache.get(artist, track) {
			return Ok(SearchOutcome {
				listings: entry.results,
				source: SearchSource::Cache,
				over_budget: false,
			});
		}

		let over_budget = !self.gate.try_acquire_at(now);

		if over_budget {
			obs::debug_event(
				FlowKind::CatalogSearch,
				"rate_gate",
				"minute budget exhausted; issuing lookup anyway",
			);
		}

		let listings =
			obs::observe(FlowKind::CatalogSearch, "search", self.fetch(artist, track)).await?;

		if let Err(e) = self.cache.put(artist, track, listings.clone()) {
			obs::warn_event(FlowKind::CatalogSearch, "cache_put", &e.to_string());
		}

		Ok(SearchOutcome { listings, source: SearchSource::Network, over_budget })
	}

	async fn fetch(&self, artist: &str, track: &str) -> Result<Vec<CatalogListing>, UpstreamError> {
		let url = self.search_url(artist, track);
		let request = HttpRequest::new(SEARCH_ENDPOINT, HttpMethod::Get, url)
			.header("User-Agent", self.descriptor.quirks.user_agent.as_str());
		let response = self.http_client.execute(request).await?;

		if response.status == 404 {
			return Ok(Vec::new());
		}

		let page: SearchPage = response.ensure_success(SEARCH_ENDPOINT)?.json(SEARCH_ENDPOINT)?;

		Ok(page.results)
	}

	fn search_url(&self, artist: &str, track: &str) -> Url {
		let mut url = self.descriptor.endpoints.search.clone();

		{
			let mut query = url.query_pairs_mut();

			query.append_pair("q", artist).append_pair("track", track);

			if let Some(format) = &self.descriptor.quirks.search_format {
				query.append_pair("format", format);
			}

			query
				.append_pair("key", &self.consumer.key)
				.append_pair("secret", self.consumer.secret.expose());
		}

		url
	}
}
impl<C> Debug for CatalogClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CatalogClient")
			.field("descriptor", &self.descriptor.id)
			.field("cached", &self.cache.len())
			.field("window", &self.gate.snapshot())
			.finish_non_exhaustive()
	}
}
