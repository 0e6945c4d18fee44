//! High-level flow orchestrators powered by the broker facade.

pub mod common;
pub mod handshake;
pub mod resource;
pub mod wantlist;

pub use handshake::*;
pub use resource::*;
pub use wantlist::*;

// self
use crate::{
	_prelude::*,
	auth::ConsumerCredentials,
	http::HttpTransport,
	provider::ProviderDescriptor,
	store::RequestTokenStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport.
pub type ReqwestBroker = Broker<ReqwestHttpClient>;

/// Coordinates OAuth 1.0a flows against a single provider descriptor.
///
/// The broker owns the HTTP transport, the request-token store, the provider descriptor,
/// and the consumer credentials so handshake and resource helpers only deal with
/// protocol logic. Access credential pairs are never stored here; callers pass them into
/// every signed call.
pub struct Broker<C>
where
	C: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Store holding request-token secrets between the two handshake legs.
	pub store: Arc<dyn RequestTokenStore>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Application credentials used to sign every request.
	pub consumer: ConsumerCredentials,
}
impl<C> Broker<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn RequestTokenStore>,
		descriptor: ProviderDescriptor,
		consumer: ConsumerCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), store, descriptor, consumer }
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient> {
	/// Creates a broker with its own reqwest transport using
	/// [`ReqwestHttpClient::DEFAULT_TIMEOUT`].
	pub fn new(
		store: Arc<dyn RequestTokenStore>,
		descriptor: ProviderDescriptor,
		consumer: ConsumerCredentials,
	) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(ReqwestHttpClient::DEFAULT_TIMEOUT)?;

		Ok(Self::with_http_client(store, descriptor, consumer, http_client))
	}
}
impl<C> Clone for Broker<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			consumer: self.consumer.clone(),
		}
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor.id)
			.field("consumer_key", &self.consumer.key)
			.finish_non_exhaustive()
	}
}
