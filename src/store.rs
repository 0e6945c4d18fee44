//! Storage contracts and built-in stores for in-flight request-token secrets.
//!
//! A record only lives between `begin_handshake` and `complete_handshake`: it is written
//! once, read once, deleted on exchange, and treated as absent after its ttl elapses.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`RequestTokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for request-token records.
///
/// Every operation replaces or removes a whole record keyed by the provider-issued token,
/// so concurrent handshakes never observe each other's partial writes.
pub trait RequestTokenStore
where
	Self: Send + Sync,
{
	/// Persists (or replaces) the record keyed by its request token.
	fn put(&self, record: RequestTokenRecord) -> StoreFuture<'_, ()>;

	/// Returns the secret for `token` unless it is unknown or expired at `now`.
	///
	/// Expired records are evicted as a side effect.
	fn get<'a>(&'a self, token: &'a str, now: OffsetDateTime)
	-> StoreFuture<'a, Option<TokenSecret>>;

	/// Removes the record for `token`, returning whether one existed.
	fn delete<'a>(&'a self, token: &'a str) -> StoreFuture<'a, bool>;

	/// Drops every record expired at `now`, returning how many were removed.
	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize>;
}

/// Error type produced by [`RequestTokenStore`] implementations.
///
/// Messages describe the failing operation and path only; record contents never appear.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// A record could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Request-token secret held server-side between the two handshake legs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokenRecord {
	/// Provider-issued request token (store key).
	pub token: String,
	/// Matching token secret.
	pub token_secret: TokenSecret,
	/// Instant the record was issued.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Lifetime after which the record is treated as absent.
	pub ttl: Duration,
}
impl RequestTokenRecord {
	/// Default record lifetime (ten minutes).
	pub const DEFAULT_TTL: Duration = Duration::minutes(10);

	/// Creates a record issued now with [`Self::DEFAULT_TTL`].
	pub fn new(token: impl Into<String>, token_secret: TokenSecret) -> Self {
		Self {
			token: token.into(),
			token_secret,
			issued_at: OffsetDateTime::now_utc(),
			ttl: Self::DEFAULT_TTL,
		}
	}

	/// Overrides the issue instant.
	pub fn with_issued_at(mut self, issued_at: OffsetDateTime) -> Self {
		self.issued_at = issued_at;

		self
	}

	/// Overrides the ttl.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Instant after which the record no longer resolves.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + self.ttl
	}

	/// Returns true once `issued_at + ttl < now`; the boundary instant itself is still
	/// valid.
	pub fn is_expired(&self, now: OffsetDateTime) -> bool {
		self.expires_at() < now
	}
}
