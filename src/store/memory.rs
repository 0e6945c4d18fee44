//! Thread-safe in-memory [`RequestTokenStore`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{RequestTokenRecord, RequestTokenStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, RequestTokenRecord>>>;

/// Keeps request-token records in-process; cloning shares the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of records currently held, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no records are held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: &StoreMap, token: &str, now: OffsetDateTime) -> Option<TokenSecret> {
		{
			let guard = map.read();
			let record = guard.get(token)?;

			if !record.is_expired(now) {
				return Some(record.token_secret.clone());
			}
		}

		let mut guard = map.write();

		// Re-check under the write lock; a concurrent put may have replaced the record.
		if guard.get(token).is_some_and(|record| record.is_expired(now)) {
			guard.remove(token);
		}

		None
	}

	fn purge_now(map: &StoreMap, now: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, record| !record.is_expired(now));

		before - guard.len()
	}
}
impl RequestTokenStore for MemoryStore {
	fn put(&self, record: RequestTokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(record.token.clone(), record);

			Ok(())
		})
	}

	fn get<'a>(
		&'a self,
		token: &'a str,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, token, now)) })
	}

	fn delete<'a>(&'a self, token: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.0.write().remove(token).is_some()) })
	}

	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		Box::pin(async move { Ok(Self::purge_now(&self.0, now)) })
	}
}
