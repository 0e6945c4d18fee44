//! OAuth 1.0a broker for catalog services: HMAC-SHA1 request signing, three-legged handshakes
//! backed by expiring request-token stores, signed wantlist calls, and a rate-gated lookup
//! cache for catalog searches.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod catalog;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::ConsumerCredentials,
		flows::Broker,
		http::ReqwestHttpClient,
		provider::ProviderDescriptor,
		store::{MemoryStore, RequestTokenStore},
	};

	/// Broker type alias used by reqwest-backed tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Broker`] backed by an in-memory request-token store and the reqwest
	/// transport used across tests.
	pub fn build_reqwest_test_broker(
		descriptor: ProviderDescriptor,
		consumer_key: &str,
		consumer_secret: &str,
	) -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn RequestTokenStore> = store_backend.clone();
		let consumer = ConsumerCredentials::new(consumer_key, consumer_secret);
		let broker =
			Broker::with_http_client(store, descriptor, consumer, test_reqwest_http_client());

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
