//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use oauth1_broker::{
	auth::{AccessCredentialPair, ConsumerCredentials, ProviderId, Username},
	flows::Broker,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	store::{MemoryStore, RequestTokenStore},
	url::Url,
};

pub const CONSUMER_KEY: &str = "mock-consumer-key";
pub const CONSUMER_SECRET: &str = "mock-consumer-secret";
pub const USERNAME: &str = "crate-digger";

pub type TestBroker = Broker<ReqwestHttpClient>;

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Mock provider URL should parse.")
}

pub fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let id = ProviderId::new("mock-catalog").expect("Mock provider identifier should be valid.");

	ProviderDescriptor::builder(id)
		.request_token_endpoint(url(&server.url("/oauth/request_token")))
		.authorize_endpoint(url(&server.url("/oauth/authorize")))
		.access_token_endpoint(url(&server.url("/oauth/access_token")))
		.api_base(url(&server.url("/")))
		.search_endpoint(url(&server.url("/database/search")))
		.build()
		.expect("Mock provider descriptor should build.")
}

pub fn consumer() -> ConsumerCredentials {
	ConsumerCredentials::new(CONSUMER_KEY, CONSUMER_SECRET)
}

pub fn build_broker_with_store(
	server: &MockServer,
	store: Arc<dyn RequestTokenStore>,
) -> TestBroker {
	Broker::with_http_client(store, build_descriptor(server), consumer(), http_client())
}

/// Reqwest transport that trusts the self-signed certificate served by `httpmock`.
pub fn http_client() -> ReqwestHttpClient {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure reqwest client for tests should build.");

	ReqwestHttpClient::with_client(client)
}

pub fn build_broker(server: &MockServer) -> (TestBroker, Arc<MemoryStore>) {
	let store = Arc::new(MemoryStore::default());
	let broker = build_broker_with_store(server, store.clone());

	(broker, store)
}

pub fn signed_in_pair() -> AccessCredentialPair {
	AccessCredentialPair::new("access-token", "access-secret")
		.with_username(Username::new(USERNAME).expect("Fixture username should be valid."))
}
