mod common;

// std
use std::{env, fs, process, sync::Arc};
// crates.io
use httpmock::prelude::*;
use time::OffsetDateTime;
// self
use common::*;
use oauth1_broker::{
	catalog::{CatalogClient, LookupCache, SearchSource},
	error::Error,
	ext::RateLimitGate,
	http::ReqwestHttpClient,
};

const SEARCH_BODY: &str = r#"{
	"pagination": { "page": 1, "pages": 1, "per_page": 50, "items": 1 },
	"results": [
		{
			"id": 8735,
			"title": "Daft Punk - Homework",
			"country": "France",
			"year": "1997",
			"label": ["Virgin", "Soma Quality Recordings"],
			"format": ["Vinyl", "LP", "Album"],
			"uri": "/Daft-Punk-Homework/release/8735",
			"thumb": "https://img.example.com/thumb.jpg",
			"cover_image": "https://img.example.com/cover.jpg",
			"community": { "want": 100, "have": 200 }
		}
	]
}"#;

fn catalog(server: &MockServer) -> CatalogClient<ReqwestHttpClient> {
	let (broker, _store) = build_broker(server);

	CatalogClient::from_broker(&broker)
}

#[tokio::test]
async fn search_hits_cache_regardless_of_case() {
	let server = MockServer::start_async().await;
	let catalog = catalog(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/database/search")
				.query_param("q", "Daft Punk")
				.query_param("track", "Around the World")
				.query_param("format", "vinyl")
				.query_param("key", CONSUMER_KEY)
				.query_param("secret", CONSUMER_SECRET);
			then.status(200).header("content-type", "application/json").body(SEARCH_BODY);
		})
		.await;
	let first = catalog.search("Daft Punk", "Around the World").await.expect("Search should work.");

	assert_eq!(first.source, SearchSource::Network);
	assert!(!first.over_budget);
	assert_eq!(first.listings.len(), 1);
	assert_eq!(first.listings[0].release_id().as_ref(), "8735");
	assert_eq!(first.listings[0].year.as_deref(), Some("1997"));

	let second = catalog.search("DAFT PUNK", "around the world").await.expect("Cache should hit.");

	assert_eq!(second.source, SearchSource::Cache);
	assert_eq!(second.listings, first.listings);
	assert_eq!(catalog.gate().snapshot().count, 1, "Cache hits must not spend budget.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn not_found_is_cached_as_empty() {
	let server = MockServer::start_async().await;
	let catalog = catalog(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/database/search");
			then.status(404).body(r#"{"message":"The requested resource was not found."}"#);
		})
		.await;
	let first = catalog.search("Nobody", "Nothing").await.expect("404 should be an empty result.");

	assert!(first.listings.is_empty());
	assert_eq!(first.source, SearchSource::Network);

	let second = catalog.search("nobody", "nothing").await.expect("Cache should hit.");

	assert!(second.listings.is_empty());
	assert_eq!(second.source, SearchSource::Cache);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn exhausted_budget_still_issues_lookup() {
	let server = MockServer::start_async().await;
	let catalog = catalog(&server).with_gate(Arc::new(RateLimitGate::with_quota(1)));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/database/search");
			then.status(200).body(r#"{"results":[]}"#);
		})
		.await;
	let now = OffsetDateTime::now_utc();
	let first = catalog.search_at("Artist A", "Track A", now).await.expect("Search should work.");
	let second = catalog.search_at("Artist B", "Track B", now).await.expect("Search should work.");

	assert!(!first.over_budget);
	assert!(second.over_budget);
	assert_eq!(second.source, SearchSource::Network);

	mock.assert_calls_async(2).await;

	let next_minute = now + time::Duration::minutes(1);
	let third =
		catalog.search_at("Artist C", "Track C", next_minute).await.expect("Search should work.");

	assert!(!third.over_budget, "A new minute window restores the budget.");
}

#[tokio::test]
async fn server_errors_are_not_cached() {
	let server = MockServer::start_async().await;
	let catalog = catalog(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/database/search");
			then.status(500).body("internal error");
		})
		.await;
	let err = catalog.search("Artist", "Track").await.expect_err("A 500 should fail the lookup.");

	assert!(matches!(&err, Error::Upstream(inner) if inner.status() == Some(500)));
	assert!(!err.to_string().contains(CONSUMER_SECRET));
	assert!(catalog.cache().is_empty());

	catalog.search("Artist", "Track").await.expect_err("Failures are retried, not cached.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn persisted_cache_serves_later_clients() {
	let server = MockServer::start_async().await;
	let path = env::temp_dir().join(format!(
		"oauth1_broker_catalog_it_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos()
	));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/database/search");
			then.status(200).body(SEARCH_BODY);
		})
		.await;
	let cache = Arc::new(LookupCache::open(&path).expect("Cache snapshot should open."));

	catalog(&server)
		.with_cache(cache)
		.search("Daft Punk", "Revolution 909")
		.await
		.expect("Search should work.");

	let reopened = Arc::new(LookupCache::open(&path).expect("Cache snapshot should reopen."));
	let outcome = catalog(&server)
		.with_cache(reopened)
		.search("daft punk", "revolution 909")
		.await
		.expect("Reopened cache should hit.");

	assert_eq!(outcome.source, SearchSource::Cache);
	assert_eq!(outcome.listings[0].title, "Daft Punk - Homework");

	mock.assert_calls_async(1).await;

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary cache snapshot {}: {e}", path.display())
	});
}
