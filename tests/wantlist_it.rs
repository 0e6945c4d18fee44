mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use oauth1_broker::{
	auth::{AccessCredentialPair, ReleaseId, Username},
	error::Error,
	flows::{WantlistCoordinator, WantlistStatus},
	http::ReqwestHttpClient,
};

const RELEASE: &str = "249504";
const WANT_PATH: &str = "/users/crate-digger/wants/249504";

fn release() -> ReleaseId {
	ReleaseId::new(RELEASE).expect("Fixture release id should be valid.")
}

fn coordinator(server: &MockServer) -> WantlistCoordinator<ReqwestHttpClient> {
	let (broker, _store) = build_broker(server);

	WantlistCoordinator::new(Arc::new(broker))
}

fn signed_in(server: &MockServer) -> WantlistCoordinator<ReqwestHttpClient> {
	let coordinator = coordinator(server);

	coordinator.sign_in(signed_in_pair());

	coordinator
}

#[tokio::test]
async fn signed_out_operations_never_touch_the_network() {
	let server = MockServer::start_async().await;
	let coordinator = coordinator(&server);
	let mock = server
		.mock_async(|when, then| {
			when.path(WANT_PATH);
			then.status(200);
		})
		.await;

	for result in [
		coordinator.check(&release()).await,
		coordinator.add(&release()).await,
		coordinator.remove(&release()).await,
	] {
		assert!(matches!(result, Err(Error::NotAuthenticated)));
	}

	assert_eq!(coordinator.status(&release()), WantlistStatus::Unchecked);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn check_reports_presence() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH).header_exists("authorization");
			then.status(200).body(r#"{"id":249504,"rating":0}"#);
		})
		.await;
	let status = coordinator.check(&release()).await.expect("Check should run when signed in.");

	mock.assert_async().await;

	assert_eq!(status, WantlistStatus::Present);
	assert!(coordinator.status(&release()).is_wanted());
}

#[tokio::test]
async fn add_from_unchecked_probes_then_writes_once() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(404).body(r#"{"message":"Release not in wantlist."}"#);
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(201).body(r#"{"id":249504}"#);
		})
		.await;
	let status = coordinator.add(&release()).await.expect("Add should run when signed in.");

	assert_eq!(status, WantlistStatus::Added);

	let again = coordinator.add(&release()).await.expect("Repeated add should be a no-op.");

	assert_eq!(again, WantlistStatus::Added);

	probe.assert_calls_async(1).await;
	put.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_adds_collapse_into_one_write() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(404);
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(201);
		})
		.await;
	let release = release();
	let (first, second) = tokio::join!(coordinator.add(&release), coordinator.add(&release));
	let first = first.expect("First add should succeed.");
	let second = second.expect("Second add should succeed.");

	assert_eq!(first, WantlistStatus::Added);
	assert!(second.is_in_flight(), "Second click should observe the in-flight state.");
	assert_eq!(coordinator.status(&release), WantlistStatus::Added);

	probe.assert_calls_async(1).await;
	put.assert_calls_async(1).await;
}

#[tokio::test]
async fn add_skips_write_when_already_present() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(200);
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(201);
		})
		.await;
	let status = coordinator.add(&release()).await.expect("Add should run when signed in.");

	assert_eq!(status, WantlistStatus::Present);

	probe.assert_calls_async(1).await;
	put.assert_calls_async(0).await;
}

#[tokio::test]
async fn remove_treats_not_found_as_absent() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(200);
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(WANT_PATH);
			then.status(404);
		})
		.await;

	assert_eq!(
		coordinator.check(&release()).await.expect("Check should succeed."),
		WantlistStatus::Present
	);
	assert_eq!(
		coordinator.remove(&release()).await.expect("Remove should succeed."),
		WantlistStatus::Absent
	);
	assert_eq!(
		coordinator.remove(&release()).await.expect("Second remove is a no-op."),
		WantlistStatus::Absent
	);

	probe.assert_calls_async(1).await;
	delete.assert_calls_async(1).await;
}

#[tokio::test]
async fn remove_after_add_deletes_entry() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(404);
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(204);
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(WANT_PATH);
			then.status(204);
		})
		.await;

	coordinator.add(&release()).await.expect("Add should succeed.");

	let status = coordinator.remove(&release()).await.expect("Remove should succeed.");

	assert_eq!(status, WantlistStatus::Absent);

	probe.assert_calls_async(1).await;
	put.assert_calls_async(1).await;
	delete.assert_calls_async(1).await;
}

#[tokio::test]
async fn provider_failures_become_error_state() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(500).body("upstream exploded");
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(201);
		})
		.await;
	let status = coordinator.add(&release()).await.expect("Failures are reported as status.");

	match &status {
		WantlistStatus::Error { reason } => {
			assert!(reason.contains("500"));
			assert!(!reason.contains("access-secret"));
		},
		other => panic!("Unexpected status: {other:?}"),
	}

	assert_eq!(coordinator.status(&release()), status);

	let retried = coordinator.check(&release()).await.expect("Error state can be retried.");

	assert!(matches!(retried, WantlistStatus::Error { .. }));

	probe.assert_calls_async(2).await;
	put.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_write_becomes_error_state() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let _probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(404);
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(401)
				.body(r#"{"message":"You must authenticate to access this resource."}"#);
		})
		.await;
	let status = coordinator.add(&release()).await.expect("Failures are reported as status.");

	assert!(matches!(status, WantlistStatus::Error { .. }));
	assert!(!coordinator.status(&release()).is_wanted());

	put.assert_calls_async(1).await;
}

#[tokio::test]
async fn username_is_resolved_once_per_session() {
	let server = MockServer::start_async().await;
	let coordinator = coordinator(&server);
	let identity = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/identity");
			then.status(200).body(r#"{"id":7,"username":"crate-digger"}"#);
		})
		.await;
	let first = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/crate-digger/wants/1");
			then.status(200);
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/crate-digger/wants/2");
			then.status(404);
		})
		.await;

	coordinator.sign_in(AccessCredentialPair::new("access-token", "access-secret"));

	let one = ReleaseId::new("1").expect("Release id should be valid.");
	let two = ReleaseId::new("2").expect("Release id should be valid.");
	let (a, b) = tokio::join!(coordinator.check(&one), coordinator.check(&two));

	assert_eq!(a.expect("First check should succeed."), WantlistStatus::Present);
	assert_eq!(b.expect("Second check should succeed."), WantlistStatus::Absent);
	assert_eq!(
		coordinator.credentials().and_then(|pair| pair.username).as_deref(),
		Some(USERNAME)
	);

	identity.assert_calls_async(1).await;
	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;
}

#[tokio::test]
async fn sign_out_forgets_statuses() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let _probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(200);
		})
		.await;

	coordinator.check(&release()).await.expect("Check should succeed.");

	assert_eq!(coordinator.status(&release()), WantlistStatus::Present);

	coordinator.sign_out();

	assert!(!coordinator.is_signed_in());
	assert_eq!(coordinator.status(&release()), WantlistStatus::Unchecked);
	assert!(matches!(coordinator.check(&release()).await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn session_change_during_check_cancels_the_write() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let release = release();
	let probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(404).delay(Duration::from_millis(300));
		})
		.await;
	let first_user_put = server
		.mock_async(|when, then| {
			when.method(PUT).path(WANT_PATH);
			then.status(201);
		})
		.await;
	let second_user_put = server
		.mock_async(|when, then| {
			when.method(PUT).path("/users/someone-else/wants/249504");
			then.status(201);
		})
		.await;
	let (outcome, ()) = tokio::join!(coordinator.add(&release), async {
		tokio::time::sleep(Duration::from_millis(100)).await;

		coordinator.sign_in(
			AccessCredentialPair::new("other-token", "other-secret")
				.with_username(Username::new("someone-else").expect("Username should be valid.")),
		);
	});

	assert_eq!(outcome.expect("Add should report a status."), WantlistStatus::Unchecked);
	assert_eq!(coordinator.status(&release), WantlistStatus::Unchecked);

	probe.assert_calls_async(1).await;
	first_user_put.assert_calls_async(0).await;
	second_user_put.assert_calls_async(0).await;
}

#[tokio::test]
async fn session_change_during_remove_check_cancels_the_delete() {
	let server = MockServer::start_async().await;
	let coordinator = signed_in(&server);
	let release = release();
	let _probe = server
		.mock_async(|when, then| {
			when.method(GET).path(WANT_PATH);
			then.status(200).delay(Duration::from_millis(300));
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(WANT_PATH);
			then.status(204);
		})
		.await;
	let (outcome, ()) = tokio::join!(coordinator.remove(&release), async {
		tokio::time::sleep(Duration::from_millis(100)).await;

		coordinator.sign_out();
	});

	assert_eq!(outcome.expect("Remove should report a status."), WantlistStatus::Unchecked);
	assert!(!coordinator.is_signed_in());

	delete.assert_calls_async(0).await;
}
