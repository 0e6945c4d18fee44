//! Signed calls against user-scoped resources (identity, wantlist).

// self
use crate::{
	_prelude::*,
	auth::{AccessCredentialPair, ReleaseId, Username},
	flows::{Broker, common::JSON_CONTENT_TYPE},
	http::{HttpMethod, HttpResponse, HttpTransport},
	obs::{self, FlowKind},
};

const RESOURCE_ENDPOINT: &str = "resource";
const IDENTITY_ENDPOINT: &str = "identity";
const WANTLIST_ENDPOINT: &str = "wantlist";

/// Account behind an access credential pair, as reported by the identity endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Numeric account id.
	pub id: u64,
	/// Account name used in user-scoped resource paths.
	pub username: String,
	/// API URL of the account resource.
	#[serde(default)]
	pub resource_url: Option<String>,
	/// Name of the application the pair was issued to.
	#[serde(default)]
	pub consumer_name: Option<String>,
}

impl<C> Broker<C>
where
	C: ?Sized + HttpTransport,
{
	/// Issues one signed request and returns the provider response verbatim.
	///
	/// Query parameters of `url` take part in the signature. `body`, when present, is sent as
	/// JSON. Non-2xx statuses are not errors here; the caller interprets them. The request is
	/// never retried.
	pub async fn call(
		&self,
		method: HttpMethod,
		url: &Url,
		pair: &AccessCredentialPair,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		obs::observe(FlowKind::SignedResource, "call", async {
			self.call_endpoint(RESOURCE_ENDPOINT, method, url, pair, body).await
		})
		.await
	}

	/// Fetches the account behind `pair`.
	pub async fn identity(&self, pair: &AccessCredentialPair) -> Result<Identity> {
		obs::observe(FlowKind::SignedResource, "identity", async {
			let url = self.descriptor.api_url(["oauth", "identity"])?;
			let response = self
				.call_endpoint(IDENTITY_ENDPOINT, HttpMethod::Get, &url, pair, None)
				.await?
				.ensure_success(IDENTITY_ENDPOINT)?;

			Ok(response.json(IDENTITY_ENDPOINT)?)
		})
		.await
	}

	/// Returns `pair` with its username filled in, calling the identity endpoint only when
	/// the username is not known yet.
	pub async fn resolve_username(
		&self,
		pair: AccessCredentialPair,
	) -> Result<AccessCredentialPair> {
		if pair.username.is_some() {
			return Ok(pair);
		}

		let identity = self.identity(&pair).await?;

		Ok(pair.with_username(Username::new(&identity.username)?))
	}

	/// Probes the identity endpoint: `Ok(false)` when the provider answers 401, `Ok(true)` on
	/// success, and an error for every other failure.
	pub async fn verify_credentials(&self, pair: &AccessCredentialPair) -> Result<bool> {
		match self.identity(pair).await {
			Ok(_) => Ok(true),
			Err(Error::Upstream(e)) if e.status() == Some(401) => Ok(false),
			Err(e) => Err(e),
		}
	}

	/// `{api}/users/{username}/wants/{release}`.
	pub fn wantlist_url(&self, username: &Username, release: &ReleaseId) -> Result<Url> {
		Ok(self.descriptor.api_url(["users", username.as_ref(), "wants", release.as_ref()])?)
	}

	/// Reports whether `release` is on the user's wantlist (200 present, 404 absent).
	///
	/// The wantlist helpers need `pair.username`; run [`Self::resolve_username`] once first or
	/// they fail with [`Error::UnresolvedUsername`] without contacting the provider.
	pub async fn wantlist_contains(
		&self,
		pair: &AccessCredentialPair,
		release: &ReleaseId,
	) -> Result<bool> {
		let response = self.wantlist_call(HttpMethod::Get, pair, release).await?;

		match response.status {
			200 => Ok(true),
			404 => Ok(false),
			_ => Err(response.into_status_error(WANTLIST_ENDPOINT).into()),
		}
	}

	/// Adds `release` to the user's wantlist (201 or 204).
	pub async fn wantlist_add(
		&self,
		pair: &AccessCredentialPair,
		release: &ReleaseId,
	) -> Result<()> {
		let response = self.wantlist_call(HttpMethod::Put, pair, release).await?;

		expect_status(response, &[201, 204])
	}

	/// Removes `release` from the user's wantlist. A 404 counts as already removed.
	pub async fn wantlist_remove(
		&self,
		pair: &AccessCredentialPair,
		release: &ReleaseId,
	) -> Result<()> {
		let response = self.wantlist_call(HttpMethod::Delete, pair, release).await?;

		expect_status(response, &[204, 404])
	}

	async fn wantlist_call(
		&self,
		method: HttpMethod,
		pair: &AccessCredentialPair,
		release: &ReleaseId,
	) -> Result<HttpResponse> {
		let username = pair.username.as_ref().ok_or(Error::UnresolvedUsername)?;
		let url = self.wantlist_url(username, release)?;

		self.call_endpoint(WANTLIST_ENDPOINT, method, &url, pair, None).await
	}

	async fn call_endpoint(
		&self,
		endpoint: &'static str,
		method: HttpMethod,
		url: &Url,
		pair: &AccessCredentialPair,
		body: Option<Vec<u8>>,
	) -> Result<HttpResponse> {
		if !pair.is_complete() {
			return Err(Error::NotAuthenticated);
		}

		let mut request = self.signed_request(endpoint, method, url, pair)?;

		if let Some(body) = body {
			request = request.body(JSON_CONTENT_TYPE, body);
		}

		Ok(self.send(request).await?)
	}
}

fn expect_status(response: HttpResponse, accepted: &[u16]) -> Result<()> {
	if accepted.contains(&response.status) {
		Ok(())
	} else {
		Err(response.into_status_error(WANTLIST_ENDPOINT).into())
	}
}
