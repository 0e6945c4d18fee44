//! Per-release wantlist state machine driven by signed resource calls.
//!
//! Each release moves through [`WantlistStatus`]. A call that finds its release in an
//! in-flight state (`Checking`, `Adding`, `Removing`) returns the current status without
//! touching the network, so repeated clicks collapse into one provider request. Releases
//! are independent of each other.

// self
use crate::{
	_prelude::*,
	auth::{AccessCredentialPair, ReleaseId},
	flows::Broker,
	http::HttpTransport,
	obs::{self, FlowKind},
};

/// Wantlist membership of one release as seen by this session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WantlistStatus {
	/// Never checked in this session.
	#[default]
	Unchecked,
	/// Membership check in flight.
	Checking,
	/// Not on the wantlist.
	Absent,
	/// Already on the wantlist when checked.
	Present,
	/// Add request in flight.
	Adding,
	/// Added during this session.
	Added,
	/// Remove request in flight.
	Removing,
	/// Last operation failed.
	Error {
		/// Human-readable failure description (never contains credentials).
		reason: String,
	},
}
impl WantlistStatus {
	/// Returns true while a provider request for the release is outstanding.
	pub fn is_in_flight(&self) -> bool {
		matches!(self, Self::Checking | Self::Adding | Self::Removing)
	}

	/// Returns true when the release is known to be on the wantlist.
	pub fn is_wanted(&self) -> bool {
		matches!(self, Self::Present | Self::Added)
	}

	fn failed(error: Error) -> Self {
		Self::Error { reason: error.to_string() }
	}
}

#[derive(Debug, Default)]
struct StatusBook {
	// Bumped on sign-in/sign-out so late completions from an older session are dropped.
	epoch: u64,
	session: Option<AccessCredentialPair>,
	entries: HashMap<ReleaseId, WantlistStatus>,
}

/// A release moved into a new state by the session identified by `epoch`.
struct Claim {
	epoch: u64,
	next: WantlistStatus,
	pair: AccessCredentialPair,
}

enum Claimed {
	Started(Claim),
	Unchanged(WantlistStatus),
}

/// Drives check/add/remove for one signed-in user.
///
/// The access pair is held in memory only; the username is resolved once through the
/// identity endpoint and reused for every later call. Each operation is bound to the
/// session that started it: after a sign-in or sign-out it never writes with the new
/// session's credentials and never updates the new session's statuses.
pub struct WantlistCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	broker: Arc<Broker<C>>,
	resolve_guard: AsyncMutex<()>,
	book: Mutex<StatusBook>,
}
impl<C> WantlistCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a signed-out coordinator.
	pub fn new(broker: Arc<Broker<C>>) -> Self {
		Self {
			broker,
			resolve_guard: AsyncMutex::new(()),
			book: Mutex::new(StatusBook::default()),
		}
	}

	/// Installs the access pair for a user, discarding every known status.
	pub fn sign_in(&self, pair: AccessCredentialPair) {
		self.reset(Some(pair));
	}

	/// Drops the access pair and every known status.
	pub fn sign_out(&self) {
		self.reset(None);
	}

	/// Returns true while an access pair is installed.
	pub fn is_signed_in(&self) -> bool {
		self.book.lock().session.is_some()
	}

	/// Current access pair, including the username once it has been resolved.
	pub fn credentials(&self) -> Option<AccessCredentialPair> {
		self.book.lock().session.clone()
	}

	/// Last known status for `release`.
	pub fn status(&self, release: &ReleaseId) -> WantlistStatus {
		self.book.lock().entries.get(release).cloned().unwrap_or_default()
	}

	/// Checks whether `release` is on the wantlist.
	///
	/// Returns [`Error::NotAuthenticated`] without any network call when signed out. Every
	/// other failure is reported as [`WantlistStatus::Error`].
	pub async fn check(&self, release: &ReleaseId) -> Result<WantlistStatus> {
		let claim = match self.claim(release, |current| {
			(!current.is_in_flight()).then_some(WantlistStatus::Checking)
		})? {
			Claimed::Started(claim) => claim,
			Claimed::Unchanged(current) => return Ok(current),
		};
		let status = self.probe(release, &claim).await;

		Ok(self.settle(release, &claim, status))
	}

	/// Adds `release` to the wantlist.
	///
	/// From `Unchecked` or `Error` a membership check runs first, so an existing entry ends
	/// as `Present` without a write. `Present`, `Added`, and in-flight states are no-ops.
	/// When the session changes before the write is sent, nothing is written and the
	/// release's status in the new session is returned.
	pub async fn add(&self, release: &ReleaseId) -> Result<WantlistStatus> {
		let claim = match self.claim(release, |current| match current {
			WantlistStatus::Unchecked | WantlistStatus::Error { .. } =>
				Some(WantlistStatus::Checking),
			WantlistStatus::Absent => Some(WantlistStatus::Adding),
			_ => None,
		})? {
			Claimed::Started(claim) => claim,
			Claimed::Unchanged(current) => return Ok(current),
		};

		if claim.next == WantlistStatus::Checking {
			match self.probe(release, &claim).await {
				WantlistStatus::Absent => {},
				other => return Ok(self.settle(release, &claim, other)),
			}
		}

		let pair = match self.write_pair(release, &claim, WantlistStatus::Adding).await {
			Ok(Some(pair)) => pair,
			Ok(None) => return Ok(self.status(release)),
			Err(e) => return Ok(self.settle(release, &claim, WantlistStatus::failed(e))),
		};
		let outcome =
			obs::observe(FlowKind::Wantlist, "add", self.broker.wantlist_add(&pair, release)).await;
		let status = match outcome {
			Ok(()) => WantlistStatus::Added,
			Err(e) => WantlistStatus::failed(e),
		};

		Ok(self.settle(release, &claim, status))
	}

	/// Removes `release` from the wantlist.
	///
	/// From `Unchecked` or `Error` a membership check runs first. `Absent` and in-flight
	/// states are no-ops. A provider 404 on delete counts as already removed. Like
	/// [`Self::add`], a session change before the delete is sent cancels it.
	pub async fn remove(&self, release: &ReleaseId) -> Result<WantlistStatus> {
		let claim = match self.claim(release, |current| match current {
			WantlistStatus::Unchecked | WantlistStatus::Error { .. } =>
				Some(WantlistStatus::Checking),
			WantlistStatus::Present | WantlistStatus::Added => Some(WantlistStatus::Removing),
			_ => None,
		})? {
			Claimed::Started(claim) => claim,
			Claimed::Unchanged(current) => return Ok(current),
		};

		if claim.next == WantlistStatus::Checking {
			match self.probe(release, &claim).await {
				WantlistStatus::Present => {},
				other => return Ok(self.settle(release, &claim, other)),
			}
		}

		let pair = match self.write_pair(release, &claim, WantlistStatus::Removing).await {
			Ok(Some(pair)) => pair,
			Ok(None) => return Ok(self.status(release)),
			Err(e) => return Ok(self.settle(release, &claim, WantlistStatus::failed(e))),
		};
		let outcome = obs::observe(
			FlowKind::Wantlist,
			"remove",
			self.broker.wantlist_remove(&pair, release),
		)
		.await;
		let status = match outcome {
			Ok(()) => WantlistStatus::Absent,
			Err(e) => WantlistStatus::failed(e),
		};

		Ok(self.settle(release, &claim, status))
	}

	fn reset(&self, session: Option<AccessCredentialPair>) {
		let mut book = self.book.lock();

		book.epoch += 1;
		book.session = session;
		book.entries.clear();
	}

	/// Atomically reads the current status and, when `decide` yields a next state, stores it
	/// and binds the claim to the current session.
	fn claim<F>(&self, release: &ReleaseId, decide: F) -> Result<Claimed>
	where
		F: FnOnce(&WantlistStatus) -> Option<WantlistStatus>,
	{
		let mut book = self.book.lock();
		let Some(pair) = book.session.clone() else {
			return Err(Error::NotAuthenticated);
		};
		let current = book.entries.get(release).cloned().unwrap_or_default();
		let Some(next) = decide(&current) else {
			return Ok(Claimed::Unchanged(current));
		};

		book.entries.insert(release.clone(), next.clone());

		Ok(Claimed::Started(Claim { epoch: book.epoch, next, pair }))
	}

	/// Moves the release to `next` only while the claiming session is still current.
	fn advance(&self, release: &ReleaseId, claim: &Claim, next: WantlistStatus) -> bool {
		let mut book = self.book.lock();

		if book.epoch != claim.epoch {
			return false;
		}

		book.entries.insert(release.clone(), next);

		true
	}

	fn settle(&self, release: &ReleaseId, claim: &Claim, status: WantlistStatus) -> WantlistStatus {
		let mut book = self.book.lock();

		if book.epoch == claim.epoch {
			book.entries.insert(release.clone(), status.clone());
		}

		status
	}

	/// Resolves the claim's pair and enters the write state; `None` once the session changed.
	async fn write_pair(
		&self,
		release: &ReleaseId,
		claim: &Claim,
		next: WantlistStatus,
	) -> Result<Option<AccessCredentialPair>> {
		let pair = self.resolved_pair(claim).await?;

		Ok(self.advance(release, claim, next).then_some(pair))
	}

	async fn probe(&self, release: &ReleaseId, claim: &Claim) -> WantlistStatus {
		let outcome = obs::observe(FlowKind::Wantlist, "check", async {
			let pair = self.resolved_pair(claim).await?;

			self.broker.wantlist_contains(&pair, release).await
		})
		.await;

		match outcome {
			Ok(true) => WantlistStatus::Present,
			Ok(false) => WantlistStatus::Absent,
			Err(e) => WantlistStatus::failed(e),
		}
	}

	/// The claim's pair with its username, resolved at most once per session.
	async fn resolved_pair(&self, claim: &Claim) -> Result<AccessCredentialPair> {
		if claim.pair.username.is_some() {
			return Ok(claim.pair.clone());
		}

		let _guard = self.resolve_guard.lock().await;

		if let Some(pair) = self.session_if_current(claim).filter(|p| p.username.is_some()) {
			return Ok(pair);
		}

		let resolved = self.broker.resolve_username(claim.pair.clone()).await?;
		let mut book = self.book.lock();

		if book.epoch == claim.epoch {
			book.session = Some(resolved.clone());
		}

		Ok(resolved)
	}

	fn session_if_current(&self, claim: &Claim) -> Option<AccessCredentialPair> {
		let book = self.book.lock();

		if book.epoch == claim.epoch { book.session.clone() } else { None }
	}
}
impl<C> Debug for WantlistCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let book = self.book.lock();

		f.debug_struct("WantlistCoordinator")
			.field("signed_in", &book.session.is_some())
			.field("epoch", &book.epoch)
			.field("tracked", &book.entries.len())
			.finish_non_exhaustive()
	}
}
