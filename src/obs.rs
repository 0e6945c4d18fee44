//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `oauth1_broker.flow` with
//!   the `flow` and `stage` fields, plus warn/debug events for degraded paths.
//! - Enable `metrics` to increment the `oauth1_broker_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! Nothing emitted here ever carries a token, secret, verifier, or signature.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// First handshake leg (request token + authorize URL).
	RequestToken,
	/// Second handshake leg (verifier exchange).
	AccessToken,
	/// Signed call against a user-scoped resource.
	SignedResource,
	/// Wantlist state transitions.
	Wantlist,
	/// Catalog search through the lookup cache.
	CatalogSearch,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::RequestToken => "request_token",
			FlowKind::AccessToken => "access_token",
			FlowKind::SignedResource => "signed_resource",
			FlowKind::Wantlist => "wantlist",
			FlowKind::CatalogSearch => "catalog_search",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records attempt + success/failure around `fut` inside a [`FlowSpan`].
pub(crate) async fn observe<T, E, Fut>(
	kind: FlowKind,
	stage: &'static str,
	fut: Fut,
) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}

	result
}
