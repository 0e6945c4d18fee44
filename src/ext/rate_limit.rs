//! Fixed-window request budget shared by every catalog lookup in a session.
//!
//! The window is the Unix minute (`floor(unix_seconds / 60)`), not the wall-clock minute
//! of the hour, so two windows an hour apart never alias.

// self
use crate::_prelude::*;

const WINDOW_SECS: i64 = 60;

/// Counter for the current one-minute window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateWindow {
	/// `floor(unix_seconds / 60)` of the window.
	pub minute_bucket: i64,
	/// Requests admitted in that window.
	pub count: u32,
}
impl RateWindow {
	/// Returns the bucket containing `now`.
	pub fn bucket_of(now: OffsetDateTime) -> i64 {
		now.unix_timestamp().div_euclid(WINDOW_SECS)
	}

	/// Instant at which the window after this one opens.
	pub fn next_window_at(&self) -> OffsetDateTime {
		OffsetDateTime::UNIX_EPOCH + Duration::seconds((self.minute_bucket + 1) * WINDOW_SECS)
	}
}

/// Result of [`RateLimitGate::evaluate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request fits in the current window.
	Allow,
	/// The window is exhausted. The lookup may still be issued; the provider may reject it.
	OverBudget(RetryDirective),
}
impl RateLimitDecision {
	/// Returns true for [`RateLimitDecision::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}
}

/// Advises callers when the budget refills.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Start of the next window.
	pub earliest_retry_at: OffsetDateTime,
	/// Time left until that instant.
	pub recommended_backoff: Duration,
}

/// Soft per-minute gate with an atomic check-and-increment.
#[derive(Debug)]
pub struct RateLimitGate {
	quota: u32,
	window: Mutex<RateWindow>,
}
impl RateLimitGate {
	/// Default number of lookups per minute.
	pub const DEFAULT_QUOTA: u32 = 60;

	/// Creates a gate admitting `quota` requests per minute.
	pub fn with_quota(quota: u32) -> Self {
		Self { quota, window: Mutex::new(RateWindow::default()) }
	}

	/// Configured per-minute quota.
	pub fn quota(&self) -> u32 {
		self.quota
	}

	/// [`Self::try_acquire_at`] using the current clock.
	pub fn try_acquire(&self) -> bool {
		self.try_acquire_at(OffsetDateTime::now_utc())
	}

	/// Counts one request against the window containing `now`.
	///
	/// Returns `true` while the window is under quota. Once exhausted, further calls in the
	/// same window return `false` and leave the count unchanged.
	pub fn try_acquire_at(&self, now: OffsetDateTime) -> bool {
		let bucket = RateWindow::bucket_of(now);
		let mut window = self.window.lock();

		if window.minute_bucket != bucket {
			*window = RateWindow { minute_bucket: bucket, count: 0 };
		}
		if window.count < self.quota {
			window.count += 1;

			true
		} else {
			false
		}
	}

	/// Reports whether a request at `now` would be admitted without consuming budget.
	pub fn evaluate(&self, now: OffsetDateTime) -> RateLimitDecision {
		let bucket = RateWindow::bucket_of(now);
		let window = *self.window.lock();

		if window.minute_bucket != bucket || window.count < self.quota {
			return RateLimitDecision::Allow;
		}

		let earliest_retry_at = window.next_window_at();

		RateLimitDecision::OverBudget(RetryDirective {
			earliest_retry_at,
			recommended_backoff: earliest_retry_at - now,
		})
	}

	/// Copy of the current window.
	pub fn snapshot(&self) -> RateWindow {
		*self.window.lock()
	}
}
impl Default for RateLimitGate {
	fn default() -> Self {
		Self::with_quota(Self::DEFAULT_QUOTA)
	}
}
