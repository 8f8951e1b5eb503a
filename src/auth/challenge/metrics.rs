// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for authorization challenge handling.
#[derive(Debug, Default)]
pub struct ChallengeMetrics {
	challenges: AtomicU64,
	retries: AtomicU64,
	forced_refreshes: AtomicU64,
	give_ups: AtomicU64,
	sign_outs: AtomicU64,
}
impl ChallengeMetrics {
	/// Returns the number of challenge responses handled.
	pub fn challenges(&self) -> u64 {
		self.challenges.load(Ordering::Relaxed)
	}

	/// Returns the number of requests handed back for resubmission.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of forced refreshes requested from the provider.
	pub fn forced_refreshes(&self) -> u64 {
		self.forced_refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of challenges declared terminal.
	pub fn give_ups(&self) -> u64 {
		self.give_ups.load(Ordering::Relaxed)
	}

	/// Returns the number of sign-outs triggered by terminal authenticated challenges.
	pub fn sign_outs(&self) -> u64 {
		self.sign_outs.load(Ordering::Relaxed)
	}

	pub(crate) fn record_challenge(&self) {
		self.challenges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced_refresh(&self) {
		self.forced_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_give_up(&self) {
		self.give_ups.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_sign_out(&self) {
		self.sign_outs.fetch_add(1, Ordering::Relaxed);
	}
}
