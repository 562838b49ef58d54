//! Counters for token lifecycle decisions.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token lifecycle decisions.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	cache_hits: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_rejections: AtomicU64,
	reissues: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns how often a cached credential was reused without network traffic.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh-token exchanges attempted.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges rejected by the auth server.
	pub fn refresh_rejections(&self) -> u64 {
		self.refresh_rejections.load(Ordering::Relaxed)
	}

	/// Returns the number of full reissues attempted.
	pub fn reissues(&self) -> u64 {
		self.reissues.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_rejection(&self) {
		self.refresh_rejections.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reissue(&self) {
		self.reissues.fetch_add(1, Ordering::Relaxed);
	}
}
