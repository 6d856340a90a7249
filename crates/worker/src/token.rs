use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic ticket clock.
///
/// Tickets start at 1 and are unique per clock, so a larger ticket always
/// belongs to a later request.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next ticket.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Cancellation scope tied to the lifetime of a component.
///
/// Background tasks hold a clone and bail out once the owner is disposed.
#[derive(Debug, Clone, Default)]
pub struct LifetimeToken {
	cancel: CancellationToken,
}

impl LifetimeToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true once the owning component has been disposed.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Ends the lifetime. Idempotent.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Resolves when the lifetime ends.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}
