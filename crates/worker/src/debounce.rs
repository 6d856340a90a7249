//! Per-key debouncing with latest-wins coalescing.
//!
//! Each key owns at most one pending slot. Submitting to a key that already
//! has a pending slot replaces its value and restarts the quiet window, so a
//! burst of requests collapses into a single handler call carrying the most
//! recent value. Once a window elapses the slot is vacated before the handler
//! runs; a submit arriving while that call is in flight opens a fresh slot.
//! Calls for one key may therefore overlap when the handler outlasts the
//! window. The handler sees increasing tickets and decides which results to
//! keep.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::task::AbortHandle;

use crate::{GenerationClock, LifetimeToken, TaskClass};

/// Receives the surviving value of a debounced burst.
#[async_trait]
pub trait DebounceHandler<K, T>: Send + Sync + 'static {
	/// Runs once the quiet window for `key` has elapsed.
	///
	/// `ticket` is unique and increases with every submit, across all keys.
	async fn fire(&self, key: K, value: T, ticket: u64);
}

/// Outcome of [`KeyedDebouncer::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// No request was pending for the key; a new window started.
	Scheduled,
	/// A pending request was replaced and its window restarted.
	Coalesced,
	/// The debouncer is closed; the value was dropped.
	Closed,
}

struct Slot<T> {
	ticket: u64,
	value: T,
	timer: AbortHandle,
}

struct Inner<K, T, H> {
	window: Duration,
	handler: H,
	slots: Mutex<FxHashMap<K, Slot<T>>>,
	tickets: GenerationClock,
	lifetime: LifetimeToken,
}

/// Debounce table keyed by `K`.
///
/// Timers run on the worker runtime (see [`crate::spawn`]). Dropping the
/// debouncer closes it.
pub struct KeyedDebouncer<K, T, H> {
	inner: Arc<Inner<K, T, H>>,
}

impl<K, T, H> KeyedDebouncer<K, T, H>
where
	K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
	T: Send + 'static,
	H: DebounceHandler<K, T>,
{
	pub fn new(window: Duration, handler: H) -> Self {
		Self::with_lifetime(window, handler, LifetimeToken::new())
	}

	/// Creates a debouncer whose timers stop when `lifetime` is cancelled.
	pub fn with_lifetime(window: Duration, handler: H, lifetime: LifetimeToken) -> Self {
		Self {
			inner: Arc::new(Inner {
				window,
				handler,
				slots: Mutex::new(FxHashMap::default()),
				tickets: GenerationClock::new(),
				lifetime,
			}),
		}
	}

	pub fn window(&self) -> Duration {
		self.inner.window
	}

	pub fn handler(&self) -> &H {
		&self.inner.handler
	}

	/// Records `value` as the latest request for `key` and (re)starts its window.
	pub fn submit(&self, key: K, value: T) -> SubmitOutcome {
		if self.inner.lifetime.is_cancelled() {
			tracing::trace!(?key, "worker.debounce.submit.closed");
			return SubmitOutcome::Closed;
		}

		let ticket = self.inner.tickets.next();
		let mut slots = self.inner.slots.lock();
		let timer = crate::spawn(TaskClass::Debounce, run_timer(Arc::clone(&self.inner), key.clone(), ticket)).abort_handle();
		let previous = slots.insert(key.clone(), Slot { ticket, value, timer });
		drop(slots);

		match previous {
			Some(previous) => {
				previous.timer.abort();
				tracing::trace!(?key, ticket, replaced = previous.ticket, "worker.debounce.coalesced");
				SubmitOutcome::Coalesced
			}
			None => {
				tracing::trace!(?key, ticket, "worker.debounce.scheduled");
				SubmitOutcome::Scheduled
			}
		}
	}

	/// Number of keys with a request still waiting out its window.
	pub fn pending_len(&self) -> usize {
		self.inner.slots.lock().len()
	}

	/// Returns true if `key` has a request waiting out its window.
	pub fn is_pending(&self, key: &K) -> bool {
		self.inner.slots.lock().contains_key(key)
	}

	/// Cancels every pending window and rejects further submits.
	///
	/// Handler calls already in flight run to completion.
	pub fn close(&self) {
		self.inner.lifetime.cancel();
		let drained: Vec<_> = self.inner.slots.lock().drain().collect();
		for (_, slot) in &drained {
			slot.timer.abort();
		}
		if !drained.is_empty() {
			tracing::debug!(dropped = drained.len(), "worker.debounce.closed");
		}
	}

	pub fn is_closed(&self) -> bool {
		self.inner.lifetime.is_cancelled()
	}
}

impl<K, T, H> Drop for KeyedDebouncer<K, T, H> {
	fn drop(&mut self) {
		self.inner.lifetime.cancel();
		for (_, slot) in self.inner.slots.lock().drain() {
			slot.timer.abort();
		}
	}
}

async fn run_timer<K, T, H>(inner: Arc<Inner<K, T, H>>, key: K, ticket: u64)
where
	K: Eq + Hash + std::fmt::Debug,
	H: DebounceHandler<K, T>,
{
	tokio::select! {
		_ = inner.lifetime.cancelled() => return,
		_ = tokio::time::sleep(inner.window) => {}
	}

	// Aborts only land at await points, so a timer that already woke can race
	// a newer submit for the lock. The ticket decides who owns the slot.
	let value = {
		let mut slots = inner.slots.lock();
		if slots.get(&key).is_some_and(|slot| slot.ticket == ticket) {
			slots.remove(&key).map(|slot| slot.value)
		} else {
			None
		}
	};
	let Some(value) = value else {
		tracing::trace!(?key, ticket, "worker.debounce.superseded");
		return;
	};

	tracing::trace!(?key, ticket, "worker.debounce.fire");
	inner.handler.fire(key, value, ticket).await;
}
