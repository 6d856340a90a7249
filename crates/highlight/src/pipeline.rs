//! Request pipeline: per-line debounce in front of the classification provider.
//!
//! Every highlight request is keyed by line number. Bursts for one line
//! collapse to the most recent request once the debounce window passes with
//! no further request; different lines proceed independently. Provider
//! failures and panics abandon the request without retry, and results
//! overtaken by a newer dispatch for the same line are dropped before
//! reaching the owner.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tint_worker::{DebounceHandler, KeyedDebouncer, LifetimeToken, SubmitOutcome, TaskClass};

use crate::classify::{ClassificationProvider, sections_for_line};
use crate::dispatch::{Completion, OwnerSender};
use crate::group::GroupCoordinator;
use crate::line::SharedLine;
use crate::snapshot::LineSnapshot;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// One queued highlight request.
pub(crate) struct LineRequest<S> {
	snapshot: LineSnapshot,
	line: SharedLine,
	document: S,
}

/// Dispatch bookkeeping for one line. Dropped once nothing is in flight.
struct LineDispatch {
	latest: u64,
	in_flight: usize,
}

struct ClassifyHandler<S> {
	provider: Arc<dyn ClassificationProvider<S>>,
	coordinator: Arc<GroupCoordinator>,
	owner: OwnerSender,
	dispatches: Mutex<FxHashMap<usize, LineDispatch>>,
	lifetime: LifetimeToken,
}

impl<S> ClassifyHandler<S> {
	fn dispatched(&self, line_number: usize, ticket: u64) {
		let mut dispatches = self.dispatches.lock();
		let entry = dispatches.entry(line_number).or_insert(LineDispatch {
			latest: ticket,
			in_flight: 0,
		});
		entry.latest = ticket;
		entry.in_flight += 1;
	}

	/// Records that `ticket` returned. True if no later dispatch for the line exists.
	fn returned(&self, line_number: usize, ticket: u64) -> bool {
		let mut dispatches = self.dispatches.lock();
		let Some(entry) = dispatches.get_mut(&line_number) else {
			return true;
		};
		entry.in_flight = entry.in_flight.saturating_sub(1);
		let is_latest = entry.latest == ticket;
		if entry.in_flight == 0 {
			dispatches.remove(&line_number);
		}
		is_latest
	}
}

#[async_trait]
impl<S> DebounceHandler<usize, LineRequest<S>> for ClassifyHandler<S>
where
	S: Send + 'static,
{
	async fn fire(&self, line_number: usize, request: LineRequest<S>, ticket: u64) {
		self.dispatched(line_number, ticket);

		let range = request.snapshot.classify_range();
		tracing::trace!(line = line_number, ticket, ?range, "highlight.pipeline.dispatch");
		let provider = Arc::clone(&self.provider);
		let document = request.document;
		let analysis = tint_worker::spawn(TaskClass::Analysis, async move { provider.classify(document, range).await });
		let outcome = analysis.await;
		let is_latest = self.returned(line_number, ticket);
		let spans = match outcome {
			Ok(Ok(spans)) => spans,
			Ok(Err(error)) => {
				tracing::debug!(line = line_number, ticket, error = %error, "highlight.pipeline.classify_failed");
				return;
			}
			Err(error) => {
				tracing::debug!(line = line_number, ticket, error = %error, "highlight.pipeline.classify_panicked");
				return;
			}
		};

		if self.lifetime.is_cancelled() {
			tracing::trace!(line = line_number, ticket, "highlight.pipeline.disposed");
			return;
		}
		if !is_latest {
			tracing::trace!(line = line_number, ticket, "highlight.pipeline.superseded");
			return;
		}

		let completion = Completion {
			sections: sections_for_line(&spans, &request.snapshot),
			snapshot: request.snapshot,
			line: request.line,
		};
		if let Some(completion) = self.coordinator.route(completion) {
			self.owner.post(completion);
		}
	}
}

/// Debounced, coalescing front of the classification provider.
pub(crate) struct RequestPipeline<S> {
	debouncer: KeyedDebouncer<usize, LineRequest<S>, ClassifyHandler<S>>,
}

impl<S> RequestPipeline<S>
where
	S: Send + 'static,
{
	pub(crate) fn new(
		window: Duration,
		provider: Arc<dyn ClassificationProvider<S>>,
		coordinator: Arc<GroupCoordinator>,
		owner: OwnerSender,
		lifetime: LifetimeToken,
	) -> Self {
		let handler = ClassifyHandler {
			provider,
			coordinator,
			owner,
			dispatches: Mutex::new(FxHashMap::default()),
			lifetime: lifetime.clone(),
		};
		Self {
			debouncer: KeyedDebouncer::with_lifetime(window, handler, lifetime),
		}
	}

	/// Queues a classification for `snapshot`, replacing any request for the
	/// same line still inside its window.
	pub(crate) fn submit(&self, snapshot: LineSnapshot, line: SharedLine, document: S) -> SubmitOutcome {
		let line_number = snapshot.line_number;
		self.debouncer.submit(line_number, LineRequest { snapshot, line, document })
	}

	pub(crate) fn pending_len(&self) -> usize {
		self.debouncer.pending_len()
	}

	/// Lines with a classification call still running.
	pub(crate) fn in_flight_len(&self) -> usize {
		self.debouncer.handler().dispatches.lock().len()
	}

	pub(crate) fn close(&self) {
		self.debouncer.close();
	}
}
