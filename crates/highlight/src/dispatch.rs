//! Delivery of classification results to the owner thread.
//!
//! Results are produced on worker tasks but may only touch shared highlighted
//! lines on the thread that owns the document and renderer. Workers post into
//! an unbounded single-consumer queue; the owner drains it from its event loop.

use tokio::sync::mpsc;

use crate::line::{HighlightedSection, SharedLine};
use crate::snapshot::LineSnapshot;

/// A finished classification waiting to be applied.
#[derive(Debug)]
pub struct Completion {
	pub snapshot: LineSnapshot,
	pub line: SharedLine,
	pub sections: Vec<HighlightedSection>,
}

/// Worker-side handle of the owner queue.
#[derive(Debug, Clone)]
pub(crate) struct OwnerSender {
	tx: mpsc::UnboundedSender<Completion>,
}

impl OwnerSender {
	/// Posts a completion. Returns false once the owner side is gone.
	pub(crate) fn post(&self, completion: Completion) -> bool {
		let line = completion.snapshot.line_number;
		match self.tx.send(completion) {
			Ok(()) => true,
			Err(_) => {
				tracing::trace!(line, "highlight.dispatch.closed");
				false
			}
		}
	}
}

/// Owner-side end of the queue.
#[derive(Debug)]
pub(crate) struct OwnerQueue {
	rx: mpsc::UnboundedReceiver<Completion>,
}

impl OwnerQueue {
	pub(crate) fn channel() -> (OwnerSender, Self) {
		let (tx, rx) = mpsc::unbounded_channel();
		(OwnerSender { tx }, Self { rx })
	}

	/// Takes one queued completion without waiting.
	pub(crate) fn try_next(&mut self) -> Option<Completion> {
		self.rx.try_recv().ok()
	}

	/// Waits for the next completion. `None` once closed and drained.
	pub(crate) async fn next(&mut self) -> Option<Completion> {
		self.rx.recv().await
	}

	/// Rejects further posts and discards anything already queued.
	pub(crate) fn close(&mut self) {
		self.rx.close();
		while self.rx.try_recv().is_ok() {}
	}
}
