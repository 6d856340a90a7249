//! Highlighting groups: one bracketed render pass.
//!
//! While the renderer paints, a result for the line currently being painted
//! must not mutate that line's sections. Such results are parked here and
//! applied when the pass ends. Workers and the owner thread both touch the
//! parked list, hence the lock.

use parking_lot::Mutex;

use crate::dispatch::Completion;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupState {
	#[default]
	Idle,
	/// A render pass is open. `current_line` is the first line the renderer
	/// reported for this pass.
	Grouping { current_line: Option<usize> },
}

/// Proof of an open highlighting group.
///
/// Returned by `begin_highlighting` and consumed by `end_highlighting`.
#[must_use = "a highlighting group must be closed with `end_highlighting`"]
#[derive(Debug, PartialEq, Eq)]
pub struct HighlightingGroup {
	id: u64,
}

#[derive(Debug, Default)]
struct GroupInner {
	state: GroupState,
	generation: u64,
	pending: Vec<Completion>,
}

#[derive(Debug, Default)]
pub struct GroupCoordinator {
	inner: Mutex<GroupInner>,
}

impl GroupCoordinator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> GroupState {
		self.inner.lock().state
	}

	pub fn is_grouping(&self) -> bool {
		matches!(self.state(), GroupState::Grouping { .. })
	}

	/// Opens a group.
	///
	/// # Panics
	///
	/// Panics if a group is already open: the renderer re-entered a pass.
	pub fn begin(&self) -> HighlightingGroup {
		let mut inner = self.inner.lock();
		if let GroupState::Grouping { current_line } = inner.state {
			drop(inner);
			panic!("begin_highlighting called while a highlighting group is already active (current line: {current_line:?})");
		}
		inner.generation += 1;
		inner.state = GroupState::Grouping { current_line: None };
		tracing::trace!(group = inner.generation, "highlight.group.begin");
		HighlightingGroup { id: inner.generation }
	}

	/// Records the line being rendered. Only the first call in a pass counts.
	pub fn update_state(&self, line_number: usize) {
		let mut inner = self.inner.lock();
		if let GroupState::Grouping { current_line: current @ None } = &mut inner.state {
			*current = Some(line_number);
		}
	}

	/// Closes `group` and hands back the parked completions in arrival order.
	///
	/// # Panics
	///
	/// Panics if `group` is not the currently open group.
	pub fn end(&self, group: HighlightingGroup) -> Vec<Completion> {
		let mut inner = self.inner.lock();
		let open = matches!(inner.state, GroupState::Grouping { .. }) && inner.generation == group.id;
		if !open {
			drop(inner);
			panic!("end_highlighting called with a highlighting group that is not active");
		}
		inner.state = GroupState::Idle;
		let pending = std::mem::take(&mut inner.pending);
		tracing::trace!(group = group.id, deferred = pending.len(), "highlight.group.end");
		pending
	}

	/// Parks `completion` if it targets the line being rendered right now,
	/// otherwise gives it back for immediate application.
	pub fn route(&self, completion: Completion) -> Option<Completion> {
		let mut inner = self.inner.lock();
		match inner.state {
			GroupState::Grouping {
				current_line: Some(line),
			} if line == completion.snapshot.line_number => {
				tracing::trace!(line, "highlight.group.defer");
				inner.pending.push(completion);
				None
			}
			_ => Some(completion),
		}
	}

	pub fn pending_len(&self) -> usize {
		self.inner.lock().pending.len()
	}

	pub(crate) fn discard_pending(&self) {
		self.inner.lock().pending.clear();
	}
}
