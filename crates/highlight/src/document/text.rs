use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use ropey::{Rope, RopeSlice};

use super::{DocVersion, Document, DocumentLine, LineId};

static NEXT_HISTORY: AtomicU64 = AtomicU64::new(1);

struct TextState {
	rope: Rope,
	history: u64,
	seq: u64,
	/// One id per rope line, index-aligned with `rope.line(i)`.
	line_ids: Vec<LineId>,
	next_line_id: u64,
}

impl TextState {
	fn fresh_id(&mut self) -> LineId {
		let id = LineId(self.next_line_id);
		self.next_line_id += 1;
		id
	}

	fn reset(&mut self, text: &str) {
		self.rope = Rope::from_str(text);
		self.history = NEXT_HISTORY.fetch_add(1, Ordering::Relaxed);
		self.seq = 0;
		self.line_ids.clear();
		for _ in 0..self.rope.len_lines() {
			let id = self.fresh_id();
			self.line_ids.push(id);
		}
	}
}

/// In-memory versioned document backed by a [`Rope`].
///
/// Edits go through `&self` so the host and the highlighter can share one
/// instance behind an `Arc`. Line identities follow the usual editor rules:
/// the first line touched by an edit keeps its id, lines swallowed by the edit
/// are retired, and lines created by it receive new ids.
pub struct TextDocument {
	state: RwLock<TextState>,
}

impl Default for TextDocument {
	fn default() -> Self {
		Self::new("")
	}
}

impl TextDocument {
	pub fn new(text: &str) -> Self {
		let mut state = TextState {
			rope: Rope::new(),
			history: 0,
			seq: 0,
			line_ids: Vec::new(),
			next_line_id: 1,
		};
		state.reset(text);
		Self { state: RwLock::new(state) }
	}

	/// Replaces the byte range `range` with `text`.
	///
	/// The range is clamped to the document and rounded down to char
	/// boundaries.
	pub fn replace(&self, range: Range<usize>, text: &str) {
		let mut state = self.state.write();
		let len = state.rope.len_bytes();
		let start_byte = range.start.min(len);
		let end_byte = range.end.clamp(start_byte, len);

		let start_line = state.rope.byte_to_line(start_byte);
		let end_line = state.rope.byte_to_line(end_byte);

		let start_char = state.rope.byte_to_char(start_byte);
		let end_char = state.rope.byte_to_char(end_byte);
		state.rope.remove(start_char..end_char);
		state.rope.insert(start_char, text);

		let inserted_end = state.rope.char_to_byte(start_char + text.chars().count());
		let new_end_line = state.rope.byte_to_line(inserted_end);
		let fresh: Vec<LineId> = (start_line..new_end_line).map(|_| state.fresh_id()).collect();
		state.line_ids.splice(start_line + 1..end_line + 1, fresh);
		state.seq += 1;

		debug_assert_eq!(state.line_ids.len(), state.rope.len_lines(), "line ids out of sync with rope");
		tracing::trace!(
			history = state.history,
			seq = state.seq,
			start_line = start_line + 1,
			removed_lines = end_line - start_line,
			inserted_lines = new_end_line - start_line,
			"document.replace"
		);
	}

	pub fn insert(&self, offset: usize, text: &str) {
		self.replace(offset..offset, text);
	}

	pub fn remove(&self, range: Range<usize>) {
		self.replace(range, "");
	}

	/// Replaces the whole text and starts a new, unrelated edit history.
	pub fn set_text(&self, text: &str) {
		self.state.write().reset(text);
	}

	pub fn text(&self) -> String {
		self.state.read().rope.to_string()
	}

	pub fn len_bytes(&self) -> usize {
		self.state.read().rope.len_bytes()
	}
}

impl Document for TextDocument {
	type Snapshot = Rope;

	fn version(&self) -> DocVersion {
		let state = self.state.read();
		DocVersion::new(state.history, state.seq)
	}

	fn line_count(&self) -> usize {
		self.state.read().rope.len_lines()
	}

	fn line(&self, line_number: usize) -> Option<DocumentLine> {
		let state = self.state.read();
		let idx = line_number.checked_sub(1)?;
		if idx >= state.rope.len_lines() {
			return None;
		}
		let slice = state.rope.line(idx);
		let total_length = slice.len_bytes();
		let delimiter_length = delimiter_len(slice);
		Some(DocumentLine {
			id: state.line_ids[idx],
			line_number,
			offset: state.rope.line_to_byte(idx),
			length: total_length - delimiter_length,
			delimiter_length,
			is_deleted: false,
		})
	}

	fn snapshot(&self) -> Rope {
		self.state.read().rope.clone()
	}
}

fn delimiter_len(line: RopeSlice<'_>) -> usize {
	let chars = line.len_chars();
	if chars == 0 {
		return 0;
	}
	let last = line.char(chars - 1);
	match last {
		'\n' if chars >= 2 && line.char(chars - 2) == '\r' => 2,
		'\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}' => last.len_utf8(),
		_ => 0,
	}
}
