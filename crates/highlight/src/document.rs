//! The document surface the highlighter reads.
//!
//! The highlighter never owns or edits text. It reads versions and line
//! geometry through [`Document`], and hands an opaque [`Document::Snapshot`]
//! to the classification provider so background work never touches the live
//! buffer.

use std::cmp::Ordering;

mod text;

pub use text::TextDocument;

/// Edit-history marker of a document.
///
/// Versions are only comparable within one history. A full reload starts a
/// new history, after which no incremental continuity exists between old and
/// new positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocVersion {
	history: u64,
	seq: u64,
}

impl DocVersion {
	pub const fn new(history: u64, seq: u64) -> Self {
		Self { history, seq }
	}

	pub const fn history(self) -> u64 {
		self.history
	}

	pub const fn seq(self) -> u64 {
		self.seq
	}

	/// Returns true if both versions come from the same edit history.
	pub fn belongs_to_same_document(self, other: Self) -> bool {
		self.history == other.history
	}

	/// Orders two versions by age, or `None` if they are from unrelated histories.
	pub fn compare_age(self, other: Self) -> Option<Ordering> {
		self.belongs_to_same_document(other).then(|| self.seq.cmp(&other.seq))
	}
}

/// Stable identity of a document line.
///
/// Survives edits inside the line and line-number shifts caused by edits
/// elsewhere; retired when the line is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u64);

/// Geometry of a live document line. Offsets are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLine {
	pub id: LineId,
	/// 1-based line number.
	pub line_number: usize,
	pub offset: usize,
	/// Length excluding the line delimiter.
	pub length: usize,
	pub delimiter_length: usize,
	pub is_deleted: bool,
}

impl DocumentLine {
	/// Length including the line delimiter.
	pub const fn total_length(&self) -> usize {
		self.length + self.delimiter_length
	}

	/// Offset one past the last non-delimiter byte.
	pub const fn end_offset(&self) -> usize {
		self.offset + self.length
	}
}

/// A versioned text buffer owned by the host.
pub trait Document {
	/// Immutable capture of the text, handed to the classification provider.
	type Snapshot: Send + 'static;

	fn version(&self) -> DocVersion;

	fn line_count(&self) -> usize;

	/// Returns the line at the 1-based `line_number`, if it exists.
	fn line(&self, line_number: usize) -> Option<DocumentLine>;

	fn snapshot(&self) -> Self::Snapshot;
}

impl<D: Document + ?Sized> Document for std::sync::Arc<D> {
	type Snapshot = D::Snapshot;

	fn version(&self) -> DocVersion {
		(**self).version()
	}

	fn line_count(&self) -> usize {
		(**self).line_count()
	}

	fn line(&self, line_number: usize) -> Option<DocumentLine> {
		(**self).line(line_number)
	}

	fn snapshot(&self) -> Self::Snapshot {
		(**self).snapshot()
	}
}
