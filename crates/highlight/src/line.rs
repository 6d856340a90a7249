//! Highlighted lines and their color sections.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::colors::TokenClass;
use crate::document::{DocumentLine, LineId};

/// A classified run of bytes inside one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightedSection {
	pub offset: usize,
	pub length: usize,
	pub class: TokenClass,
}

impl HighlightedSection {
	pub const fn new(offset: usize, length: usize, class: TokenClass) -> Self {
		Self { offset, length, class }
	}

	pub const fn end(&self) -> usize {
		self.offset.saturating_add(self.length)
	}
}

/// Color sections of one line.
///
/// Sections are sorted by offset, never overlap, and lie within
/// `[offset, end_offset)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedLine {
	line_id: LineId,
	line_number: usize,
	offset: usize,
	end_offset: usize,
	sections: Vec<HighlightedSection>,
}

impl HighlightedLine {
	/// Creates an empty highlighted line for `line`.
	pub fn new(line: &DocumentLine) -> Self {
		Self {
			line_id: line.id,
			line_number: line.line_number,
			offset: line.offset,
			end_offset: line.end_offset(),
			sections: Vec::new(),
		}
	}

	/// Creates a highlighted line for `line` approximated from stale sections.
	///
	/// `previous` was computed while the line started at `previous_offset`.
	/// Sections are shifted by the offset delta; anything shifted before the
	/// new line start is dropped, copying stops at the first section that
	/// lands at or past the new end, and survivors are clipped to the end.
	pub fn seeded(line: &DocumentLine, previous: &[HighlightedSection], previous_offset: usize) -> Self {
		let mut seeded = Self::new(line);
		let start = line.offset as isize;
		let end = line.end_offset() as isize;
		let shift = line.offset as isize - previous_offset as isize;

		for section in previous {
			let offset = section.offset as isize + shift;
			if offset < start {
				continue;
			}
			if offset >= end {
				break;
			}
			let length = (section.length as isize).min(end - offset);
			seeded.sections.push(HighlightedSection::new(offset as usize, length as usize, section.class));
		}
		seeded
	}

	pub fn line_id(&self) -> LineId {
		self.line_id
	}

	pub fn line_number(&self) -> usize {
		self.line_number
	}

	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn end_offset(&self) -> usize {
		self.end_offset
	}

	pub fn sections(&self) -> &[HighlightedSection] {
		&self.sections
	}

	/// Replaces all sections.
	///
	/// The incoming list is sorted and clipped to the line. Empty sections and
	/// sections starting inside the previously kept one are dropped.
	pub fn replace_sections(&mut self, mut sections: Vec<HighlightedSection>) {
		sections.sort_by_key(|s| s.offset);
		self.sections.clear();
		let mut prev_end: Option<usize> = None;
		for section in sections {
			if prev_end.is_some_and(|prev_end| section.offset < prev_end) {
				continue;
			}
			let start = section.offset.max(self.offset);
			let end = section.end().min(self.end_offset);
			if start >= end {
				continue;
			}
			self.sections.push(HighlightedSection::new(start, end - start, section.class));
			prev_end = Some(end);
		}
	}
}

/// Handle to a highlighted line shared by the cache, the renderer, and
/// in-flight requests. Updated in place when a result is applied.
#[derive(Debug, Clone)]
pub struct SharedLine(Arc<RwLock<HighlightedLine>>);

impl SharedLine {
	pub fn new(line: HighlightedLine) -> Self {
		Self(Arc::new(RwLock::new(line)))
	}

	/// Copies the current sections.
	pub fn sections(&self) -> Vec<HighlightedSection> {
		self.0.read().sections.clone()
	}

	/// Runs `f` against the current state.
	pub fn with<R>(&self, f: impl FnOnce(&HighlightedLine) -> R) -> R {
		f(&self.0.read())
	}

	pub fn line_number(&self) -> usize {
		self.0.read().line_number
	}

	/// Returns true if both handles point at the same highlighted line.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn replace_sections(&self, sections: Vec<HighlightedSection>) {
		self.0.write().replace_sections(sections);
	}
}
