use std::cmp::Ordering;
use std::ops::Range;

use crate::document::{DocVersion, Document, DocumentLine, LineId};

/// Frozen geometry of a line at request time.
///
/// Background work only ever sees this capture, never the live line, so later
/// edits cannot race with an in-flight classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
	pub line_id: LineId,
	pub line_number: usize,
	pub offset: usize,
	pub length: usize,
	pub total_length: usize,
	pub delimiter_length: usize,
	pub end_offset: usize,
	pub is_deleted: bool,
	/// Document version the geometry was read at.
	pub version: DocVersion,
}

impl LineSnapshot {
	pub fn capture(line: &DocumentLine, version: DocVersion) -> Self {
		Self {
			line_id: line.id,
			line_number: line.line_number,
			offset: line.offset,
			length: line.length,
			total_length: line.total_length(),
			delimiter_length: line.delimiter_length,
			end_offset: line.end_offset(),
			is_deleted: line.is_deleted,
			version,
		}
	}

	/// Byte range sent to the classification provider, delimiter included.
	pub fn classify_range(&self) -> Range<usize> {
		self.offset..self.offset + self.total_length
	}

	/// Currency check: may a result computed for this capture still be applied?
	///
	/// True only if the line was not deleted, the document has not moved past
	/// the captured version, the line still exists, and its length is unchanged.
	pub fn is_current<D: Document + ?Sized>(&self, document: &D) -> bool {
		!self.is_deleted
			&& self.version.compare_age(document.version()) == Some(Ordering::Equal)
			&& self.line_number <= document.line_count()
			&& document.line(self.line_number).is_some_and(|live| live.length == self.length)
	}
}
