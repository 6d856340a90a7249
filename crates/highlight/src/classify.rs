//! The classification provider seam.

use std::ops::Range;

use async_trait::async_trait;

use crate::colors::TokenClass;
use crate::error::ClassifyError;
use crate::line::HighlightedSection;
use crate::snapshot::LineSnapshot;

/// A classified byte span in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSpan {
	pub start: usize,
	pub length: usize,
	pub class: TokenClass,
}

impl ClassifiedSpan {
	pub const fn new(start: usize, length: usize, class: TokenClass) -> Self {
		Self { start, length, class }
	}

	/// One past the last byte. Saturates, since lengths come from the provider.
	pub const fn end(&self) -> usize {
		self.start.saturating_add(self.length)
	}
}

/// Semantic analysis service producing classified spans for a byte range.
///
/// Called off the owner thread. Any error abandons the request.
#[async_trait]
pub trait ClassificationProvider<S>: Send + Sync + 'static {
	async fn classify(&self, snapshot: S, range: Range<usize>) -> Result<Vec<ClassifiedSpan>, ClassifyError>;
}

/// Converts provider spans into sections clipped to the captured line.
///
/// Spans starting past the line end are skipped; the rest are clipped to
/// `[offset, end_offset]`, and spans left empty are dropped.
pub fn sections_for_line(spans: &[ClassifiedSpan], line: &LineSnapshot) -> Vec<HighlightedSection> {
	spans
		.iter()
		.filter(|span| span.start <= line.end_offset)
		.filter_map(|span| {
			let start = span.start.max(line.offset);
			let end = span.end().min(line.end_offset);
			(start < end).then(|| HighlightedSection::new(start, end - start, span.class))
		})
		.collect()
}
