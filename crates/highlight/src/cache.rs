//! Bounded cache of highlighted lines.
//!
//! Keeps the last highlighted result per line identity so that re-rendering
//! an unchanged line is free and an edited line can be seeded from what was
//! on screen before. Eviction is a bulk sweep of the oldest half once the
//! entry count crosses capacity, not per-access LRU.

use std::cmp::Ordering;

use crate::document::{DocVersion, DocumentLine, LineId};
use crate::line::SharedLine;
use crate::snapshot::LineSnapshot;

/// Default number of cached lines.
pub const DEFAULT_CACHE_SIZE: usize = 512;

#[derive(Debug, Clone)]
struct CacheEntry {
	line: SharedLine,
	line_id: LineId,
	version: DocVersion,
	/// Line offset when the entry was captured; seeds shift relative to this.
	offset: usize,
	length: usize,
	valid: bool,
}

/// Result of a cache lookup for a live line.
#[derive(Debug, Clone)]
pub enum CacheLookup {
	/// The document has not changed since capture; the cached line is exact.
	Reuse(SharedLine),
	/// The entry is outdated but from the same history; usable as a seed.
	Seed { line: SharedLine, offset: usize },
	Miss,
}

#[derive(Debug)]
pub struct HighlightCache {
	entries: Vec<CacheEntry>,
	capacity: usize,
}

impl Default for HighlightCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_SIZE)
	}
}

impl HighlightCache {
	/// Creates a cache holding up to `capacity` lines (at least 2).
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(2);
		Self {
			entries: Vec::with_capacity(capacity + 1),
			capacity,
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Looks up the entry for `line` at the document's current `version`.
	///
	/// Entries for this line from an unrelated edit history cannot be carried
	/// forward and are removed.
	pub fn lookup(&mut self, line: &DocumentLine, version: DocVersion) -> CacheLookup {
		let before = self.entries.len();
		self.entries
			.retain(|entry| entry.line_id != line.id || entry.version.belongs_to_same_document(version));
		if self.entries.len() != before {
			tracing::trace!(line = line.line_number, "highlight.cache.drop_unrelated");
		}

		let Some(entry) = self.entries.iter().rev().find(|entry| entry.line_id == line.id) else {
			return CacheLookup::Miss;
		};

		if entry.valid && entry.version.compare_age(version) == Some(Ordering::Equal) && entry.length == line.length {
			CacheLookup::Reuse(entry.line.clone())
		} else {
			CacheLookup::Seed {
				line: entry.line.clone(),
				offset: entry.offset,
			}
		}
	}

	/// Records `line` as the latest result for the snapshot's line.
	///
	/// Replaces any older entry for the same line identity.
	pub fn store(&mut self, snapshot: &LineSnapshot, line: SharedLine) {
		self.entries.retain(|entry| entry.line_id != snapshot.line_id);
		self.entries.push(CacheEntry {
			line,
			line_id: snapshot.line_id,
			version: snapshot.version,
			offset: snapshot.offset,
			length: snapshot.length,
			valid: true,
		});
		self.evict_if_over_capacity();
	}

	/// Drops the oldest `capacity / 2` entries once the cache is over capacity.
	///
	/// Returns the number of evicted entries.
	pub fn evict_if_over_capacity(&mut self) -> usize {
		if self.entries.len() <= self.capacity {
			return 0;
		}
		let evict = self.capacity / 2;
		self.entries.drain(..evict);
		tracing::debug!(evicted = evict, remaining = self.entries.len(), "highlight.cache.evict");
		evict
	}

	/// Marks every entry as needing recomputation. Entries remain usable as seeds.
	pub fn invalidate_all(&mut self) {
		for entry in &mut self.entries {
			entry.valid = false;
		}
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
