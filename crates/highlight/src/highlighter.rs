//! The semantic highlighter the renderer talks to.
//!
//! Lives on the owner thread. `highlight_line` answers immediately from the
//! cache (exact reuse or a shifted seed) and queues an asynchronous
//! recompute; results come back through the owner queue and are applied only
//! while the captured line is still current.

use std::sync::Arc;

use tint_worker::LifetimeToken;

use crate::cache::{CacheLookup, HighlightCache};
use crate::classify::ClassificationProvider;
use crate::colors::{Color, ColorResolver};
use crate::config::HighlightConfig;
use crate::dispatch::{Completion, OwnerQueue};
use crate::document::{DocVersion, Document, DocumentLine};
use crate::error::{ConfigError, HighlightError};
use crate::group::{GroupCoordinator, HighlightingGroup};
use crate::line::{HighlightedLine, HighlightedSection, SharedLine};
use crate::pipeline::RequestPipeline;
use crate::snapshot::LineSnapshot;

/// Inclusive range of lines whose colors changed and need redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightingChanged {
	pub first_line: usize,
	pub last_line: usize,
}

type ChangeListener = Box<dyn FnMut(HighlightingChanged)>;
type VisibilityFilter = Box<dyn Fn(usize) -> bool>;

pub struct SemanticHighlighter<D: Document> {
	document: Arc<D>,
	cache: Option<HighlightCache>,
	pipeline: RequestPipeline<D::Snapshot>,
	coordinator: Arc<GroupCoordinator>,
	queue: OwnerQueue,
	colors: Arc<dyn ColorResolver>,
	listeners: Vec<ChangeListener>,
	visibility: Option<VisibilityFilter>,
	lifetime: LifetimeToken,
}

impl<D: Document> SemanticHighlighter<D> {
	/// Creates a highlighter that resolves colors through `colors`.
	///
	/// `config.colors` is not consulted here; use [`Self::from_config`] to
	/// build the color table from the configuration instead.
	pub fn new(
		document: Arc<D>,
		provider: Arc<dyn ClassificationProvider<D::Snapshot>>,
		colors: Arc<dyn ColorResolver>,
		config: &HighlightConfig,
	) -> Self {
		let coordinator = Arc::new(GroupCoordinator::new());
		let lifetime = LifetimeToken::new();
		let (owner, queue) = OwnerQueue::channel();
		let pipeline = RequestPipeline::new(config.debounce(), provider, Arc::clone(&coordinator), owner, lifetime.clone());
		Self {
			document,
			cache: config.use_cache.then(|| HighlightCache::new(config.cache_size)),
			pipeline,
			coordinator,
			queue,
			colors,
			listeners: Vec::new(),
			visibility: None,
			lifetime,
		}
	}

	/// Creates a highlighter whose colors are the default palette with
	/// `config.colors` applied.
	pub fn from_config(
		document: Arc<D>,
		provider: Arc<dyn ClassificationProvider<D::Snapshot>>,
		config: &HighlightConfig,
	) -> Result<Self, ConfigError> {
		let colors = config.color_table()?;
		Ok(Self::new(document, provider, Arc::new(colors), config))
	}

	/// Returns the highlighting for `line_number` without waiting.
	///
	/// An unchanged line returns its cached result as is. Otherwise a new
	/// highlighted line is returned, seeded from the stale cached one when
	/// available, and a recompute is queued.
	pub fn highlight_line(&mut self, line_number: usize) -> Result<SharedLine, HighlightError> {
		let Some(live) = self.document.line(line_number) else {
			return Err(HighlightError::LineOutOfRange {
				line: line_number,
				line_count: self.document.line_count(),
			});
		};
		let version = self.document.version();

		let seed = match self.cache.as_mut().map(|cache| cache.lookup(&live, version)) {
			Some(CacheLookup::Reuse(line)) => {
				tracing::trace!(line = line_number, "highlight.line.reuse");
				return Ok(line);
			}
			Some(CacheLookup::Seed { line, offset }) => Some((line, offset)),
			Some(CacheLookup::Miss) | None => None,
		};

		let implicit = (!self.coordinator.is_grouping()).then(|| self.coordinator.begin());
		let line = self.produce_line(&live, version, seed);
		if let Some(group) = implicit {
			self.end_highlighting(group);
		}
		Ok(line)
	}

	fn produce_line(&mut self, live: &DocumentLine, version: DocVersion, seed: Option<(SharedLine, usize)>) -> SharedLine {
		let highlighted = match seed {
			Some((previous, offset)) => previous.with(|previous| HighlightedLine::seeded(live, previous.sections(), offset)),
			None => HighlightedLine::new(live),
		};
		tracing::trace!(line = live.line_number, seeded = highlighted.sections().len(), "highlight.line.produce");

		let shared = SharedLine::new(highlighted);
		let snapshot = LineSnapshot::capture(live, version);
		if !self.is_disposed() {
			self.pipeline.submit(snapshot, shared.clone(), self.document.snapshot());
		}
		if let Some(cache) = &mut self.cache {
			cache.store(&snapshot, shared.clone());
		}
		shared
	}

	/// Opens a render pass.
	///
	/// # Panics
	///
	/// Panics if a pass is already open.
	pub fn begin_highlighting(&self) -> HighlightingGroup {
		self.coordinator.begin()
	}

	/// Tells the highlighter which line the renderer is painting.
	pub fn update_highlighting_state(&self, line_number: usize) {
		self.coordinator.update_state(line_number);
	}

	/// Closes the render pass and applies results parked during it.
	///
	/// # Panics
	///
	/// Panics if `group` is not the open pass.
	pub fn end_highlighting(&mut self, group: HighlightingGroup) {
		for completion in self.coordinator.end(group) {
			self.apply(completion);
		}
	}

	/// Registers a callback for changed line ranges.
	pub fn on_highlighting_changed(&mut self, listener: impl FnMut(HighlightingChanged) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Restricts per-line change notifications to lines the renderer reports
	/// as visible. Results for hidden lines are still applied.
	pub fn set_visibility_filter(&mut self, is_visible: impl Fn(usize) -> bool + 'static) {
		self.visibility = Some(Box::new(is_visible));
	}

	/// Applies every result that has arrived so far. Returns how many were applied.
	pub fn process_deliveries(&mut self) -> usize {
		let mut applied = 0;
		while let Some(completion) = self.queue.try_next() {
			if self.deliver(completion) {
				applied += 1;
			}
		}
		applied
	}

	/// Waits for the next result and handles it.
	///
	/// Returns false once the highlighter is disposed.
	pub async fn wait_for_delivery(&mut self) -> bool {
		match self.queue.next().await {
			Some(completion) => {
				self.deliver(completion);
				true
			}
			None => false,
		}
	}

	fn deliver(&mut self, completion: Completion) -> bool {
		match self.coordinator.route(completion) {
			Some(completion) => self.apply(completion),
			None => false,
		}
	}

	fn apply(&mut self, completion: Completion) -> bool {
		let line_number = completion.snapshot.line_number;
		if self.is_disposed() {
			return false;
		}
		if !completion.snapshot.is_current(&*self.document) {
			tracing::trace!(line = line_number, "highlight.apply.stale");
			return false;
		}

		completion.line.replace_sections(completion.sections);
		tracing::trace!(line = line_number, "highlight.apply");
		if self.visibility.as_ref().is_none_or(|is_visible| is_visible(line_number)) {
			self.notify(HighlightingChanged {
				first_line: line_number,
				last_line: line_number,
			});
		}
		true
	}

	fn notify(&mut self, change: HighlightingChanged) {
		for listener in &mut self.listeners {
			listener(change);
		}
	}

	/// Color for a section.
	pub fn color_for(&self, section: &HighlightedSection) -> Color {
		self.colors.resolve(section.class)
	}

	/// Color for text outside any section.
	pub fn default_color(&self) -> Color {
		self.colors.default_color()
	}

	/// Swaps the color resolver and asks the renderer to repaint everything.
	pub fn set_color_resolver(&mut self, colors: Arc<dyn ColorResolver>) {
		self.colors = colors;
		self.notify_all_lines();
	}

	/// Forces every cached line to be recomputed on its next request.
	///
	/// Cached sections remain on screen as seeds until fresh results arrive.
	pub fn refresh(&mut self) {
		if let Some(cache) = &mut self.cache {
			cache.invalidate_all();
		}
		self.notify_all_lines();
	}

	fn notify_all_lines(&mut self) {
		let line_count = self.document.line_count();
		if line_count > 0 {
			self.notify(HighlightingChanged {
				first_line: 1,
				last_line: line_count,
			});
		}
	}

	pub fn cached_line_count(&self) -> usize {
		self.cache.as_ref().map_or(0, HighlightCache::len)
	}

	/// Lines with a request still inside its debounce window.
	pub fn pending_request_count(&self) -> usize {
		self.pipeline.pending_len()
	}

	/// Lines with a classification call still running.
	pub fn in_flight_request_count(&self) -> usize {
		self.pipeline.in_flight_len()
	}

	/// Results parked by the open render pass.
	pub fn deferred_count(&self) -> usize {
		self.coordinator.pending_len()
	}

	pub fn is_disposed(&self) -> bool {
		self.lifetime.is_cancelled()
	}

	/// Stops all further updates.
	///
	/// Pending requests are dropped, queued results discarded, and listeners
	/// released. Classification calls already running finish into the void.
	pub fn dispose(&mut self) {
		if self.is_disposed() {
			return;
		}
		self.lifetime.cancel();
		self.pipeline.close();
		self.queue.close();
		self.coordinator.discard_pending();
		self.listeners.clear();
		self.visibility = None;
		tracing::debug!(cached = self.cached_line_count(), "highlight.disposed");
	}
}

impl<D: Document> Drop for SemanticHighlighter<D> {
	fn drop(&mut self) {
		self.dispose();
	}
}

#[cfg(test)]
mod tests;
