use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use ropey::Rope;
use tokio::time::sleep;

use super::*;
use crate::classify::ClassifiedSpan;
use crate::colors::{ClassificationColors, TokenClass};
use crate::document::TextDocument;
use crate::error::ClassifyError;

const LATENCY: Duration = Duration::from_millis(10);

/// Classifies runs of letters as identifiers and runs of digits as numbers.
#[derive(Default)]
struct WordProvider {
	calls: Mutex<Vec<Range<usize>>>,
	latencies: Mutex<VecDeque<Duration>>,
	failing: AtomicBool,
}

impl WordProvider {
	fn calls(&self) -> Vec<Range<usize>> {
		self.calls.lock().clone()
	}
}

#[async_trait]
impl ClassificationProvider<Rope> for WordProvider {
	async fn classify(&self, snapshot: Rope, range: Range<usize>) -> Result<Vec<ClassifiedSpan>, ClassifyError> {
		self.calls.lock().push(range.clone());
		let latency = self.latencies.lock().pop_front().unwrap_or(LATENCY);
		sleep(latency).await;
		if self.failing.load(Ordering::Relaxed) {
			return Err(ClassifyError::failed("analysis crashed"));
		}

		let end = range.end.min(snapshot.len_bytes());
		let text = snapshot.slice(snapshot.byte_to_char(range.start)..snapshot.byte_to_char(end)).to_string();
		let mut spans = Vec::new();
		let mut run: Option<(usize, TokenClass)> = None;
		for (i, ch) in text.char_indices().chain([(text.len(), ' ')]) {
			let class = if ch.is_ascii_alphabetic() {
				Some(TokenClass::Identifier)
			} else if ch.is_ascii_digit() {
				Some(TokenClass::Number)
			} else {
				None
			};
			match (run, class) {
				(Some((_, current)), Some(next)) if current == next => {}
				(Some((start, current)), next) => {
					spans.push(ClassifiedSpan::new(range.start + start, i - start, current));
					run = next.map(|next| (i, next));
				}
				(None, next) => run = next.map(|next| (i, next)),
			}
		}
		Ok(spans)
	}
}

struct Fixture {
	document: Arc<TextDocument>,
	provider: Arc<WordProvider>,
	highlighter: SemanticHighlighter<TextDocument>,
	changes: Rc<RefCell<Vec<HighlightingChanged>>>,
}

fn fixture_with(text: &str, config: HighlightConfig) -> Fixture {
	let document = Arc::new(TextDocument::new(text));
	let provider = Arc::new(WordProvider::default());
	let mut highlighter = SemanticHighlighter::new(
		Arc::clone(&document),
		Arc::clone(&provider) as Arc<dyn ClassificationProvider<Rope>>,
		Arc::new(ClassificationColors::default()),
		&config,
	);
	let changes = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&changes);
	highlighter.on_highlighting_changed(move |change| sink.borrow_mut().push(change));
	Fixture {
		document,
		provider,
		highlighter,
		changes,
	}
}

fn fixture(text: &str) -> Fixture {
	fixture_with(text, HighlightConfig::default())
}

fn changed(first_line: usize, last_line: usize) -> HighlightingChanged {
	HighlightingChanged { first_line, last_line }
}

fn ident(offset: usize, length: usize) -> HighlightedSection {
	HighlightedSection::new(offset, length, TokenClass::Identifier)
}

/// Past the debounce window and the provider latency.
async fn settle() {
	sleep(Duration::from_millis(150)).await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn first_request_returns_empty_line_then_fills_in() {
	let mut fx = fixture("ab\nfoo bar\n");
	let line = fx.highlighter.highlight_line(2).unwrap();
	assert!(line.sections().is_empty());
	assert_eq!(fx.highlighter.pending_request_count(), 1);

	settle().await;
	assert_eq!(fx.highlighter.process_deliveries(), 1);
	assert_eq!(line.sections(), vec![ident(3, 3), ident(7, 3)]);
	assert_eq!(fx.provider.calls(), vec![3..11]);
	assert_eq!(*fx.changes.borrow(), vec![changed(2, 2)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unchanged_line_is_served_from_cache() {
	let mut fx = fixture("foo\nbar");
	let first = fx.highlighter.highlight_line(1).unwrap();
	let again = fx.highlighter.highlight_line(1).unwrap();
	assert!(first.ptr_eq(&again));
	assert_eq!(fx.highlighter.cached_line_count(), 1);

	settle().await;
	fx.highlighter.process_deliveries();
	let cached = fx.highlighter.highlight_line(1).unwrap();
	assert!(cached.ptr_eq(&first));
	assert_eq!(cached.sections(), vec![ident(0, 3)]);
	assert_eq!(fx.provider.calls().len(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn edit_above_shifts_seeded_sections() {
	let mut fx = fixture("a\nfoo 42\n");
	let before = fx.highlighter.highlight_line(2).unwrap();
	settle().await;
	fx.highlighter.process_deliveries();
	assert_eq!(
		before.sections(),
		vec![ident(2, 3), HighlightedSection::new(6, 2, TokenClass::Number)]
	);

	fx.document.insert(0, "zzz");
	let seeded = fx.highlighter.highlight_line(2).unwrap();
	assert!(!seeded.ptr_eq(&before));
	assert_eq!(
		seeded.sections(),
		vec![ident(5, 3), HighlightedSection::new(9, 2, TokenClass::Number)]
	);
	assert_eq!(fx.highlighter.pending_request_count(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn result_for_edited_line_is_discarded() {
	let mut fx = fixture("foo\n");
	let line = fx.highlighter.highlight_line(1).unwrap();

	// Timer has fired; the provider call is in flight.
	sleep(Duration::from_millis(105)).await;
	assert_eq!(fx.provider.calls().len(), 1);
	fx.document.insert(3, "d");

	settle().await;
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert!(line.sections().is_empty());
	assert!(fx.changes.borrow().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn burst_of_edits_classifies_latest_geometry_once() {
	let mut fx = fixture("x\n");
	let mut latest = fx.highlighter.highlight_line(1).unwrap();
	for (offset, typed) in [(1, "y"), (2, "z")] {
		sleep(Duration::from_millis(30)).await;
		fx.document.insert(offset, typed);
		latest = fx.highlighter.highlight_line(1).unwrap();
	}

	settle().await;
	assert_eq!(fx.provider.calls(), vec![0..4]);
	assert_eq!(fx.highlighter.process_deliveries(), 1);
	assert_eq!(latest.sections(), vec![ident(0, 3)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn superseded_dispatch_is_dropped() {
	let mut fx = fixture("foo\n");
	fx.provider.latencies.lock().push_back(Duration::from_millis(200));
	let slow = fx.highlighter.highlight_line(1).unwrap();

	sleep(Duration::from_millis(105)).await;
	assert_eq!(fx.highlighter.in_flight_request_count(), 1);
	fx.highlighter.refresh();
	let fast = fx.highlighter.highlight_line(1).unwrap();
	fx.changes.borrow_mut().clear();

	// Second dispatch at 205ms completes at 215ms, before the first at 300ms.
	sleep(Duration::from_millis(145)).await;
	assert_eq!(fx.highlighter.process_deliveries(), 1);
	assert_eq!(fast.sections(), vec![ident(0, 3)]);
	assert_eq!(fx.highlighter.in_flight_request_count(), 1, "first call still running");

	sleep(Duration::from_millis(100)).await;
	assert_eq!(fx.provider.calls().len(), 2);
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert!(slow.sections().is_empty());
	assert_eq!(*fx.changes.borrow(), vec![changed(1, 1)]);
	assert_eq!(fx.highlighter.in_flight_request_count(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dispatch_tracking_is_released_after_each_call() {
	let mut fx = fixture("foo\nbar\nbaz");
	for line in 1..=3 {
		fx.highlighter.highlight_line(line).unwrap();
	}
	sleep(Duration::from_millis(105)).await;
	assert_eq!(fx.highlighter.in_flight_request_count(), 3);

	fx.provider.failing.store(true, Ordering::Relaxed);
	settle().await;
	assert_eq!(fx.highlighter.in_flight_request_count(), 0);
	assert_eq!(fx.highlighter.process_deliveries(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn result_for_rendered_line_waits_for_end_of_pass() {
	let mut fx = fixture("foo\nbar\n");
	let line = fx.highlighter.highlight_line(1).unwrap();
	sleep(Duration::from_millis(105)).await;

	let group = fx.highlighter.begin_highlighting();
	fx.highlighter.update_highlighting_state(1);
	sleep(Duration::from_millis(20)).await;

	assert_eq!(fx.highlighter.deferred_count(), 1);
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert!(line.sections().is_empty());

	fx.highlighter.end_highlighting(group);
	assert_eq!(fx.highlighter.deferred_count(), 0);
	assert_eq!(line.sections(), vec![ident(0, 3)]);
	assert_eq!(*fx.changes.borrow(), vec![changed(1, 1)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn other_lines_apply_during_a_pass() {
	let mut fx = fixture("foo\nbar\n");
	let line = fx.highlighter.highlight_line(1).unwrap();

	let group = fx.highlighter.begin_highlighting();
	fx.highlighter.update_highlighting_state(2);
	settle().await;
	assert_eq!(fx.highlighter.process_deliveries(), 1);
	assert_eq!(line.sections(), vec![ident(0, 3)]);
	fx.highlighter.end_highlighting(group);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn drained_delivery_for_rendered_line_is_deferred_again() {
	let mut fx = fixture("foo\n");
	let line = fx.highlighter.highlight_line(1).unwrap();
	settle().await;

	// Result already queued, then the renderer starts painting that line.
	let group = fx.highlighter.begin_highlighting();
	fx.highlighter.update_highlighting_state(1);
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert_eq!(fx.highlighter.deferred_count(), 1);
	assert!(line.sections().is_empty());

	fx.highlighter.end_highlighting(group);
	assert_eq!(line.sections(), vec![ident(0, 3)]);
}

#[test]
#[should_panic(expected = "already active")]
fn nested_render_pass_panics() {
	let fx = fixture("foo");
	let _outer = fx.highlighter.begin_highlighting();
	let _inner = fx.highlighter.begin_highlighting();
}

#[test]
fn missing_line_is_an_error() {
	let mut fx = fixture("a\nb");
	assert_eq!(
		fx.highlighter.highlight_line(3).unwrap_err(),
		HighlightError::LineOutOfRange { line: 3, line_count: 2 }
	);
	assert!(matches!(
		fx.highlighter.highlight_line(0),
		Err(HighlightError::LineOutOfRange { line: 0, .. })
	));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn provider_failure_keeps_seed_and_stays_quiet() {
	let mut fx = fixture("a\nfoo\n");
	fx.highlighter.highlight_line(2).unwrap();
	settle().await;
	fx.highlighter.process_deliveries();
	fx.changes.borrow_mut().clear();

	fx.provider.failing.store(true, Ordering::Relaxed);
	fx.document.insert(0, "b");
	let seeded = fx.highlighter.highlight_line(2).unwrap();
	assert_eq!(seeded.sections(), vec![ident(3, 3)]);

	settle().await;
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert_eq!(seeded.sections(), vec![ident(3, 3)]);
	assert!(fx.changes.borrow().is_empty());
	assert_eq!(fx.provider.calls().len(), 2, "no retry");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn reload_drops_cached_line_instead_of_seeding() {
	let mut fx = fixture("foo\n");
	fx.highlighter.highlight_line(1).unwrap();
	settle().await;
	fx.highlighter.process_deliveries();

	fx.document.set_text("foo\n");
	let fresh = fx.highlighter.highlight_line(1).unwrap();
	assert!(fresh.sections().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn refresh_reclassifies_cached_lines() {
	let mut fx = fixture("foo\nbar");
	let before = fx.highlighter.highlight_line(1).unwrap();
	settle().await;
	fx.highlighter.process_deliveries();
	fx.changes.borrow_mut().clear();

	fx.highlighter.refresh();
	assert_eq!(*fx.changes.borrow(), vec![changed(1, 2)]);

	let after = fx.highlighter.highlight_line(1).unwrap();
	assert!(!after.ptr_eq(&before));
	assert_eq!(after.sections(), before.sections());
	assert_eq!(fx.highlighter.pending_request_count(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn hidden_lines_are_updated_without_notification() {
	let mut fx = fixture("foo\nbar");
	fx.highlighter.set_visibility_filter(|line| line != 1);
	let hidden = fx.highlighter.highlight_line(1).unwrap();
	let shown = fx.highlighter.highlight_line(2).unwrap();

	settle().await;
	assert_eq!(fx.highlighter.process_deliveries(), 2);
	assert_eq!(hidden.sections(), vec![ident(0, 3)]);
	assert_eq!(shown.sections(), vec![ident(4, 3)]);
	assert_eq!(*fx.changes.borrow(), vec![changed(2, 2)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn without_cache_every_call_recomputes() {
	let config = HighlightConfig {
		use_cache: false,
		..HighlightConfig::default()
	};
	let mut fx = fixture_with("foo", config);
	let first = fx.highlighter.highlight_line(1).unwrap();
	let second = fx.highlighter.highlight_line(1).unwrap();
	assert!(!first.ptr_eq(&second));
	assert_eq!(fx.highlighter.cached_line_count(), 0);

	settle().await;
	assert_eq!(fx.provider.calls().len(), 1);
	assert_eq!(fx.highlighter.process_deliveries(), 1);
	assert_eq!(second.sections(), vec![ident(0, 3)]);
	assert!(first.sections().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn wait_for_delivery_applies_next_result() {
	let mut fx = fixture("foo");
	let line = fx.highlighter.highlight_line(1).unwrap();
	assert!(fx.highlighter.wait_for_delivery().await);
	assert_eq!(line.sections(), vec![ident(0, 3)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dispose_cancels_pending_requests() {
	let mut fx = fixture("foo\nbar");
	fx.highlighter.highlight_line(1).unwrap();
	fx.highlighter.dispose();
	fx.highlighter.dispose();
	assert!(fx.highlighter.is_disposed());
	assert_eq!(fx.highlighter.pending_request_count(), 0);

	fx.highlighter.highlight_line(2).unwrap();
	settle().await;
	assert!(fx.provider.calls().is_empty());
	assert!(!fx.highlighter.wait_for_delivery().await);
	assert!(fx.changes.borrow().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dispose_discards_in_flight_results() {
	let mut fx = fixture("foo");
	let line = fx.highlighter.highlight_line(1).unwrap();
	sleep(Duration::from_millis(105)).await;
	fx.highlighter.dispose();

	settle().await;
	assert_eq!(fx.provider.calls().len(), 1);
	assert_eq!(fx.highlighter.process_deliveries(), 0);
	assert!(line.sections().is_empty());
}

#[test]
fn config_colors_apply_when_built_from_config() {
	let document = Arc::new(TextDocument::new("foo"));
	let provider: Arc<dyn ClassificationProvider<Rope>> = Arc::new(WordProvider::default());
	let mut config = HighlightConfig::default();
	config.colors.insert("keyword".to_string(), "#ff0000".to_string());
	config.colors.insert("default".to_string(), "#000000".to_string());

	let highlighter = SemanticHighlighter::from_config(Arc::clone(&document), Arc::clone(&provider), &config).unwrap();
	let keyword = HighlightedSection::new(0, 3, TokenClass::Keyword);
	assert_eq!(highlighter.color_for(&keyword), Color::rgb(0xff, 0, 0));
	assert_eq!(highlighter.default_color(), Color::rgb(0, 0, 0));

	config.colors.insert("keyword".to_string(), "red".to_string());
	assert!(matches!(
		SemanticHighlighter::from_config(document, provider, &config),
		Err(ConfigError::InvalidColor(_))
	));
}

#[test]
fn color_resolver_swap_repaints_everything() {
	let mut fx = fixture("a\nb\nc");
	let keyword = HighlightedSection::new(0, 1, TokenClass::Keyword);
	assert_eq!(fx.highlighter.color_for(&keyword), ClassificationColors::default().resolve(TokenClass::Keyword));

	let red = Color::rgb(0xff, 0, 0);
	fx.highlighter
		.set_color_resolver(Arc::new(ClassificationColors::default().with(TokenClass::Keyword, red)));
	assert_eq!(fx.highlighter.color_for(&keyword), red);
	assert_eq!(fx.highlighter.default_color(), ClassificationColors::default().default_color());
	assert_eq!(*fx.changes.borrow(), vec![changed(1, 3)]);
}
