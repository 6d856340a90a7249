//! Incremental, asynchronous semantic highlighting.
//!
//! A renderer asks [`SemanticHighlighter::highlight_line`] for a line and gets
//! an answer immediately: the cached result when the line is unchanged, or a
//! seed shifted from the previous result while a fresh classification runs in
//! the background. Requests are debounced and coalesced per line, results are
//! marshalled back to the owner thread, and a result is applied only if the
//! line it was computed for is still current.

pub mod cache;
pub mod classify;
pub mod colors;
pub mod config;
mod dispatch;
pub mod document;
pub mod error;
pub mod group;
mod highlighter;
pub mod line;
mod pipeline;
pub mod snapshot;

pub use cache::{CacheLookup, DEFAULT_CACHE_SIZE, HighlightCache};
pub use classify::{ClassificationProvider, ClassifiedSpan};
pub use colors::{ClassificationColors, Color, ColorResolver, TokenClass};
pub use config::HighlightConfig;
pub use dispatch::Completion;
pub use document::{DocVersion, Document, DocumentLine, LineId, TextDocument};
pub use error::{ClassifyError, ConfigError, HighlightError};
pub use group::{GroupState, HighlightingGroup};
pub use highlighter::{HighlightingChanged, SemanticHighlighter};
pub use line::{HighlightedLine, HighlightedSection, SharedLine};
pub use pipeline::DEFAULT_DEBOUNCE;
pub use snapshot::LineSnapshot;
