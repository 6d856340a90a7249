//! Error types for the highlighting engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned to the renderer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
	/// The requested line does not exist in the current document.
	#[error("line {line} is out of range (document has {line_count} lines)")]
	LineOutOfRange { line: usize, line_count: usize },
}

/// Failure reported by a classification provider.
///
/// Never surfaced to the renderer; the request is abandoned and the previous
/// highlighting stays on screen.
#[derive(Debug, Error)]
pub enum ClassifyError {
	/// The provider has no analysis for this document (closed, not loaded yet).
	#[error("document is not available for classification")]
	Unavailable,

	/// The analysis itself failed.
	#[error("classification failed: {0}")]
	Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClassifyError {
	pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self::Failed(error.into())
	}
}

/// Errors that can occur when loading highlighter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A color value could not be parsed.
	#[error("invalid color format: {0} (expected '#rrggbb')")]
	InvalidColor(String),

	/// A color override names a classification that does not exist.
	#[error("unknown token class: {0}")]
	UnknownTokenClass(String),

	/// A numeric option is outside its accepted range.
	#[error("invalid value for '{option}': {reason}")]
	InvalidValue { option: &'static str, reason: String },
}
