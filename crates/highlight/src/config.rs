//! Highlighter configuration.
//!
//! ```toml
//! cache_size = 512
//! debounce_ms = 100
//! use_cache = true
//!
//! [colors]
//! keyword = "#569cd6"
//! class_name = "#4ec9b0"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::DEFAULT_CACHE_SIZE;
use crate::colors::ClassificationColors;
use crate::error::ConfigError;
use crate::pipeline::DEFAULT_DEBOUNCE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
	/// Maximum number of cached lines before the oldest half is evicted.
	pub cache_size: usize,
	/// Quiet period before a line's latest request is classified.
	pub debounce_ms: u64,
	/// Disable for documents that are rendered once (previews, search
	/// results): nothing is cached and every call recomputes.
	pub use_cache: bool,
	/// Token class name (or `default`) to `#rrggbb`.
	pub colors: HashMap<String, String>,
}

impl Default for HighlightConfig {
	fn default() -> Self {
		Self {
			cache_size: DEFAULT_CACHE_SIZE,
			debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
			use_cache: true,
			colors: HashMap::new(),
		}
	}
}

impl HighlightConfig {
	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), cache_size = config.cache_size, debounce_ms = config.debounce_ms, "highlight.config.loaded");
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.cache_size < 2 {
			return Err(ConfigError::InvalidValue {
				option: "cache_size",
				reason: format!("must be at least 2, got {}", self.cache_size),
			});
		}
		self.color_table().map(|_| ())
	}

	/// Default palette with this config's overrides applied.
	pub fn color_table(&self) -> Result<ClassificationColors, ConfigError> {
		ClassificationColors::from_overrides(&self.colors)
	}
}
