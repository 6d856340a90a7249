//! Token classifications and their colors.

use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

/// Semantic classification of a span, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenClass {
	Text,
	Keyword,
	ControlKeyword,
	PreprocessorKeyword,
	Identifier,
	Operator,
	Punctuation,
	Number,
	String,
	VerbatimString,
	Comment,
	XmlDocComment,
	ExcludedCode,
	Namespace,
	Class,
	Struct,
	Interface,
	Enum,
	Delegate,
	TypeParameter,
	Method,
	ExtensionMethod,
	Property,
	Event,
	Field,
	Constant,
	EnumMember,
	Local,
	Parameter,
	Label,
	StaticSymbol,
}

impl TokenClass {
	pub const ALL: [Self; 31] = [
		Self::Text,
		Self::Keyword,
		Self::ControlKeyword,
		Self::PreprocessorKeyword,
		Self::Identifier,
		Self::Operator,
		Self::Punctuation,
		Self::Number,
		Self::String,
		Self::VerbatimString,
		Self::Comment,
		Self::XmlDocComment,
		Self::ExcludedCode,
		Self::Namespace,
		Self::Class,
		Self::Struct,
		Self::Interface,
		Self::Enum,
		Self::Delegate,
		Self::TypeParameter,
		Self::Method,
		Self::ExtensionMethod,
		Self::Property,
		Self::Event,
		Self::Field,
		Self::Constant,
		Self::EnumMember,
		Self::Local,
		Self::Parameter,
		Self::Label,
		Self::StaticSymbol,
	];

	pub const COUNT: usize = Self::ALL.len();

	/// Classification name as used by analysis services and config files.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Keyword => "keyword",
			Self::ControlKeyword => "keyword - control",
			Self::PreprocessorKeyword => "preprocessor keyword",
			Self::Identifier => "identifier",
			Self::Operator => "operator",
			Self::Punctuation => "punctuation",
			Self::Number => "number",
			Self::String => "string",
			Self::VerbatimString => "string - verbatim",
			Self::Comment => "comment",
			Self::XmlDocComment => "xml doc comment",
			Self::ExcludedCode => "excluded code",
			Self::Namespace => "namespace name",
			Self::Class => "class name",
			Self::Struct => "struct name",
			Self::Interface => "interface name",
			Self::Enum => "enum name",
			Self::Delegate => "delegate name",
			Self::TypeParameter => "type parameter name",
			Self::Method => "method name",
			Self::ExtensionMethod => "extension method name",
			Self::Property => "property name",
			Self::Event => "event name",
			Self::Field => "field name",
			Self::Constant => "constant name",
			Self::EnumMember => "enum member name",
			Self::Local => "local name",
			Self::Parameter => "parameter name",
			Self::Label => "label name",
			Self::StaticSymbol => "static symbol",
		}
	}

	/// Parses a classification name. Config keys may use `_` in place of spaces.
	pub fn from_name(name: &str) -> Option<Self> {
		let name = name.trim();
		Self::ALL
			.into_iter()
			.find(|class| class.as_str() == name || config_key(class.as_str()) == name)
	}

	const fn index(self) -> usize {
		self as usize
	}
}

impl fmt::Display for TokenClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

fn config_key(name: &str) -> String {
	name.replace(" - ", "_").replace(' ', "_")
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#rrggbb`.
	pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidColor(s.to_string());
		let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
		if hex.len() != 6 || !hex.is_ascii() {
			return Err(invalid());
		}
		let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
		Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

/// Maps token classes to renderable colors. Pure and synchronous.
pub trait ColorResolver: Send + Sync {
	/// Color for text without semantic classification.
	fn default_color(&self) -> Color;

	fn resolve(&self, class: TokenClass) -> Color;
}

/// Static lookup table from [`TokenClass`] to [`Color`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationColors {
	default: Color,
	table: [Color; TokenClass::COUNT],
}

impl Default for ClassificationColors {
	/// Dark palette.
	fn default() -> Self {
		let text = Color::rgb(0xd4, 0xd4, 0xd4);
		let mut colors = Self {
			default: text,
			table: [text; TokenClass::COUNT],
		};
		let keyword = Color::rgb(0x56, 0x9c, 0xd6);
		let type_name = Color::rgb(0x4e, 0xc9, 0xb0);
		let member = Color::rgb(0x9c, 0xdc, 0xfe);
		for (class, color) in [
			(TokenClass::Keyword, keyword),
			(TokenClass::ControlKeyword, Color::rgb(0xc5, 0x86, 0xc0)),
			(TokenClass::PreprocessorKeyword, Color::rgb(0x9b, 0x9b, 0x9b)),
			(TokenClass::Number, Color::rgb(0xb5, 0xce, 0xa8)),
			(TokenClass::String, Color::rgb(0xce, 0x91, 0x78)),
			(TokenClass::VerbatimString, Color::rgb(0xce, 0x91, 0x78)),
			(TokenClass::Comment, Color::rgb(0x6a, 0x99, 0x55)),
			(TokenClass::XmlDocComment, Color::rgb(0x60, 0x8b, 0x4e)),
			(TokenClass::ExcludedCode, Color::rgb(0x80, 0x80, 0x80)),
			(TokenClass::Class, type_name),
			(TokenClass::Struct, type_name),
			(TokenClass::Interface, Color::rgb(0xb8, 0xd7, 0xa3)),
			(TokenClass::Enum, Color::rgb(0xb8, 0xd7, 0xa3)),
			(TokenClass::Delegate, type_name),
			(TokenClass::TypeParameter, Color::rgb(0xb8, 0xd7, 0xa3)),
			(TokenClass::Method, Color::rgb(0xdc, 0xdc, 0xaa)),
			(TokenClass::ExtensionMethod, Color::rgb(0xdc, 0xdc, 0xaa)),
			(TokenClass::Property, member),
			(TokenClass::Event, member),
			(TokenClass::Field, member),
			(TokenClass::Constant, Color::rgb(0x4f, 0xc1, 0xff)),
			(TokenClass::EnumMember, Color::rgb(0x4f, 0xc1, 0xff)),
			(TokenClass::Local, member),
			(TokenClass::Parameter, member),
			(TokenClass::Label, Color::rgb(0xc8, 0xc8, 0xc8)),
		] {
			colors.set(class, color);
		}
		colors
	}
}

impl ClassificationColors {
	pub fn set(&mut self, class: TokenClass, color: Color) {
		self.table[class.index()] = color;
	}

	pub fn with(mut self, class: TokenClass, color: Color) -> Self {
		self.set(class, color);
		self
	}

	pub fn set_default(&mut self, color: Color) {
		self.default = color;
	}

	/// Builds the default palette with config overrides applied.
	///
	/// The special key `default` sets the color for unclassified text.
	pub fn from_overrides(overrides: &HashMap<String, String>) -> Result<Self, ConfigError> {
		let mut colors = Self::default();
		for (name, value) in overrides {
			let color = Color::from_hex(value)?;
			if name == "default" {
				colors.set_default(color);
				continue;
			}
			let class = TokenClass::from_name(name).ok_or_else(|| ConfigError::UnknownTokenClass(name.clone()))?;
			colors.set(class, color);
		}
		Ok(colors)
	}
}

impl ColorResolver for ClassificationColors {
	fn default_color(&self) -> Color {
		self.default
	}

	fn resolve(&self, class: TokenClass) -> Color {
		self.table[class.index()]
	}
}
