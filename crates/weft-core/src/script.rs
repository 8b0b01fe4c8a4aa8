//! Client scripts captured for hydration.
//!
//! A client script is trusted page-author code reduced to its source text.
//! It runs later in the browser, so it is carried as data: the source, a
//! size category, and the substitution tokens it contains.
//!
//! Validation guards against pathological payloads and markup breakout when
//! the source is embedded verbatim inside a `<script>` element. It is not a
//! sandbox for untrusted input.

use serde::{Deserialize, Serialize};

/// Token replaced by the target element's id when a script is bound with
/// `bind_state`.
pub const TARGET_ID_PLACEHOLDER: &str = "__TARGET_ID__";

/// Default maximum source length for computed scripts and templates (bytes).
pub const DEFAULT_MAX_COMPUTED_SOURCE_LEN: usize = 10_000;

/// Default maximum source length for event handlers (bytes).
pub const DEFAULT_MAX_EVENT_SOURCE_LEN: usize = 5_000;

/// Sequences that may never appear in a client script (matched case-insensitively).
pub const DENIED_SEQUENCES: &[&str] = &["</script", "<!--"];

/// Size category of a client script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
	/// A value computed from client state (also used for binding templates).
	Computed,
	/// An event listener.
	Event,
}

impl ScriptKind {
	/// Returns the category name used in logs and errors.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Computed => "computed",
			Self::Event => "event",
		}
	}
}

impl std::fmt::Display for ScriptKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Errors produced by client script validation.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
	/// The source is empty or whitespace.
	#[error("{kind} script source is empty")]
	Empty {
		/// Category of the rejected script.
		kind: ScriptKind,
	},

	/// The source exceeds the category limit.
	#[error("{kind} script source is {len} bytes, exceeding the maximum of {max}")]
	TooLong {
		/// Category of the rejected script.
		kind: ScriptKind,
		/// Actual source length.
		len: usize,
		/// Configured maximum.
		max: usize,
	},

	/// The source contains a denied sequence.
	#[error("{kind} script source contains disallowed sequence '{sequence}'")]
	Disallowed {
		/// Category of the rejected script.
		kind: ScriptKind,
		/// The denied sequence that was found.
		sequence: &'static str,
	},
}

/// Per-category source length limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
	/// Maximum length of computed scripts and templates.
	pub max_computed_len: usize,
	/// Maximum length of event handlers.
	pub max_event_len: usize,
}

impl Default for ScriptLimits {
	fn default() -> Self {
		Self {
			max_computed_len: DEFAULT_MAX_COMPUTED_SOURCE_LEN,
			max_event_len: DEFAULT_MAX_EVENT_SOURCE_LEN,
		}
	}
}

impl ScriptLimits {
	/// Returns the limit for a category.
	pub fn limit_for(&self, kind: ScriptKind) -> usize {
		match kind {
			ScriptKind::Computed => self.max_computed_len,
			ScriptKind::Event => self.max_event_len,
		}
	}
}

/// Validates raw source text against the limits of its category.
///
/// # Examples
///
/// ```
/// use weft_core::script::{ScriptKind, ScriptLimits, validate_source};
///
/// let limits = ScriptLimits::default();
/// assert!(validate_source("(s) => s.count * 2", ScriptKind::Computed, &limits).is_ok());
/// assert!(validate_source("() => '</script>'", ScriptKind::Event, &limits).is_err());
/// ```
pub fn validate_source(
	source: &str,
	kind: ScriptKind,
	limits: &ScriptLimits,
) -> Result<(), ScriptError> {
	if source.trim().is_empty() {
		return Err(ScriptError::Empty { kind });
	}

	let max = limits.limit_for(kind);
	if source.len() > max {
		return Err(ScriptError::TooLong {
			kind,
			len: source.len(),
			max,
		});
	}

	let lowered = source.to_ascii_lowercase();
	if let Some(sequence) = DENIED_SEQUENCES
		.iter()
		.find(|sequence| lowered.contains(*sequence))
	{
		return Err(ScriptError::Disallowed {
			kind,
			sequence: *sequence,
		});
	}

	Ok(())
}

/// A client behaviour captured for execution in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientScript {
	source: String,
	kind: ScriptKind,
	substitutions: Vec<&'static str>,
}

impl ClientScript {
	/// Creates a script of the given category.
	pub fn new(kind: ScriptKind, source: impl Into<String>) -> Self {
		let source = source.into();
		let substitutions = if source.contains(TARGET_ID_PLACEHOLDER) {
			vec![TARGET_ID_PLACEHOLDER]
		} else {
			Vec::new()
		};
		Self {
			source,
			kind,
			substitutions,
		}
	}

	/// Creates a computed script: a function of the client state map.
	pub fn computed(source: impl Into<String>) -> Self {
		Self::new(ScriptKind::Computed, source)
	}

	/// Creates an event handler script.
	pub fn event(source: impl Into<String>) -> Self {
		Self::new(ScriptKind::Event, source)
	}

	/// Returns the source text.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// Returns the size category.
	pub fn kind(&self) -> ScriptKind {
		self.kind
	}

	/// Returns the substitution tokens present in the source.
	pub fn substitutions(&self) -> &[&'static str] {
		&self.substitutions
	}

	/// Validates the source against the limits of its category.
	pub fn validate(&self, limits: &ScriptLimits) -> Result<(), ScriptError> {
		validate_source(&self.source, self.kind, limits)
	}

	/// Returns the source with every known token replaced by `value`.
	pub fn substituted(&self, value: &str) -> String {
		self.substitutions
			.iter()
			.fold(self.source.clone(), |source, token| {
				source.replace(token, value)
			})
	}
}
