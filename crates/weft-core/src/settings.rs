//! Render settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML document,
//! then `WEFT_`-prefixed environment variables.
//!
//! ## Environment variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WEFT_MODE` | `mode` (`development` / `production`) |
//! | `WEFT_LANG` | `lang` |
//! | `WEFT_POOL_CAPACITY` | `pool_capacity` |
//! | `WEFT_CONTEXT_POOL_CAPACITY` | `context_pool_capacity` |
//! | `WEFT_CACHE_CAPACITY` | `cache_capacity` |
//! | `WEFT_MAX_COMPUTED_SOURCE_LEN` | `max_computed_source_len` |
//! | `WEFT_MAX_EVENT_SOURCE_LEN` | `max_event_source_len` |
//! | `WEFT_CSS_VALUE_MAX_LEN` | `css_value_max_len` |
//! | `WEFT_MINIFY` | `minify` |

use crate::css::DEFAULT_CSS_VALUE_MAX_LEN;
use crate::script::{DEFAULT_MAX_COMPUTED_SOURCE_LEN, DEFAULT_MAX_EVENT_SOURCE_LEN, ScriptLimits};
use serde::{Deserialize, Serialize};
use std::env;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "WEFT_";

/// Runtime mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	/// Validation failures are logged, output is not minified by default.
	#[default]
	Development,
	/// Validation failures are silent, output is minified by default.
	Production,
}

impl std::str::FromStr for Mode {
	type Err = SettingsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"production" | "prod" => Ok(Self::Production),
			other => Err(SettingsError::InvalidValue {
				key: "mode".to_string(),
				reason: format!("unknown mode '{}'", other),
			}),
		}
	}
}

/// Errors raised while loading or validating settings.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// The TOML document could not be parsed.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field holds a value outside its accepted range.
	#[error("Invalid value for '{key}': {reason}")]
	InvalidValue {
		/// Field name.
		key: String,
		/// Why the value was rejected.
		reason: String,
	},
}

/// Settings consumed by the page runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
	/// Runtime mode.
	pub mode: Mode,
	/// Value of the `lang` attribute on `<html>`.
	pub lang: String,
	/// Maximum number of free nodes kept by the node pool.
	pub pool_capacity: usize,
	/// Maximum number of free render contexts kept by the context pool.
	pub context_pool_capacity: usize,
	/// Maximum number of rendered pages kept by the response cache.
	pub cache_capacity: usize,
	/// Maximum source length of computed scripts and binding templates.
	pub max_computed_source_len: usize,
	/// Maximum source length of event handlers.
	pub max_event_source_len: usize,
	/// Maximum length of a sanitized CSS value.
	pub css_value_max_len: usize,
	/// Explicit minification switch; `None` follows the mode.
	pub minify: Option<bool>,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			mode: Mode::Development,
			lang: "en".to_string(),
			pool_capacity: 1024,
			context_pool_capacity: 64,
			cache_capacity: 100,
			max_computed_source_len: DEFAULT_MAX_COMPUTED_SOURCE_LEN,
			max_event_source_len: DEFAULT_MAX_EVENT_SOURCE_LEN,
			css_value_max_len: DEFAULT_CSS_VALUE_MAX_LEN,
			minify: None,
		}
	}
}

impl RenderSettings {
	/// Creates default development settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates default production settings.
	pub fn production() -> Self {
		Self {
			mode: Mode::Production,
			..Self::default()
		}
	}

	/// Sets the mode.
	pub fn with_mode(mut self, mode: Mode) -> Self {
		self.mode = mode;
		self
	}

	/// Sets the document language.
	pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
		self.lang = lang.into();
		self
	}

	/// Sets the response cache capacity.
	pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
		self.cache_capacity = capacity;
		self
	}

	/// Sets the node pool capacity.
	pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
		self.pool_capacity = capacity;
		self
	}

	/// Forces minification on or off regardless of mode.
	pub fn with_minify(mut self, minify: bool) -> Self {
		self.minify = Some(minify);
		self
	}

	/// Returns true in production mode.
	pub fn is_production(&self) -> bool {
		self.mode == Mode::Production
	}

	/// Returns whether rendered documents are minified.
	pub fn should_minify(&self) -> bool {
		self.minify.unwrap_or(self.is_production())
	}

	/// Returns the client script limits.
	pub fn script_limits(&self) -> ScriptLimits {
		ScriptLimits {
			max_computed_len: self.max_computed_source_len,
			max_event_len: self.max_event_source_len,
		}
	}

	/// Parses settings from a TOML document; missing keys use defaults.
	///
	/// # Examples
	///
	/// ```
	/// use weft_core::settings::{Mode, RenderSettings};
	///
	/// let settings = RenderSettings::from_toml_str(r#"
	///     mode = "production"
	///     cache_capacity = 10
	/// "#).unwrap();
	///
	/// assert_eq!(settings.mode, Mode::Production);
	/// assert_eq!(settings.cache_capacity, 10);
	/// assert_eq!(settings.lang, "en");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Loads defaults overridden by `WEFT_`-prefixed environment variables.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::default().merge_env(ENV_PREFIX)
	}

	/// Overrides fields from environment variables using `prefix`.
	pub fn merge_env(mut self, prefix: &str) -> Result<Self, SettingsError> {
		let var = |key: &str| env::var(format!("{}{}", prefix, key)).ok();

		if let Some(mode) = var("MODE") {
			self.mode = mode.parse()?;
		}
		if let Some(lang) = var("LANG") {
			self.lang = lang;
		}
		if let Some(value) = var("POOL_CAPACITY") {
			self.pool_capacity = parse_usize("pool_capacity", &value)?;
		}
		if let Some(value) = var("CONTEXT_POOL_CAPACITY") {
			self.context_pool_capacity = parse_usize("context_pool_capacity", &value)?;
		}
		if let Some(value) = var("CACHE_CAPACITY") {
			self.cache_capacity = parse_usize("cache_capacity", &value)?;
		}
		if let Some(value) = var("MAX_COMPUTED_SOURCE_LEN") {
			self.max_computed_source_len = parse_usize("max_computed_source_len", &value)?;
		}
		if let Some(value) = var("MAX_EVENT_SOURCE_LEN") {
			self.max_event_source_len = parse_usize("max_event_source_len", &value)?;
		}
		if let Some(value) = var("CSS_VALUE_MAX_LEN") {
			self.css_value_max_len = parse_usize("css_value_max_len", &value)?;
		}
		if let Some(value) = var("MINIFY") {
			self.minify = Some(parse_bool("minify", &value)?);
		}

		self.validate()?;
		Ok(self)
	}

	/// Checks cross-field constraints.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.lang.trim().is_empty() {
			return Err(SettingsError::InvalidValue {
				key: "lang".to_string(),
				reason: "must not be empty".to_string(),
			});
		}
		for (key, value) in [
			("max_computed_source_len", self.max_computed_source_len),
			("max_event_source_len", self.max_event_source_len),
			("css_value_max_len", self.css_value_max_len),
		] {
			if value == 0 {
				return Err(SettingsError::InvalidValue {
					key: key.to_string(),
					reason: "must be greater than zero".to_string(),
				});
			}
		}
		Ok(())
	}
}

/// Parses a boolean setting (`true/false/1/0/yes/no/on/off`).
pub fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(SettingsError::InvalidValue {
			key: key.to_string(),
			reason: format!("expected a boolean, got {} characters", value.len()),
		}),
	}
}

fn parse_usize(key: &str, value: &str) -> Result<usize, SettingsError> {
	value
		.trim()
		.parse::<usize>()
		.map_err(|e| SettingsError::InvalidValue {
			key: key.to_string(),
			reason: e.to_string(),
		})
}
