//! Render context.
//!
//! Side-channel data collected while a tree is serialized: scoped styles and
//! everything the hydration script needs.

use crate::pool::Reusable;
use std::collections::HashSet;

/// A captured state value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry {
	/// Element id, also the key in the client state map.
	pub id: String,
	/// Value at render time.
	pub value: serde_json::Value,
	/// Tag name; decides whether hydration sets `value` or `textContent`.
	pub tag: String,
}

/// A computed script attached to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedEntry {
	/// Element id.
	pub id: String,
	/// Validated source.
	pub source: String,
}

/// A reactive text binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
	/// Element id.
	pub node_id: String,
	/// Watched state key.
	pub state_key: String,
	/// Template source.
	pub source: String,
}

/// An event listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
	/// DOM event name.
	pub event: String,
	/// Element id.
	pub node_id: String,
	/// Target id for placeholder substitution.
	pub target_id: Option<String>,
	/// Listener source, placeholders not yet substituted.
	pub source: String,
}

/// Data collected during one render.
#[derive(Debug, Default)]
pub struct RenderContext {
	styles: Vec<String>,
	seen_styles: HashSet<String>,
	/// Captured states in document order.
	pub states: Vec<StateEntry>,
	/// Computed scripts in document order.
	pub computed: Vec<ComputedEntry>,
	/// State bindings in document order.
	pub state_bindings: Vec<BindingEntry>,
	/// Event listeners; a node's listeners follow its descendants'.
	pub events: Vec<EventEntry>,
}

impl Reusable for RenderContext {
	fn reset(&mut self) {
		self.styles.clear();
		self.seen_styles.clear();
		self.states.clear();
		self.computed.clear();
		self.state_bindings.clear();
		self.events.clear();
	}
}

impl RenderContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds every `.class{rules}` rule of `fragment` not collected yet.
	pub fn push_style(&mut self, fragment: &str) {
		// Sanitized values cannot contain braces, so every rule ends at '}'
		for rule in fragment.split_inclusive('}') {
			let rule = rule.trim();
			if rule.is_empty() || self.seen_styles.contains(rule) {
				continue;
			}
			self.seen_styles.insert(rule.to_string());
			self.styles.push(rule.to_string());
		}
	}

	/// Collected rules in first-seen order.
	pub fn styles(&self) -> &[String] {
		&self.styles
	}

	/// Returns true if nothing needs hydration.
	pub fn is_static(&self) -> bool {
		self.states.is_empty()
			&& self.computed.is_empty()
			&& self.state_bindings.is_empty()
			&& self.events.is_empty()
	}
}
