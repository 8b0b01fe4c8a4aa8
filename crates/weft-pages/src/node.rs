//! Markup nodes.
//!
//! A [`Node`] is a mutable element builder. Nodes are created by a
//! [`Document`](crate::Document), which hands out pooled instances bound to
//! its id generator, settings and state store.
//!
//! Builder methods consume and return the node so calls chain. They never
//! fail: names that normalize to nothing and client scripts that fail
//! validation are skipped, with a warning in development mode.

use crate::document::DocumentScope;
use crate::ids::IdGenerator;
use crate::logging::dev_warn;
use crate::pool::Reusable;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use weft_core::css::scope_declarations;
use weft_core::escape::to_kebab_case;
use weft_core::script::{ClientScript, ScriptKind, ScriptLimits, validate_source};
use weft_core::settings::RenderSettings;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
	"track", "wbr",
];

/// Returns true if `tag` is a void element.
pub fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}

/// A child of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	/// A nested element.
	Element(Node),
	/// Plain text, escaped when rendered.
	Text(String),
	/// Trusted raw HTML emitted verbatim.
	Markup(String),
}

/// Reactive text binding: the node's text follows a client state key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBinding {
	/// Key in the client state map.
	pub state_key: String,
	/// Function of the state value returning the text to display.
	pub template: ClientScript,
}

/// An event listener captured for hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
	/// DOM event name.
	pub event: String,
	/// Id of the element the listener is attached to.
	pub node_id: String,
	/// Id substituted for the target placeholder, when bound with `bind_state`.
	pub target_id: Option<String>,
	/// Listener source.
	pub handler: ClientScript,
}

/// One markup element.
#[derive(Clone, Default)]
pub struct Node {
	tag: String,
	attributes: IndexMap<String, String>,
	children: Vec<Child>,
	style_fragment: String,
	state: Option<serde_json::Value>,
	computed: Option<ClientScript>,
	state_bindings: Vec<StateBinding>,
	events: Vec<EventBinding>,
	scope: Option<Arc<DocumentScope>>,
}

impl std::fmt::Debug for Node {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Node")
			.field("tag", &self.tag)
			.field("attributes", &self.attributes)
			.field("children", &self.children)
			.field("style_fragment", &self.style_fragment)
			.field("state", &self.state)
			.field("computed", &self.computed)
			.field("state_bindings", &self.state_bindings)
			.field("events", &self.events)
			.finish()
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		self.tag == other.tag
			&& self.attributes == other.attributes
			&& self.children == other.children
			&& self.style_fragment == other.style_fragment
			&& self.state == other.state
			&& self.computed == other.computed
			&& self.state_bindings == other.state_bindings
			&& self.events == other.events
	}
}

impl Reusable for Node {
	fn reset(&mut self) {
		self.tag.clear();
		self.attributes.clear();
		self.children.clear();
		self.style_fragment.clear();
		self.state = None;
		self.computed = None;
		self.state_bindings.clear();
		self.events.clear();
		self.scope = None;
	}
}

impl Node {
	pub(crate) fn bind(&mut self, tag: String, scope: Arc<DocumentScope>) {
		self.tag = tag;
		self.scope = Some(scope);
	}

	fn settings(&self) -> Option<&RenderSettings> {
		self.scope.as_deref().map(|scope| scope.settings.as_ref())
	}

	fn is_production(&self) -> bool {
		self.settings().is_some_and(RenderSettings::is_production)
	}

	fn limits(&self) -> ScriptLimits {
		self.settings()
			.map(RenderSettings::script_limits)
			.unwrap_or_default()
	}

	fn css_value_max_len(&self) -> usize {
		self.settings()
			.map_or(weft_core::css::DEFAULT_CSS_VALUE_MAX_LEN, |s| s.css_value_max_len)
	}

	/// Returns the id, assigning a generated one first if absent.
	pub(crate) fn ensure_id(&mut self) -> String {
		if let Some(id) = self.attributes.get("id")
			&& !id.is_empty()
		{
			return id.clone();
		}

		let id = match &self.scope {
			Some(scope) => scope.ids.next_id(),
			None => IdGenerator::new().next_id(),
		};
		self.attributes.insert("id".to_string(), id.clone());
		id
	}

	fn accepts(&self, source: &str, kind: ScriptKind) -> bool {
		match validate_source(source, kind, &self.limits()) {
			Ok(()) => true,
			Err(error) => {
				dev_warn!(self, tag = %self.tag, %error, "client script rejected");
				false
			}
		}
	}

	/// Sets an attribute under its kebab-normalized name.
	///
	/// An existing value is replaced in place, keeping its position.
	pub fn attribute(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		let name = to_kebab_case(name.as_ref());
		if name.is_empty() {
			dev_warn!(self, tag = %self.tag, "attribute name normalized to nothing");
			return self;
		}
		self.attributes.insert(name, value.into());
		self
	}

	/// Sets the id attribute.
	///
	/// Captured state already recorded under the previous id moves to the new
	/// one.
	pub fn id(mut self, value: impl Into<String>) -> Self {
		let value = value.into();
		let previous = self.attributes.insert("id".to_string(), value.clone());
		if self.state.is_some()
			&& let Some(previous) = previous
			&& previous != value
			&& let Some(scope) = &self.scope
		{
			let mut states = scope.states.lock();
			if let Some((index, _, state)) = states.shift_remove_full(&previous) {
				states.shift_insert(index, value, state);
			}
		}
		self
	}

	/// Assigns a generated id unless one is already set.
	pub fn auto_id(mut self) -> Self {
		self.ensure_id();
		self
	}

	/// Appends escaped text. `None` appends nothing.
	///
	/// # Examples
	///
	/// ```
	/// use weft_pages::{DocumentOptions, PageRuntime};
	/// use weft_core::RenderSettings;
	///
	/// let runtime = PageRuntime::new(RenderSettings::default());
	/// let doc = runtime.create_document(DocumentOptions::default());
	/// let node = doc.create("div").unwrap().text("<b>hi</b>").text(None::<&str>);
	///
	/// assert_eq!(node.to_html(), "<div>&lt;b&gt;hi&lt;/b&gt;</div>");
	/// ```
	pub fn text(mut self, content: impl IntoText) -> Self {
		if let Some(text) = content.into_text() {
			self.children.push(Child::Text(text));
		}
		self
	}

	/// Appends a child node unchanged, or any text value escaped.
	pub fn append(mut self, child: impl IntoChild) -> Self {
		if let Some(child) = child.into_child() {
			self.children.push(child);
		}
		self
	}

	/// Appends several children.
	pub fn children<C: IntoChild>(mut self, children: impl IntoIterator<Item = C>) -> Self {
		self.children
			.extend(children.into_iter().filter_map(IntoChild::into_child));
		self
	}

	/// Appends raw HTML without escaping.
	///
	/// Only for trusted input: the string is emitted exactly as given.
	pub fn append_unsafe(mut self, html: impl Into<String>) -> Self {
		self.children.push(Child::Markup(html.into()));
		self
	}

	/// Applies a scoped style.
	///
	/// Declarations are kebab-normalized and sanitized, hashed into a
	/// deterministic class name that is added to `class`, and the matching
	/// `.class{rules}` rule is recorded for the document's style block.
	/// Identical declarations always produce the identical class.
	pub fn css<I, K, V>(mut self, declarations: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let Some(style) = scope_declarations(declarations, self.css_value_max_len()) else {
			return self;
		};

		self.add_class(&style.class);
		let fragment = style.fragment();
		if !self.style_fragment.contains(&fragment) {
			self.style_fragment.push_str(&fragment);
		}
		self
	}

	fn add_class(&mut self, class: &str) {
		match self.attributes.get_mut("class") {
			Some(existing) => {
				if !existing.split_whitespace().any(|c| c == class) {
					if !existing.trim().is_empty() {
						existing.push(' ');
					}
					existing.push_str(class);
				}
			}
			None => {
				self.attributes
					.insert("class".to_string(), class.to_string());
			}
		}
	}

	/// Captures a state value for hydration.
	///
	/// The node gets an id if it has none, and the value is recorded under
	/// that id in the document's state store. A value that cannot be
	/// serialized is logged and ignored.
	pub fn state(mut self, value: impl Serialize) -> Self {
		match serde_json::to_value(value) {
			Ok(value) => self.set_state_value(value),
			Err(error) => tracing::warn!(tag = %self.tag, %error, "state value is not serializable"),
		}
		self
	}

	pub(crate) fn set_state_value(&mut self, value: serde_json::Value) {
		let id = self.ensure_id();
		if let Some(scope) = &self.scope {
			scope.states.lock().insert(id, value.clone());
		}
		self.state = Some(value);
	}

	/// Captures a computed value: a function of the client state map whose
	/// result becomes the node's text.
	pub fn computed(mut self, script: ClientScript) -> Self {
		if !self.accepts(script.source(), ScriptKind::Computed) {
			return self;
		}
		self.ensure_id();
		self.computed = Some(ClientScript::computed(script.source()));
		self
	}

	/// Binds the node's text to a client state key through `template`.
	pub fn bind_text(mut self, state_key: impl Into<String>, template: ClientScript) -> Self {
		let state_key = state_key.into();
		if state_key.trim().is_empty() {
			dev_warn!(self, tag = %self.tag, "state binding without a key");
			return self;
		}
		if !self.accepts(template.source(), ScriptKind::Computed) {
			return self;
		}
		self.ensure_id();
		self.state_bindings.push(StateBinding {
			state_key,
			template: ClientScript::computed(template.source()),
		});
		self
	}

	/// Attaches an event listener.
	pub fn on(mut self, event: impl AsRef<str>, handler: ClientScript) -> Self {
		self.push_event(event.as_ref(), None, handler);
		self
	}

	/// Attaches an event listener that refers to `target`.
	///
	/// `target` gets an id if it has none. Every occurrence of
	/// [`TARGET_ID_PLACEHOLDER`](weft_core::TARGET_ID_PLACEHOLDER) in the
	/// handler source is replaced by that id in the hydration script.
	pub fn bind_state(mut self, target: &mut Node, event: impl AsRef<str>, handler: ClientScript) -> Self {
		let target_id = target.ensure_id();
		self.push_event(event.as_ref(), Some(target_id), handler);
		self
	}

	fn push_event(&mut self, event: &str, target_id: Option<String>, handler: ClientScript) {
		let event = event.trim().to_ascii_lowercase();
		let valid_name = !event.is_empty()
			&& event
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
		if !valid_name {
			dev_warn!(self, tag = %self.tag, event = %event, "invalid event name");
			return;
		}
		if !self.accepts(handler.source(), ScriptKind::Event) {
			return;
		}

		let node_id = self.ensure_id();
		self.events.push(EventBinding {
			event,
			node_id,
			target_id,
			handler: ClientScript::event(handler.source()),
		});
	}

	/// Normalized tag name.
	pub fn tag_name(&self) -> &str {
		&self.tag
	}

	/// Attributes in insertion order.
	pub fn attrs(&self) -> &IndexMap<String, String> {
		&self.attributes
	}

	/// Returns an attribute value.
	pub fn get_attribute(&self, name: &str) -> Option<&str> {
		self.attributes.get(name).map(String::as_str)
	}

	/// The id attribute, if set.
	pub fn element_id(&self) -> Option<&str> {
		self.get_attribute("id").filter(|id| !id.is_empty())
	}

	/// Children in rendering order.
	pub fn child_nodes(&self) -> &[Child] {
		&self.children
	}

	pub(crate) fn take_children(&mut self) -> Vec<Child> {
		std::mem::take(&mut self.children)
	}

	/// Accumulated scoped CSS rules.
	pub fn style_fragment(&self) -> &str {
		&self.style_fragment
	}

	pub(crate) fn set_style_fragment(&mut self, fragment: String) {
		self.style_fragment = fragment;
	}

	/// Captured state value.
	pub fn captured_state(&self) -> Option<&serde_json::Value> {
		self.state.as_ref()
	}

	/// Captured computed script.
	pub fn computed_script(&self) -> Option<&ClientScript> {
		self.computed.as_ref()
	}

	/// Reactive text bindings.
	pub fn bindings(&self) -> &[StateBinding] {
		&self.state_bindings
	}

	/// Captured event listeners.
	pub fn event_bindings(&self) -> &[EventBinding] {
		&self.events
	}

	/// Returns true if the node or any descendant needs hydration.
	pub fn needs_hydration(&self) -> bool {
		self.state.is_some()
			|| self.computed.is_some()
			|| !self.state_bindings.is_empty()
			|| !self.events.is_empty()
			|| self.children.iter().any(|child| match child {
				Child::Element(node) => node.needs_hydration(),
				Child::Text(_) | Child::Markup(_) => false,
			})
	}

	/// Renders this node alone, without a document envelope.
	pub fn to_html(&self) -> String {
		let settings = self.settings().cloned().unwrap_or_default();
		crate::ssr::render_to_string(self, &settings)
	}
}

/// Values that [`Node::text`] accepts.
pub trait IntoText {
	/// Returns the text, or `None` to append nothing.
	fn into_text(self) -> Option<String>;
}

impl IntoText for String {
	fn into_text(self) -> Option<String> {
		Some(self)
	}
}

impl IntoText for &String {
	fn into_text(self) -> Option<String> {
		Some(self.clone())
	}
}

impl IntoText for &str {
	fn into_text(self) -> Option<String> {
		Some(self.to_string())
	}
}

impl IntoText for char {
	fn into_text(self) -> Option<String> {
		Some(self.to_string())
	}
}

impl<T: IntoText> IntoText for Option<T> {
	fn into_text(self) -> Option<String> {
		self.and_then(IntoText::into_text)
	}
}

macro_rules! impl_into_text_for_display {
	($($ty:ty),* $(,)?) => {
		$(
			impl IntoText for $ty {
				fn into_text(self) -> Option<String> {
					Some(self.to_string())
				}
			}
		)*
	};
}

impl_into_text_for_display!(
	bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// Values that [`Node::append`] accepts.
pub trait IntoChild {
	/// Converts the value into a child, or `None` to append nothing.
	fn into_child(self) -> Option<Child>;
}

impl IntoChild for Node {
	fn into_child(self) -> Option<Child> {
		Some(Child::Element(self))
	}
}

impl IntoChild for Child {
	fn into_child(self) -> Option<Child> {
		Some(self)
	}
}

impl<T: IntoText> IntoChild for T {
	fn into_child(self) -> Option<Child> {
		self.into_text().map(Child::Text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{DocumentOptions, PageRuntime};
	use rstest::{fixture, rstest};
	use weft_core::TARGET_ID_PLACEHOLDER;

	#[fixture]
	fn runtime() -> Arc<PageRuntime> {
		PageRuntime::new(RenderSettings::default())
	}

	#[rstest]
	fn test_attribute_normalizes_and_replaces_in_place(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("div")
			.unwrap()
			.attribute("dataUserId", "1")
			.attribute("title", "t")
			.attribute("data_user_id", "2");

		let names: Vec<_> = node.attrs().keys().cloned().collect();
		assert_eq!(names, vec!["data-user-id", "title"]);
		assert_eq!(node.get_attribute("data-user-id"), Some("2"));
	}

	#[rstest]
	fn test_attribute_with_unusable_name_is_skipped(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("div").unwrap().attribute("\"<>", "x");
		assert!(node.attrs().is_empty());
	}

	#[rstest]
	fn test_append_escapes_text_and_keeps_nodes(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let child = doc.create("span").unwrap().text("x");
		let node = doc
			.create("p")
			.unwrap()
			.append("a<b")
			.append(42)
			.append(child)
			.append(None::<String>)
			.append_unsafe("<br>");

		assert_eq!(node.to_html(), "<p>a&lt;b42<span>x</span><br></p>");
	}

	#[rstest]
	fn test_css_same_declarations_same_class(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let a = doc.create("div").unwrap().css([("color", "red")]);
		let b = doc.create("span").unwrap().css([("color", "red")]);

		assert_eq!(a.get_attribute("class"), b.get_attribute("class"));
		let class = a.get_attribute("class").unwrap();
		assert_eq!(a.style_fragment(), format!(".{}{{color:red;}}", class));
	}

	#[rstest]
	fn test_css_does_not_duplicate_class(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("div")
			.unwrap()
			.attribute("class", "card")
			.css([("margin", "0")])
			.css([("margin", "0")]);

		let classes: Vec<_> = node.get_attribute("class").unwrap().split(' ').collect();
		assert_eq!(classes.len(), 2);
		assert_eq!(classes[0], "card");
		assert_eq!(node.style_fragment().matches('{').count(), 1);
	}

	#[rstest]
	fn test_css_with_only_invalid_values_changes_nothing(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("div").unwrap().css([("color", "{;}")]);
		assert!(node.get_attribute("class").is_none());
		assert!(node.style_fragment().is_empty());
	}

	#[rstest]
	fn test_state_assigns_id_and_records_in_document(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("span").unwrap().state(5);

		let id = node.element_id().unwrap().to_string();
		assert_eq!(node.captured_state(), Some(&serde_json::json!(5)));
		assert_eq!(doc.states().get(&id), Some(&serde_json::json!(5)));
	}

	#[rstest]
	fn test_state_keeps_explicit_id(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("span").unwrap().id("counter").state("x");
		assert_eq!(node.element_id(), Some("counter"));
		assert!(doc.states().contains_key("counter"));
	}

	#[rstest]
	fn test_renaming_id_moves_captured_state(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let first = doc.create("span").unwrap().state(1).id("later");
		let second = doc.create("span").unwrap().id("other").state(2);

		let states = doc.states();
		let keys: Vec<_> = states.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["later", "other"]);
		assert_eq!(states.get("later"), Some(&serde_json::json!(1)));
		assert_eq!(first.element_id(), Some("later"));
		assert_eq!(second.element_id(), Some("other"));
	}

	#[rstest]
	fn test_text_is_stored_raw_and_escaped_on_render(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("p").unwrap().text("a<b");

		assert_eq!(node.child_nodes(), &[Child::Text("a<b".to_string())]);
		assert_eq!(node.to_html(), "<p>a&lt;b</p>");
	}

	#[rstest]
	fn test_rejected_scripts_leave_chain_intact(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("button")
			.unwrap()
			.computed(ClientScript::computed("() => '</script>'"))
			.on("click", ClientScript::event(""))
			.on("click", ClientScript::event("x".repeat(6_000)))
			.text("ok");

		assert!(node.computed_script().is_none());
		assert!(node.event_bindings().is_empty());
		assert!(node.element_id().is_none());
		assert_eq!(node.to_html(), "<button>ok</button>");
	}

	#[rstest]
	fn test_production_rejection_is_silent() {
		let runtime = PageRuntime::new(RenderSettings::production());
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("div")
			.unwrap()
			.computed(ClientScript::computed("<!-- x"));
		assert!(node.computed_script().is_none());
	}

	#[rstest]
	fn test_on_records_event_with_node_id(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("button")
			.unwrap()
			.on("Click", ClientScript::event("(e) => e.preventDefault()"));

		let events = node.event_bindings();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].event, "click");
		assert_eq!(Some(events[0].node_id.as_str()), node.element_id());
		assert!(events[0].target_id.is_none());
	}

	#[rstest]
	fn test_bind_state_records_target_id(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let mut panel = doc.create("div").unwrap();
		let source = format!(
			"() => {{ document.getElementById('{}').hidden = false; }}",
			TARGET_ID_PLACEHOLDER
		);
		let button = doc
			.create("button")
			.unwrap()
			.bind_state(&mut panel, "click", ClientScript::event(source));

		let panel_id = panel.element_id().unwrap();
		assert_eq!(button.event_bindings()[0].target_id.as_deref(), Some(panel_id));
	}

	#[rstest]
	fn test_bind_text_requires_key(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create("span")
			.unwrap()
			.bind_text("", ClientScript::computed("(v) => v"))
			.bind_text("count", ClientScript::computed("(v) => `n=${v}`"));

		assert_eq!(node.bindings().len(), 1);
		assert_eq!(node.bindings()[0].state_key, "count");
		assert!(node.element_id().is_some());
	}

	#[rstest]
	fn test_generated_ids_are_unique(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let a = doc.create("i").unwrap().auto_id();
		let b = doc.create("i").unwrap().auto_id();
		assert_ne!(a.element_id(), b.element_id());
	}

	#[rstest]
	fn test_needs_hydration_sees_descendants(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let leaf = doc.create("span").unwrap().state(1);
		let root = doc.create("div").unwrap().append(leaf);
		assert!(root.needs_hydration());
		assert!(!doc.create("div").unwrap().needs_hydration());
	}

	#[rstest]
	fn test_reset_clears_every_field(runtime: Arc<PageRuntime>) {
		let doc = runtime.create_document(DocumentOptions::default());
		let mut node = doc
			.create("div")
			.unwrap()
			.attribute("title", "x")
			.css([("color", "red")])
			.state(1)
			.on("click", ClientScript::event("() => 1"))
			.text("t");

		node.reset();
		assert_eq!(node, Node::default());
		assert!(node.scope.is_none());
	}
}
