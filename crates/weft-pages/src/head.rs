//! Document head.
//!
//! Collects the title, meta/link/style/script declarations and document-level
//! CSS. Named rule sets are registered once per name; global rule sets are
//! emitted in registration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_core::css::{DEFAULT_CSS_VALUE_MAX_LEN, normalize_property, sanitize_value};
use weft_core::escape::{escape_attr, escape_html, escape_json_for_script, to_kebab_case};

/// A declaration inside `<head>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HeadTag {
	/// `<meta>` with the given attributes.
	Meta {
		/// Attributes in insertion order.
		attributes: IndexMap<String, String>,
	},
	/// `<link>` with the given attributes.
	Link {
		/// Attributes in insertion order.
		attributes: IndexMap<String, String>,
	},
	/// Inline `<style>` block.
	Style {
		/// CSS text.
		css: String,
	},
	/// `<script>`, external or inline.
	Script {
		/// External source URL.
		src: Option<String>,
		/// Inline body.
		body: Option<String>,
		/// Whether the script is a module.
		module: bool,
	},
}

impl HeadTag {
	/// Renders the declaration followed by a newline.
	pub fn to_html(&self) -> String {
		match self {
			Self::Meta { attributes } => format!("<meta{}>\n", render_attributes(attributes)),
			Self::Link { attributes } => format!("<link{}>\n", render_attributes(attributes)),
			Self::Style { css } => format!("<style>{}</style>\n", escape_json_for_script(css)),
			Self::Script { src, body, module } => {
				let mut html = String::from("<script");
				if *module {
					html.push_str(" type=\"module\"");
				}
				if let Some(src) = src {
					html.push_str(&format!(" src=\"{}\"", escape_attr(src)));
				}
				html.push('>');
				if let Some(body) = body {
					html.push_str(&escape_json_for_script(body));
				}
				html.push_str("</script>\n");
				html
			}
		}
	}
}

fn render_attributes(attributes: &IndexMap<String, String>) -> String {
	attributes
		.iter()
		.map(|(name, value)| format!(" {}=\"{}\"", name, escape_attr(value)))
		.collect()
}

/// A global CSS rule: selector plus declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRule {
	/// Selector text.
	pub selector: String,
	/// `prop:value;` declarations.
	pub rules: String,
}

/// The `<head>` section of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Head {
	title: Option<String>,
	tags: Vec<HeadTag>,
	named_css: IndexMap<String, String>,
	global_css: Vec<GlobalRule>,
}

impl Head {
	/// Creates an empty head.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the title.
	pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
		self.title = Some(title.into());
		self
	}

	/// Adds `<meta name=".." content="..">`.
	pub fn meta(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
		self.meta_attrs([("name", name.into()), ("content", content.into())])
	}

	/// Adds a `<meta>` with arbitrary attributes.
	pub fn meta_attrs<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>) -> &mut Self
	where
		K: AsRef<str>,
		V: Into<String>,
	{
		self.tags.push(HeadTag::Meta {
			attributes: collect_attributes(attributes),
		});
		self
	}

	/// Adds `<link rel=".." href="..">`.
	pub fn link(&mut self, rel: impl Into<String>, href: impl Into<String>) -> &mut Self {
		self.link_attrs([("rel", rel.into()), ("href", href.into())])
	}

	/// Adds a `<link>` with arbitrary attributes.
	pub fn link_attrs<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>) -> &mut Self
	where
		K: AsRef<str>,
		V: Into<String>,
	{
		self.tags.push(HeadTag::Link {
			attributes: collect_attributes(attributes),
		});
		self
	}

	/// Adds a stylesheet link.
	pub fn stylesheet(&mut self, href: impl Into<String>) -> &mut Self {
		self.link("stylesheet", href)
	}

	/// Adds an inline `<style>` block.
	pub fn style(&mut self, css: impl Into<String>) -> &mut Self {
		self.tags.push(HeadTag::Style { css: css.into() });
		self
	}

	/// Adds an external script.
	pub fn script(&mut self, src: impl Into<String>) -> &mut Self {
		self.tags.push(HeadTag::Script {
			src: Some(src.into()),
			body: None,
			module: false,
		});
		self
	}

	/// Adds an external ES module.
	pub fn module_script(&mut self, src: impl Into<String>) -> &mut Self {
		self.tags.push(HeadTag::Script {
			src: Some(src.into()),
			body: None,
			module: true,
		});
		self
	}

	/// Adds an inline script. `</` sequences are escaped.
	pub fn inline_script(&mut self, body: impl Into<String>) -> &mut Self {
		self.tags.push(HeadTag::Script {
			src: None,
			body: Some(body.into()),
			module: false,
		});
		self
	}

	/// Registers a named rule set. Later registrations under the same name
	/// are ignored.
	pub fn named_css(&mut self, name: impl Into<String>, css: impl Into<String>) -> &mut Self {
		let name = name.into();
		if self.named_css.contains_key(&name) {
			tracing::debug!(name = %name, "named CSS already registered");
			return self;
		}
		self.named_css.insert(name, css.into());
		self
	}

	/// Adds a global rule for `selector`. Declarations are normalized and
	/// sanitized like scoped styles.
	pub fn global_css<I, K, V>(&mut self, selector: impl AsRef<str>, declarations: I) -> &mut Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let selector: String = selector
			.as_ref()
			.chars()
			.filter(|c| !matches!(c, '{' | '}' | '<' | '>' | ';'))
			.collect();
		let selector = selector.trim();
		let rules = declaration_block(declarations);
		if selector.is_empty() || rules.is_empty() {
			return self;
		}
		self.global_css.push(GlobalRule {
			selector: selector.to_string(),
			rules,
		});
		self
	}

	/// The title, if set.
	pub fn get_title(&self) -> Option<&str> {
		self.title.as_deref()
	}

	/// Declarations in insertion order.
	pub fn tags(&self) -> &[HeadTag] {
		&self.tags
	}

	/// Named rule sets.
	pub fn named_rules(&self) -> &IndexMap<String, String> {
		&self.named_css
	}

	/// Global rules in registration order.
	pub fn global_rules(&self) -> &[GlobalRule] {
		&self.global_css
	}

	/// Returns true if nothing has been declared.
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.tags.is_empty()
			&& self.named_css.is_empty()
			&& self.global_css.is_empty()
	}

	/// Removes every declaration.
	pub fn clear(&mut self) {
		self.title = None;
		self.tags.clear();
		self.named_css.clear();
		self.global_css.clear();
	}

	/// Document-level CSS: global rules then named rule sets.
	pub fn css_text(&self) -> String {
		let mut css = String::new();
		for rule in &self.global_css {
			css.push_str(&rule.selector);
			css.push('{');
			css.push_str(&rule.rules);
			css.push('}');
		}
		for rules in self.named_css.values() {
			css.push_str(rules);
		}
		css
	}

	/// Renders the title and declarations, one per line.
	pub fn to_html(&self) -> String {
		let mut html = String::new();
		if let Some(title) = &self.title {
			html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
		}
		for tag in &self.tags {
			html.push_str(&tag.to_html());
		}
		html
	}
}

fn collect_attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> IndexMap<String, String>
where
	K: AsRef<str>,
	V: Into<String>,
{
	attributes
		.into_iter()
		.filter_map(|(name, value)| {
			let name = to_kebab_case(name.as_ref());
			(!name.is_empty()).then(|| (name, value.into()))
		})
		.collect()
}

fn declaration_block<I, K, V>(declarations: I) -> String
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut rules = String::new();
	for (name, value) in declarations {
		let property = normalize_property(name.as_ref());
		let value = sanitize_value(value.as_ref(), DEFAULT_CSS_VALUE_MAX_LEN);
		if property.is_empty() || value.is_empty() {
			continue;
		}
		rules.push_str(&format!("{}:{};", property, value));
	}
	rules
}
