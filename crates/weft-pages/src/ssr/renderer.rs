//! Tree serialization and the document envelope.

use super::context::{BindingEntry, ComputedEntry, EventEntry, RenderContext, StateEntry};
use crate::head::Head;
use crate::logging::dev_warn;
use crate::node::{Child, Node, is_void_element};
use weft_core::escape::{escape_attr, escape_html, escape_json_for_script};
use weft_core::script::ScriptLimits;
use weft_core::settings::RenderSettings;

/// Serializes nodes into HTML while filling a [`RenderContext`].
pub struct Renderer<'a> {
	settings: &'a RenderSettings,
	limits: ScriptLimits,
	context: &'a mut RenderContext,
}

impl<'a> Renderer<'a> {
	/// Creates a renderer writing side-channel data into `context`.
	pub fn new(settings: &'a RenderSettings, context: &'a mut RenderContext) -> Self {
		Self {
			settings,
			limits: settings.script_limits(),
			context,
		}
	}

	/// Renders top-level nodes in order.
	pub fn render_body(&mut self, nodes: &[Node]) -> String {
		let mut output = String::new();
		for node in nodes {
			self.render_node(node, &mut output);
		}
		output
	}

	/// Renders one node and its descendants into `output`.
	pub fn render_node(&mut self, node: &Node, output: &mut String) {
		let tag = node.tag_name();
		output.push('<');
		output.push_str(tag);
		for (name, value) in node.attrs() {
			output.push(' ');
			output.push_str(name);
			output.push_str("=\"");
			output.push_str(&escape_attr(value));
			output.push('"');
		}
		output.push('>');

		if !node.style_fragment().is_empty() {
			self.context.push_style(node.style_fragment());
		}

		if let Some(id) = node.element_id() {
			self.collect_hydration(node, id);
		}

		if !is_void_element(tag) {
			for child in node.child_nodes() {
				match child {
					Child::Element(element) => self.render_node(element, output),
					Child::Text(text) => output.push_str(&escape_html(text)),
					Child::Markup(markup) => output.push_str(markup),
				}
			}
			output.push_str("</");
			output.push_str(tag);
			output.push('>');
		}

		for binding in node.event_bindings() {
			self.context.events.push(EventEntry {
				event: binding.event.clone(),
				node_id: binding.node_id.clone(),
				target_id: binding.target_id.clone(),
				source: binding.handler.source().to_string(),
			});
		}
	}

	fn collect_hydration(&mut self, node: &Node, id: &str) {
		if let Some(value) = node.captured_state() {
			self.context.states.push(StateEntry {
				id: id.to_string(),
				value: value.clone(),
				tag: node.tag_name().to_string(),
			});
		}

		if let Some(script) = node.computed_script() {
			match script.validate(&self.limits) {
				Ok(()) => self.context.computed.push(ComputedEntry {
					id: id.to_string(),
					source: script.source().to_string(),
				}),
				Err(error) => {
					dev_warn!(self.settings, id, %error, "computed script dropped at render");
				}
			}
		}

		for binding in node.bindings() {
			self.context.state_bindings.push(BindingEntry {
				node_id: id.to_string(),
				state_key: binding.state_key.clone(),
				source: binding.template.source().to_string(),
			});
		}
	}
}

/// Renders a single node without an envelope, discarding side-channel data.
pub fn render_to_string(node: &Node, settings: &RenderSettings) -> String {
	let mut context = RenderContext::new();
	let mut output = String::new();
	Renderer::new(settings, &mut context).render_node(node, &mut output);
	output
}

/// Wraps rendered parts in the fixed document envelope.
pub fn wrap_document(
	settings: &RenderSettings,
	head: &Head,
	styles: &[String],
	body: &str,
	script: &str,
) -> String {
	let mut html = String::with_capacity(body.len() + script.len() + 1024);

	html.push_str("<!DOCTYPE html>\n");
	html.push_str(&format!("<html lang=\"{}\">\n", escape_attr(&settings.lang)));

	html.push_str("<head>\n");
	html.push_str("<meta charset=\"UTF-8\">\n");
	html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
	html.push_str(&head.to_html());

	let document_css = head.css_text();
	if !document_css.is_empty() {
		html.push_str(&format!(
			"<style>{}</style>\n",
			escape_json_for_script(&document_css)
		));
	}
	if !styles.is_empty() {
		html.push_str("<style>");
		for rule in styles {
			html.push_str(rule);
		}
		html.push_str("</style>\n");
	}
	html.push_str("</head>\n");

	html.push_str("<body>\n");
	html.push_str(body);
	html.push('\n');
	if !script.is_empty() {
		html.push_str("<script>");
		html.push_str(script);
		html.push_str("</script>\n");
	}
	html.push_str("</body>\n");
	html.push_str("</html>");

	html
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{DocumentOptions, PageRuntime};
	use rstest::rstest;
	use weft_core::ClientScript;

	#[rstest]
	#[case("br")]
	#[case("img")]
	#[case("input")]
	#[case("meta")]
	#[case("wbr")]
	fn test_void_elements_have_no_children_or_closing_tag(#[case] tag: &str) {
		let runtime = PageRuntime::new(RenderSettings::default());
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc
			.create(tag)
			.unwrap()
			.attribute("data-x", "1")
			.text("ignored")
			.append(doc.create("span").unwrap());

		assert_eq!(node.to_html(), format!("<{} data-x=\"1\">", tag));
	}

	#[rstest]
	fn test_attribute_values_escaped() {
		let runtime = PageRuntime::new(RenderSettings::default());
		let doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("a").unwrap().attribute("title", "\"x\" & <y>");
		assert_eq!(
			node.to_html(),
			"<a title=\"&quot;x&quot; &amp; &lt;y&gt;\"></a>"
		);
	}

	#[rstest]
	fn test_collects_context_in_document_order() {
		let settings = RenderSettings::default();
		let runtime = PageRuntime::new(settings.clone());
		let doc = runtime.create_document(DocumentOptions::default());
		let inner = doc
			.create("input")
			.unwrap()
			.id("name")
			.state("Ada")
			.on("input", ClientScript::event("(e, w) => w.set('name', e.target.value)"));
		let outer = doc
			.create("form")
			.unwrap()
			.id("form")
			.css([("display", "grid")])
			.on("submit", ClientScript::event("(e) => e.preventDefault()"))
			.append(inner)
			.append(
				doc.create("span")
					.unwrap()
					.bind_text("name", ClientScript::computed("(v) => 'Hi ' + v")),
			);

		let mut context = RenderContext::new();
		let html = Renderer::new(&settings, &mut context).render_body(std::slice::from_ref(&outer));

		assert!(html.starts_with("<form id=\"form\" class=\"w-"));
		assert_eq!(context.styles().len(), 1);
		assert_eq!(context.states[0].tag, "input");
		assert_eq!(context.state_bindings[0].state_key, "name");
		let events: Vec<_> = context.events.iter().map(|e| e.event.as_str()).collect();
		assert_eq!(events, vec!["input", "submit"]);
	}

	#[rstest]
	fn test_envelope_structure() {
		let mut head = Head::new();
		head.title("Home");
		let html = wrap_document(
			&RenderSettings::default().with_lang("fr"),
			&head,
			&[".w-a{color:red;}".to_string()],
			"<main></main>",
			"",
		);

		assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n"));
		assert!(html.contains("<title>Home</title>"));
		assert!(html.contains("<style>.w-a{color:red;}</style>"));
		assert!(html.contains("<body>\n<main></main>\n</body>"));
		assert!(!html.contains("<script>"));
	}
}
