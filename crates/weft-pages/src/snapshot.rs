//! Structural export and import of documents.
//!
//! A [`DocumentSnapshot`] is a serde tree of the body plus the head and the
//! captured state map. Client script sources are exported for inspection,
//! but [`Document::import`] never restores them: only data fields (tags,
//! attributes, children, scoped CSS and state) come back. Imported CSS is
//! rebuilt through the sanitizer, and `markup` nodes holding raw HTML come
//! back as escaped text.
//!
//! ```json
//! {
//!   "head": { "title": "Home" },
//!   "body": [
//!     { "type": "element", "tag": "p", "attributes": { "id": "greeting" },
//!       "children": [{ "type": "text", "content": "Hi" }], "state": "Hi" }
//!   ],
//!   "state": { "greeting": "Hi" }
//! }
//! ```

use crate::document::{Document, DocumentOptions};
use crate::error::PagesError;
use crate::head::Head;
use crate::node::{Child, Node};
use crate::runtime::PageRuntime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use weft_core::css::sanitize_fragment;

/// Exported document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSnapshot {
	/// Head declarations.
	pub head: Head,
	/// Top-level nodes.
	pub body: Vec<SnapshotNode>,
	/// Captured states keyed by node id.
	pub state: IndexMap<String, Value>,
}

/// Exported reactive binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBinding {
	/// Watched state key.
	pub state_key: String,
	/// Template source.
	pub source: String,
}

/// Exported event listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEvent {
	/// DOM event name.
	pub event: String,
	/// Element id.
	pub node_id: String,
	/// Target id for placeholder substitution.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_id: Option<String>,
	/// Listener source.
	pub source: String,
}

/// Exported node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SnapshotNode {
	/// An element.
	Element {
		/// Tag name.
		tag: String,
		/// Attributes in insertion order.
		#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
		attributes: IndexMap<String, String>,
		/// Children.
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		children: Vec<SnapshotNode>,
		/// Scoped CSS rules.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		css_fragment: Option<String>,
		/// Captured state.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		state: Option<Value>,
		/// Reactive bindings, export only.
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		state_bindings: Vec<SnapshotBinding>,
		/// Event listeners, export only.
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		events: Vec<SnapshotEvent>,
		/// Computed script source, export only.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		computed_source: Option<String>,
	},
	/// Plain text, unescaped.
	Text {
		/// Text content.
		content: String,
	},
	/// Raw HTML appended with [`Node::append_unsafe`].
	Markup {
		/// Markup as rendered.
		content: String,
	},
}

impl DocumentSnapshot {
	/// Encodes the snapshot as JSON.
	pub fn to_json(&self) -> Result<String, PagesError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decodes a snapshot from JSON.
	pub fn from_json(json: &str) -> Result<Self, PagesError> {
		Ok(serde_json::from_str(json)?)
	}
}

impl SnapshotNode {
	fn from_node(node: &Node) -> Self {
		Self::Element {
			tag: node.tag_name().to_string(),
			attributes: node.attrs().clone(),
			children: node
				.child_nodes()
				.iter()
				.map(|child| match child {
					Child::Element(element) => Self::from_node(element),
					Child::Text(content) => Self::Text {
						content: content.clone(),
					},
					Child::Markup(content) => Self::Markup {
						content: content.clone(),
					},
				})
				.collect(),
			css_fragment: Some(node.style_fragment())
				.filter(|fragment| !fragment.is_empty())
				.map(str::to_string),
			state: node.captured_state().cloned(),
			state_bindings: node
				.bindings()
				.iter()
				.map(|binding| SnapshotBinding {
					state_key: binding.state_key.clone(),
					source: binding.template.source().to_string(),
				})
				.collect(),
			events: node
				.event_bindings()
				.iter()
				.map(|binding| SnapshotEvent {
					event: binding.event.clone(),
					node_id: binding.node_id.clone(),
					target_id: binding.target_id.clone(),
					source: binding.handler.source().to_string(),
				})
				.collect(),
			computed_source: node.computed_script().map(|script| script.source().to_string()),
		}
	}

	fn into_child(self, document: &Document) -> Result<Child, PagesError> {
		match self {
			Self::Text { content } | Self::Markup { content } => Ok(Child::Text(content)),
			Self::Element {
				tag,
				attributes,
				children,
				css_fragment,
				state,
				..
			} => {
				let mut node = document.create(&tag)?;
				for (name, value) in attributes {
					node = node.attribute(name, value);
				}
				for child in children {
					node = node.append(child.into_child(document)?);
				}
				if let Some(fragment) = css_fragment {
					let max_len = document.settings().css_value_max_len;
					let clean = sanitize_fragment(&fragment, max_len);
					if clean.len() != fragment.len() {
						tracing::debug!(tag = %tag, "imported CSS fragment was rewritten");
					}
					node.set_style_fragment(clean);
				}
				if let Some(value) = state {
					node.set_state_value(value);
				}
				Ok(Child::Element(node))
			}
		}
	}
}

impl Document {
	/// Exports the tree, head and state map.
	pub fn export(&self) -> DocumentSnapshot {
		DocumentSnapshot {
			head: self.head().clone(),
			body: self.body().iter().map(SnapshotNode::from_node).collect(),
			state: self.states(),
		}
	}

	/// Rebuilds a document from a snapshot.
	///
	/// Client scripts are not restored, so the imported page renders its
	/// markup, styles and state but no computed values, bindings or
	/// listeners.
	///
	/// # Errors
	///
	/// Returns a structural error when a snapshot element has an invalid tag.
	pub fn import(
		runtime: &Arc<PageRuntime>,
		snapshot: DocumentSnapshot,
	) -> Result<Document, PagesError> {
		let mut document = runtime.create_document(DocumentOptions::default());
		document.set_head(snapshot.head);
		for (id, value) in snapshot.state {
			document.insert_state(id, value);
		}
		for node in snapshot.body {
			match node.into_child(&document)? {
				Child::Element(element) => {
					document.push(element);
				}
				Child::Text(content) | Child::Markup(content) => {
					tracing::debug!(%content, "top-level text dropped on import");
				}
			}
		}
		Ok(document)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use weft_core::{ClientScript, RenderSettings};

	#[fixture]
	fn runtime() -> Arc<PageRuntime> {
		PageRuntime::new(RenderSettings::default())
	}

	fn sample(runtime: &Arc<PageRuntime>) -> Document {
		let mut doc = runtime.create_document(DocumentOptions::default());
		doc.head_mut().title("Profile");
		let name = doc
			.create("span")
			.unwrap()
			.id("name")
			.state("Ada")
			.text("Ada");
		let card = doc
			.create("section")
			.unwrap()
			.css([("padding", "4px")])
			.on("click", ClientScript::event("() => 1"))
			.append(name);
		doc.push(card);
		doc
	}

	#[rstest]
	fn test_export_shape(runtime: Arc<PageRuntime>) {
		let doc = sample(&runtime);
		let value = serde_json::to_value(doc.export()).unwrap();

		assert_eq!(value["head"]["title"], "Profile");
		assert_eq!(value["state"], json!({ "name": "Ada" }));
		let card = &value["body"][0];
		assert_eq!(card["type"], "element");
		assert_eq!(card["tag"], "section");
		assert!(card["cssFragment"].as_str().unwrap().contains("padding:4px;"));
		assert_eq!(card["events"][0]["event"], "click");
		assert_eq!(card["children"][0]["children"][0], json!({ "type": "text", "content": "Ada" }));
	}

	#[rstest]
	fn test_import_restores_data_but_not_scripts(runtime: Arc<PageRuntime>) {
		let original = sample(&runtime);
		let json = original.export().to_json().unwrap();
		drop(original);

		let snapshot = DocumentSnapshot::from_json(&json).unwrap();
		let mut imported = Document::import(&runtime, snapshot).unwrap();

		assert_eq!(imported.head().get_title(), Some("Profile"));
		assert_eq!(imported.states().get("name"), Some(&json!("Ada")));
		let card = &imported.body()[0];
		assert!(card.event_bindings().is_empty());
		assert!(!card.style_fragment().is_empty());

		let html = imported.render();
		assert!(html.contains("<span id=\"name\">Ada</span>"));
		assert!(html.contains("padding:4px;"));
		assert!(!html.contains("addEventListener(\"click\""));
	}

	#[rstest]
	fn test_import_rebuilds_css_fragment(runtime: Arc<PageRuntime>) {
		let json = r#"{"body":[{"type":"element","tag":"div","attributes":{"class":"x"},"cssFragment":".x{color:red;}</style><script>alert(1)</script>"}]}"#;

		let snapshot = DocumentSnapshot::from_json(json).unwrap();
		let mut imported = Document::import(&runtime, snapshot).unwrap();
		let html = imported.render();

		assert!(html.contains(".x{color:red;}"));
		assert!(!html.contains("alert(1)"));
		assert_eq!(html.matches("</style>").count(), 1);
	}

	#[rstest]
	fn test_import_escapes_text_and_markup(runtime: Arc<PageRuntime>) {
		let json = r#"{"body":[{"type":"element","tag":"p","children":[
			{"type":"text","content":"<img src=x onerror=alert(2)>"},
			{"type":"markup","content":"<b>bold</b>"}
		]}]}"#;

		let snapshot = DocumentSnapshot::from_json(json).unwrap();
		let mut imported = Document::import(&runtime, snapshot).unwrap();
		let html = imported.render();

		assert!(html.contains("<p>&lt;img src=x onerror=alert(2)&gt;&lt;b&gt;bold&lt;/b&gt;</p>"));
		assert!(!html.contains("<img"));
	}

	#[rstest]
	fn test_export_separates_text_from_markup(runtime: Arc<PageRuntime>) {
		let mut doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("p").unwrap().text("a<b").append_unsafe("<br>");
		doc.push(node);

		let value = serde_json::to_value(doc.export()).unwrap();

		assert_eq!(
			value["body"][0]["children"],
			json!([
				{ "type": "text", "content": "a<b" },
				{ "type": "markup", "content": "<br>" }
			])
		);
	}

	#[rstest]
	fn test_export_state_follows_renamed_id(runtime: Arc<PageRuntime>) {
		let mut doc = runtime.create_document(DocumentOptions::default());
		let node = doc.create("span").unwrap().state(1).id("later");
		doc.push(node);

		let value = serde_json::to_value(doc.export()).unwrap();

		assert_eq!(value["body"][0]["attributes"]["id"], "later");
		assert_eq!(value["state"], json!({ "later": 1 }));
	}

	#[rstest]
	fn test_import_rejects_invalid_tag(runtime: Arc<PageRuntime>) {
		let snapshot = DocumentSnapshot {
			body: vec![SnapshotNode::Element {
				tag: "".to_string(),
				attributes: IndexMap::new(),
				children: Vec::new(),
				css_fragment: None,
				state: None,
				state_bindings: Vec::new(),
				events: Vec::new(),
				computed_source: None,
			}],
			..DocumentSnapshot::default()
		};
		assert!(Document::import(&runtime, snapshot).is_err());
	}

	#[rstest]
	fn test_from_json_rejects_garbage() {
		assert!(matches!(
			DocumentSnapshot::from_json("{\"body\": 3}"),
			Err(PagesError::Snapshot(_))
		));
	}
}
