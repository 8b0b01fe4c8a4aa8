//! Documents.
//!
//! A [`Document`] owns the top-level nodes of one page, its [`Head`] and the
//! state captured by its nodes. Rendering consumes the tree: after
//! [`Document::render`] returns, every node has been recycled into the
//! runtime's pool and the state store is empty.

use crate::error::PagesError;
use crate::head::Head;
use crate::ids::IdGenerator;
use crate::logging::dev_warn;
use crate::node::Node;
use crate::runtime::PageRuntime;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use weft_core::escape::normalize_tag;
use weft_core::settings::RenderSettings;

/// State shared between a document and the nodes it created.
#[derive(Debug)]
pub(crate) struct DocumentScope {
	pub(crate) settings: Arc<RenderSettings>,
	pub(crate) ids: Arc<IdGenerator>,
	pub(crate) states: Mutex<IndexMap<String, serde_json::Value>>,
}

/// Cache participation of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOptions {
	/// Look up and store the rendered page in the runtime's response cache.
	pub use_cache: bool,
	/// Cache key, required when `use_cache` is set.
	pub cache_key: Option<String>,
}

impl DocumentOptions {
	/// Options that cache the rendered page under `key`.
	pub fn cached(key: impl Into<String>) -> Self {
		Self {
			use_cache: true,
			cache_key: Some(key.into()),
		}
	}

	fn cache_key(&self) -> Option<&str> {
		match (&self.cache_key, self.use_cache) {
			(Some(key), true) if !key.trim().is_empty() => Some(key),
			_ => None,
		}
	}
}

/// One page under construction.
pub struct Document {
	runtime: Arc<PageRuntime>,
	scope: Arc<DocumentScope>,
	body: Vec<Node>,
	head: Head,
	options: DocumentOptions,
}

impl std::fmt::Debug for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Document")
			.field("body", &self.body)
			.field("head", &self.head)
			.field("options", &self.options)
			.finish()
	}
}

impl Document {
	pub(crate) fn new(runtime: Arc<PageRuntime>, options: DocumentOptions) -> Self {
		if options.use_cache && options.cache_key().is_none() {
			dev_warn!(runtime.settings(), "document requests caching without a cache key");
		}
		let scope = Arc::new(DocumentScope {
			settings: runtime.shared_settings(),
			ids: runtime.ids(),
			states: Mutex::new(IndexMap::new()),
		});
		Self {
			runtime,
			scope,
			body: Vec::new(),
			head: Head::new(),
			options,
		}
	}

	/// Creates a node bound to this document.
	///
	/// The tag is normalized to lower kebab case.
	///
	/// # Errors
	///
	/// Returns a structural error when the tag is empty or does not
	/// normalize to a valid element name.
	///
	/// # Examples
	///
	/// ```
	/// use weft_pages::{DocumentOptions, PageRuntime};
	/// use weft_core::RenderSettings;
	///
	/// let runtime = PageRuntime::new(RenderSettings::default());
	/// let doc = runtime.create_document(DocumentOptions::default());
	///
	/// let input = doc.create("input").unwrap().attribute("type", "text");
	/// assert_eq!(input.to_html(), "<input type=\"text\">");
	/// assert!(doc.create("").is_err());
	/// ```
	pub fn create(&self, tag: &str) -> Result<Node, PagesError> {
		let tag = normalize_tag(tag)?;
		let scope = Arc::clone(&self.scope);
		Ok(self
			.runtime
			.node_pool()
			.acquire_with(|node| node.bind(tag, scope)))
	}

	/// Appends a top-level node.
	pub fn push(&mut self, node: Node) -> &mut Self {
		self.body.push(node);
		self
	}

	/// Appends several top-level nodes.
	pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
		self.body.extend(nodes);
		self
	}

	/// Top-level nodes.
	pub fn body(&self) -> &[Node] {
		&self.body
	}

	/// The head section.
	pub fn head(&self) -> &Head {
		&self.head
	}

	/// Mutable access to the head section.
	pub fn head_mut(&mut self) -> &mut Head {
		&mut self.head
	}

	pub(crate) fn settings(&self) -> &RenderSettings {
		&self.scope.settings
	}

	pub(crate) fn set_head(&mut self, head: Head) {
		self.head = head;
	}

	/// Cache participation options.
	pub fn options(&self) -> &DocumentOptions {
		&self.options
	}

	/// The runtime that created this document.
	pub fn runtime(&self) -> &Arc<PageRuntime> {
		&self.runtime
	}

	/// Copy of the captured states keyed by node id, in capture order.
	pub fn states(&self) -> IndexMap<String, serde_json::Value> {
		self.scope.states.lock().clone()
	}

	pub(crate) fn insert_state(&self, id: String, value: serde_json::Value) {
		self.scope.states.lock().insert(id, value);
	}

	/// Renders the page and recycles the tree.
	///
	/// With caching enabled, a cached page is returned without rendering and
	/// a fresh render is stored under the cache key.
	pub fn render(&mut self) -> String {
		let cache_key = self.options.cache_key().map(str::to_string);

		if let Some(key) = &cache_key
			&& let Some(html) = self.runtime.cache().get(key)
		{
			self.clear();
			return html;
		}

		let html = self.render_uncached();
		if let Some(key) = cache_key {
			self.runtime.cache().set(key, html.clone());
		}
		html
	}

	/// Renders the page without consulting the cache, then recycles the tree.
	pub(crate) fn render_uncached(&mut self) -> String {
		let html = crate::ssr::render_page(&self.runtime, &self.head, &self.body);
		self.clear();
		html
	}

	/// Recycles every node, empties the head and the state store.
	pub fn clear(&mut self) {
		let pool = self.runtime.node_pool();
		for node in self.body.drain(..) {
			pool.recycle(node);
		}
		self.head.clear();
		self.scope.states.lock().clear();
	}
}

impl Drop for Document {
	fn drop(&mut self) {
		self.clear();
	}
}
