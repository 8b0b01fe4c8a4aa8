//! Page runtime.
//!
//! [`PageRuntime`] owns everything shared between documents: settings, the
//! element id generator, the node and render context pools, the response
//! cache with its single-flight registry, and the metrics sink. Create one at
//! process start and hand clones of the `Arc` to request handlers.

use crate::document::{Document, DocumentOptions};
use crate::error::{PagesError, RenderError};
use crate::ids::IdGenerator;
use crate::node::Node;
use crate::pool::{CONTEXT_POOL_METRICS, NODE_POOL_METRICS, ObjectPool, PoolStatistics};
use crate::ssr::RenderContext;
use std::sync::Arc;
use weft_cache::{ResponseCache, SingleFlight};
use weft_core::metrics::{MetricsSink, TracingMetrics};
use weft_core::settings::RenderSettings;

/// Shared state of all documents rendered by one process.
pub struct PageRuntime {
	settings: Arc<RenderSettings>,
	ids: Arc<IdGenerator>,
	node_pool: ObjectPool<Node>,
	context_pool: ObjectPool<RenderContext>,
	cache: ResponseCache<String>,
	flight: SingleFlight<String, RenderError>,
	metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for PageRuntime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PageRuntime")
			.field("settings", &self.settings)
			.field("ids", &self.ids)
			.field("node_pool", &self.node_pool)
			.field("context_pool", &self.context_pool)
			.field("cache", &self.cache)
			.finish()
	}
}

impl PageRuntime {
	/// Creates a runtime that reports metrics as `tracing` events.
	///
	/// # Examples
	///
	/// ```
	/// use weft_core::RenderSettings;
	/// use weft_pages::{DocumentOptions, PageRuntime};
	///
	/// let runtime = PageRuntime::new(RenderSettings::default());
	/// let mut doc = runtime.create_document(DocumentOptions::default());
	/// let node = doc.create("div").unwrap().text("<b>hi</b>");
	/// assert_eq!(node.to_html(), "<div>&lt;b&gt;hi&lt;/b&gt;</div>");
	///
	/// doc.push(node);
	/// assert!(doc.render().contains("<body>\n<div>&lt;b&gt;hi&lt;/b&gt;</div>\n</body>"));
	/// ```
	pub fn new(settings: RenderSettings) -> Arc<Self> {
		Self::with_metrics(settings, Arc::new(TracingMetrics))
	}

	/// Creates a runtime reporting pool, cache and render metrics to `metrics`.
	pub fn with_metrics(settings: RenderSettings, metrics: Arc<dyn MetricsSink>) -> Arc<Self> {
		tracing::debug!(
			mode = ?settings.mode,
			pool_capacity = settings.pool_capacity,
			cache_capacity = settings.cache_capacity,
			"page runtime created"
		);
		Arc::new(Self {
			node_pool: ObjectPool::with_metrics(
				settings.pool_capacity,
				NODE_POOL_METRICS,
				Arc::clone(&metrics),
			),
			context_pool: ObjectPool::with_metrics(
				settings.context_pool_capacity,
				CONTEXT_POOL_METRICS,
				Arc::clone(&metrics),
			),
			cache: ResponseCache::with_metrics(settings.cache_capacity, Arc::clone(&metrics)),
			flight: SingleFlight::with_metrics(Arc::clone(&metrics)),
			ids: Arc::new(IdGenerator::new()),
			settings: Arc::new(settings),
			metrics,
		})
	}

	/// Creates a runtime from `WEFT_`-prefixed environment variables.
	///
	/// # Errors
	///
	/// Returns [`PagesError::Settings`] when a variable holds an invalid value.
	pub fn from_env() -> Result<Arc<Self>, PagesError> {
		Ok(Self::new(RenderSettings::from_env()?))
	}

	/// Starts a new document.
	pub fn create_document(self: &Arc<Self>, options: DocumentOptions) -> Document {
		Document::new(Arc::clone(self), options)
	}

	/// Render settings.
	pub fn settings(&self) -> &RenderSettings {
		&self.settings
	}

	pub(crate) fn shared_settings(&self) -> Arc<RenderSettings> {
		Arc::clone(&self.settings)
	}

	pub(crate) fn ids(&self) -> Arc<IdGenerator> {
		Arc::clone(&self.ids)
	}

	/// Run prefix of generated element ids.
	pub fn id_prefix(&self) -> &str {
		self.ids.prefix()
	}

	pub(crate) fn node_pool(&self) -> &ObjectPool<Node> {
		&self.node_pool
	}

	pub(crate) fn context_pool(&self) -> &ObjectPool<RenderContext> {
		&self.context_pool
	}

	pub(crate) fn flight(&self) -> &SingleFlight<String, RenderError> {
		&self.flight
	}

	/// Node pool counters.
	pub fn node_pool_statistics(&self) -> PoolStatistics {
		self.node_pool.statistics()
	}

	/// Render context pool counters.
	pub fn context_pool_statistics(&self) -> PoolStatistics {
		self.context_pool.statistics()
	}

	/// The response cache.
	pub fn cache(&self) -> &ResponseCache<String> {
		&self.cache
	}

	/// The metrics sink.
	pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
		&self.metrics
	}

	/// Empties the cache and both pools and zeroes their counters.
	///
	/// Id generation continues from where it was, so ids stay unique.
	pub fn reset(&self) {
		self.cache.reset();
		self.node_pool.clear();
		self.context_pool.clear();
		tracing::debug!("page runtime reset");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use weft_core::metrics::{CounterMetrics, names};

	#[rstest]
	fn test_pools_follow_settings() {
		let runtime = PageRuntime::new(RenderSettings::default().with_pool_capacity(7));
		assert_eq!(runtime.node_pool_statistics().capacity, 7);
		assert_eq!(runtime.context_pool_statistics().capacity, 64);
		assert_eq!(runtime.cache().capacity(), 100);
	}

	#[rstest]
	fn test_render_reports_metrics() {
		let metrics = Arc::new(CounterMetrics::new());
		let runtime = PageRuntime::with_metrics(RenderSettings::default(), metrics.clone());

		for _ in 0..2 {
			let mut doc = runtime.create_document(DocumentOptions::default());
			let node = doc.create("p").unwrap().text("x");
			doc.push(node);
			doc.render();
		}

		assert_eq!(metrics.counter(names::RENDER_COUNT), 2);
		assert_eq!(metrics.timing_count(names::RENDER_DURATION), 2);
		assert_eq!(metrics.counter(names::POOL_NODE_CREATED), 1);
		assert_eq!(metrics.counter(names::POOL_NODE_REUSED), 1);
		assert_eq!(metrics.counter(names::POOL_CONTEXT_REUSED), 1);
	}

	#[rstest]
	fn test_reset_keeps_ids_unique() {
		let runtime = PageRuntime::new(RenderSettings::default());
		let doc = runtime.create_document(DocumentOptions::default());
		let first = doc.create("p").unwrap().auto_id();
		runtime.cache().set("k", "v".to_string());

		runtime.reset();

		let second = doc.create("p").unwrap().auto_id();
		assert_ne!(first.element_id(), second.element_id());
		assert!(runtime.cache().is_empty());
		assert_eq!(runtime.cache().statistics().total_requests, 0);
	}

	#[rstest]
	fn test_production_render_is_minified() {
		let runtime = PageRuntime::new(RenderSettings::production());
		let mut doc = runtime.create_document(DocumentOptions::default());
		doc.head_mut().title("Home");
		let node = doc.create("main").unwrap().text("hello");
		doc.push(node);

		let html = doc.render();

		assert!(!html.contains('\n'));
		assert!(html.contains("<body><main>hello</main></body>"));
	}
}
