//! Cached rendering and cache warmup.
//!
//! [`PageRuntime::render_with_cache`] builds and renders a page at most once
//! per key at any time: concurrent callers that miss the cache share one
//! in-flight render. [`PageRuntime::warmup`] pushes a list of routes through
//! the same path concurrently and reports each outcome separately.

use crate::document::Document;
use crate::error::{BuildError, RenderError};
use crate::runtime::PageRuntime;
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use weft_core::StructureError;
use weft_core::metrics::names;

/// Produces the document for a cached route.
///
/// Implemented for every `Fn(Arc<PageRuntime>) -> impl Future<Output =
/// Result<Document, BuildError>>`, so async closures work directly.
#[async_trait]
pub trait PageBuilder: Send + Sync {
	/// Builds a document on `runtime`.
	async fn build(&self, runtime: Arc<PageRuntime>) -> Result<Document, BuildError>;
}

#[async_trait]
impl<F, Fut> PageBuilder for F
where
	F: Fn(Arc<PageRuntime>) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Document, BuildError>> + Send + 'static,
{
	async fn build(&self, runtime: Arc<PageRuntime>) -> Result<Document, BuildError> {
		(self)(runtime).await
	}
}

/// A route to pre-render: cache key plus builder.
#[derive(Clone)]
pub struct WarmupRoute {
	/// Cache key.
	pub key: String,
	/// Builder producing the page.
	pub builder: Arc<dyn PageBuilder>,
}

impl WarmupRoute {
	/// Creates a route.
	pub fn new(key: impl Into<String>, builder: impl PageBuilder + 'static) -> Self {
		Self {
			key: key.into(),
			builder: Arc::new(builder),
		}
	}
}

impl std::fmt::Debug for WarmupRoute {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WarmupRoute").field("key", &self.key).finish()
	}
}

/// Outcome of warming up one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
	/// Cache key of the route.
	pub key: String,
	/// Whether the page was rendered and cached.
	pub success: bool,
	/// Length of the rendered page in bytes, on success.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<usize>,
	/// Error message, on failure.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl PageRuntime {
	/// Returns the cached page for `key`, or builds and renders it.
	///
	/// Callers arriving while a render for `key` is in progress wait for that
	/// render instead of starting another. The render runs on a spawned task,
	/// so it finishes and fills the cache even if every caller goes away.
	/// Failures are not cached; every waiting caller receives the same error
	/// and the next call retries.
	///
	/// Must be called from within a tokio runtime.
	///
	/// # Errors
	///
	/// [`RenderError::Structure`] for an empty key, [`RenderError::Build`]
	/// when the builder fails and [`RenderError::Aborted`] when the render
	/// task panics.
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use weft_core::RenderSettings;
	/// use weft_pages::{BuildError, Document, DocumentOptions, PageRuntime};
	///
	/// # #[tokio::main(flavor = "current_thread")]
	/// # async fn main() {
	/// let runtime = PageRuntime::new(RenderSettings::default());
	///
	/// let html = runtime
	///     .render_with_cache("home", |rt: Arc<PageRuntime>| async move {
	///         let mut doc = rt.create_document(DocumentOptions::default());
	///         let title = doc.create("h1")?.text("Home");
	///         doc.push(title);
	///         Ok::<Document, BuildError>(doc)
	///     })
	///     .await
	///     .unwrap();
	///
	/// assert!(html.contains("<h1>Home</h1>"));
	/// assert_eq!(runtime.cache().peek("home"), Some(html));
	/// # }
	/// ```
	pub async fn render_with_cache<B>(self: &Arc<Self>, key: &str, builder: B) -> Result<String, RenderError>
	where
		B: PageBuilder + 'static,
	{
		self.render_shared(key, Arc::new(builder)).await
	}

	/// Pre-renders every route concurrently and reports each outcome.
	///
	/// A failing route never affects its siblings. Reports are returned in
	/// route order.
	pub async fn warmup(self: &Arc<Self>, routes: Vec<WarmupRoute>) -> Vec<WarmupReport> {
		let renders = routes.into_iter().map(|route| async move {
			let result = self.render_shared(&route.key, route.builder).await;
			match result {
				Ok(html) => WarmupReport {
					key: route.key,
					success: true,
					size: Some(html.len()),
					error: None,
				},
				Err(error) => {
					tracing::warn!(key = %route.key, %error, "warmup route failed");
					WarmupReport {
						key: route.key,
						success: false,
						size: None,
						error: Some(error.to_string()),
					}
				}
			}
		});

		let reports = futures::future::join_all(renders).await;
		let failed = reports.iter().filter(|report| !report.success).count();
		tracing::info!(routes = reports.len(), failed, "cache warmup finished");
		reports
	}

	async fn render_shared(
		self: &Arc<Self>,
		key: &str,
		builder: Arc<dyn PageBuilder>,
	) -> Result<String, RenderError> {
		if key.trim().is_empty() {
			return Err(StructureError::MalformedRoute {
				reason: "cache key must not be empty".to_string(),
			}
			.into());
		}

		let runtime = Arc::clone(self);
		let task_key = key.to_string();
		let compute = move || async move {
			let mut document = match builder.build(Arc::clone(&runtime)).await {
				Ok(document) => document,
				Err(error) => {
					runtime.metrics().increment(names::BUILD_FAILED, 1);
					return Err(RenderError::Build {
						key: task_key,
						message: error.to_string(),
					});
				}
			};
			Ok(document.render_uncached())
		};

		self.flight()
			.load(self.cache(), key, compute)
			.await
			.map_err(RenderError::from)
	}
}
