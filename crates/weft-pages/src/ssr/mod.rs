//! Server-side rendering.
//!
//! [`Renderer`] walks a node tree, writes HTML and fills a [`RenderContext`]
//! with scoped styles and hydration data. [`render_page`] drives a whole
//! document through the renderer, the hydration compiler and the envelope.

pub mod context;
pub mod minify;
pub mod renderer;

pub use context::RenderContext;
pub use minify::minify_html;
pub use renderer::{Renderer, render_to_string, wrap_document};

use crate::head::Head;
use crate::hydration;
use crate::node::Node;
use crate::runtime::PageRuntime;
use std::time::Instant;
use weft_core::metrics::names;

/// Renders a complete page: body, hydration script and envelope.
///
/// The render context is borrowed from the runtime's pool and returned once
/// the script is compiled. Production settings minify the result.
pub(crate) fn render_page(runtime: &PageRuntime, head: &Head, body: &[Node]) -> String {
	let started = Instant::now();
	let settings = runtime.settings();

	let mut context = runtime.context_pool().acquire();
	let body_html = Renderer::new(settings, &mut context).render_body(body);
	let script = hydration::compile(&context, settings);
	let mut html = wrap_document(settings, head, context.styles(), &body_html, &script);
	runtime.context_pool().release(context);

	if settings.should_minify() {
		html = minify_html(&html);
	}

	let elapsed = started.elapsed();
	runtime.metrics().increment(names::RENDER_COUNT, 1);
	runtime.metrics().timing(names::RENDER_DURATION, elapsed);
	tracing::trace!(
		bytes = html.len(),
		elapsed_us = elapsed.as_micros() as u64,
		"page rendered"
	);

	html
}
