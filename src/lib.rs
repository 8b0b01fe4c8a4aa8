//! # Weft
//!
//! Server-side HTML rendering with pooled nodes, a response cache with
//! single-flight deduplication, and a hydration-script compiler that
//! reproduces server-captured state and behaviour in the browser.
//!
//! ## Feature Flags
//!
//! - `cache` (default) - Re-exports the response cache crate for direct use
//!
//! ## Quick Example
//!
//! ```rust
//! use weft::prelude::*;
//!
//! # fn main() -> Result<(), PagesError> {
//! let runtime = PageRuntime::new(RenderSettings::default());
//! let mut document = runtime.create_document(DocumentOptions::default());
//!
//! let counter = document
//!     .create("span")?
//!     .id("count")
//!     .state(0)
//!     .text("0");
//! let button = document
//!     .create("button")?
//!     .on("click", ClientScript::event("(e, w) => w.set('count', w.state.count + 1)"))
//!     .text("Increment");
//!
//! document.push(counter).push(button);
//! let html = document.render();
//! assert!(html.contains("<span id=\"count\">0</span>"));
//! # Ok(())
//! # }
//! ```

// Re-export member crates following the facade layout
pub use weft_core as core;
pub use weft_pages as pages;

#[cfg(feature = "cache")]
pub use weft_cache as cache;

// Re-export the most commonly used types
pub use weft_core::{
	ClientScript, MetricsSink, Mode, NoopMetrics, RenderSettings, ScriptError, ScriptKind,
	SettingsError, TracingMetrics,
};
pub use weft_pages::{
	BuildError, Document, DocumentOptions, DocumentSnapshot, Head, Node, PageBuilder,
	PageRuntime, PagesError, RenderError, WarmupReport, WarmupRoute,
};

/// Prelude module for convenient imports
///
/// Import everything needed to build and render pages:
///
/// ```rust
/// use weft::prelude::*;
/// ```
pub mod prelude {
	pub use crate::{
		BuildError, ClientScript, Document, DocumentOptions, DocumentSnapshot, Head, Mode, Node,
		PageBuilder, PageRuntime, PagesError, RenderError, RenderSettings, WarmupReport,
		WarmupRoute,
	};
	pub use weft_pages::{Child, IntoChild, IntoText};

	#[cfg(feature = "cache")]
	pub use weft_cache::{CacheStatistics, ResponseCache};

	// External
	pub use async_trait::async_trait;
}
