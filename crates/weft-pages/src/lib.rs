//! Weft Pages
//!
//! Pooled node trees, server-side rendering and hydration scripts.
//!
//! ## Overview
//!
//! - [`PageRuntime`]: shared settings, pools, id generator and response cache
//! - [`Document`] and [`Node`]: build a page from pooled elements
//! - [`Head`]: title, meta/link/script declarations and document CSS
//! - [`ssr`]: tree serialization, the document envelope and minification
//! - [`hydration`]: the client script restoring state, computed values,
//!   bindings and listeners
//! - [`cached`]: single-flight cached rendering and cache warmup
//! - [`snapshot`]: structural export and import of documents
//!
//! ## Example
//!
//! ```
//! use weft_core::{ClientScript, RenderSettings};
//! use weft_pages::{DocumentOptions, PageRuntime};
//!
//! let runtime = PageRuntime::new(RenderSettings::default());
//! let mut doc = runtime.create_document(DocumentOptions::default());
//!
//! doc.head_mut().title("Counter");
//! let count = doc.create("span").unwrap().id("count").state(0).text("0");
//! let button = doc
//!     .create("button")
//!     .unwrap()
//!     .text("+1")
//!     .on("click", ClientScript::event("(e, w) => w.set('count', w.state.count + 1)"));
//! doc.push(count).push(button);
//!
//! let html = doc.render();
//! assert!(html.contains("<span id=\"count\">0</span>"));
//! assert!(html.contains("window.__weft"));
//! ```

#![warn(missing_docs)]

mod logging;

pub mod cached;
pub mod document;
pub mod error;
pub mod head;
pub mod hydration;
pub mod ids;
pub mod node;
pub mod pool;
pub mod runtime;
pub mod snapshot;
pub mod ssr;

pub use cached::{PageBuilder, WarmupReport, WarmupRoute};
pub use document::{Document, DocumentOptions};
pub use error::{BuildError, PagesError, RenderError};
pub use head::{GlobalRule, Head, HeadTag};
pub use node::{Child, EventBinding, IntoChild, IntoText, Node, StateBinding};
pub use pool::{ObjectPool, PoolStatistics, Reusable};
pub use runtime::PageRuntime;
pub use snapshot::{DocumentSnapshot, SnapshotNode};
