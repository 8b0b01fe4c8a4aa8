//! Weft Core
//!
//! Building blocks shared by the Weft rendering crates:
//!
//! - [`escape`]: HTML/attribute/script escaping and name normalization
//! - [`css`]: CSS value sanitizing and scoped class derivation
//! - [`script`]: Client scripts captured for hydration and their validation
//! - [`settings`]: Render settings loaded from defaults, TOML or environment
//! - [`metrics`]: Named counters and timings reported to an external collector
//! - [`exception`]: Structural error type

#![warn(missing_docs)]

pub mod css;
pub mod escape;
pub mod exception;
pub mod metrics;
pub mod script;
pub mod settings;

pub use exception::StructureError;
pub use metrics::{CounterMetrics, MetricsSink, NoopMetrics, TracingMetrics};
pub use script::{ClientScript, ScriptError, ScriptKind, ScriptLimits, TARGET_ID_PLACEHOLDER};
pub use settings::{Mode, RenderSettings, SettingsError};
