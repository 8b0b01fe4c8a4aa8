//! Logging helpers for weft-pages
//!
//! Builder validation failures are reported only in development mode. In
//! production the failing call is skipped silently and the affected
//! hydration feature is omitted from the output.
//!
//! ## Macro Overview
//!
//! | Macro | Development | Production |
//! |-------|-------------|------------|
//! | `dev_warn!` | `tracing::warn!` | no-op |

/// Logs a warning when the given settings are not in production mode.
///
/// The first argument is anything with an `is_production()` method
/// returning `bool`; the rest are `tracing::warn!` arguments.
///
/// # Example
///
/// ```ignore
/// dev_warn!(settings, error = %err, "computed script rejected");
/// ```
macro_rules! dev_warn {
	($settings:expr, $($arg:tt)+) => {{
		if !$settings.is_production() {
			tracing::warn!($($arg)+);
		}
	}};
}

pub(crate) use dev_warn;
