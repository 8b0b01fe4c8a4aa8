//! Error types for page building and rendering.

use weft_cache::FlightError;
use weft_core::{SettingsError, StructureError};

/// Error returned by a [`PageBuilder`](crate::PageBuilder).
pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by document and runtime operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PagesError {
	/// Invalid tag or route descriptor.
	#[error(transparent)]
	Structure(#[from] StructureError),

	/// Invalid settings.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// A snapshot could not be encoded or decoded.
	#[error("Snapshot error: {0}")]
	Snapshot(#[from] serde_json::Error),

	/// Cached rendering failed.
	#[error(transparent)]
	Render(#[from] RenderError),
}

/// Failure of a cached render or warmup route.
///
/// Every caller joined to the same in-flight render receives a clone of the
/// same error, so the payload is plain text.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
	/// The cache key or route descriptor was malformed.
	#[error(transparent)]
	Structure(#[from] StructureError),

	/// The page builder returned an error.
	#[error("Builder for '{key}' failed: {message}")]
	Build {
		/// Cache key being rendered.
		key: String,
		/// Builder error message.
		message: String,
	},

	/// The render task panicked or was cancelled by the runtime.
	#[error("Render for '{key}' did not complete: {reason}")]
	Aborted {
		/// Cache key being rendered.
		key: String,
		/// Reason reported by the runtime.
		reason: String,
	},
}

impl From<FlightError<RenderError>> for RenderError {
	fn from(error: FlightError<RenderError>) -> Self {
		match error {
			FlightError::Failed(inner) => inner,
			FlightError::Aborted { key, reason } => Self::Aborted { key, reason },
			other => Self::Aborted {
				key: String::new(),
				reason: other.to_string(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_flight_failure_unwraps_inner_error() {
		let inner = RenderError::Build {
			key: "home".to_string(),
			message: "missing template".to_string(),
		};
		let converted: RenderError = FlightError::Failed(inner.clone()).into();
		assert_eq!(converted, inner);
	}

	#[rstest]
	fn test_flight_abort_keeps_key() {
		let converted: RenderError = FlightError::<RenderError>::Aborted {
			key: "home".to_string(),
			reason: "task panicked".to_string(),
		}
		.into();
		assert_eq!(
			converted.to_string(),
			"Render for 'home' did not complete: task panicked"
		);
	}

	#[rstest]
	fn test_structure_error_is_transparent() {
		let error = PagesError::from(StructureError::EmptyTag);
		assert_eq!(error.to_string(), "Tag name is empty");
	}
}
