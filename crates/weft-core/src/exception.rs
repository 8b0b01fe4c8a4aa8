//! Structural errors.
//!
//! Structural errors abort the operation that raised them and must be handled
//! by the caller, unlike client script validation failures which are absorbed
//! by the node builder.

/// Errors raised when the shape of a request is invalid.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
	/// A node was requested without a tag name.
	#[error("Tag name is empty")]
	EmptyTag,

	/// A tag name did not normalize to a valid element name.
	#[error("Invalid tag name: '{tag}'")]
	InvalidTag {
		/// The tag as supplied by the caller.
		tag: String,
	},

	/// A warmup or cache route descriptor was malformed.
	#[error("Malformed route descriptor: {reason}")]
	MalformedRoute {
		/// Why the descriptor was rejected.
		reason: String,
	},
}
