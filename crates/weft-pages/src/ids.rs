//! Element id generation.
//!
//! Ids correlate server-rendered elements with their hydration entries, so
//! they must never repeat within a process, not even across pooled nodes or
//! different documents. Each generator draws a random run prefix once and
//! appends a monotonically increasing counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generator of `"<run-prefix>-<counter>"` element ids.
#[derive(Debug)]
pub struct IdGenerator {
	prefix: String,
	counter: AtomicU64,
}

impl Default for IdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

impl IdGenerator {
	/// Creates a generator with a fresh random run prefix.
	pub fn new() -> Self {
		let uuid = uuid::Uuid::new_v4().simple().to_string();
		Self::with_prefix(format!("w{}", &uuid[..8]))
	}

	/// Creates a generator with a fixed prefix.
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			counter: AtomicU64::new(0),
		}
	}

	/// Returns the run prefix.
	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Returns the next id.
	///
	/// # Examples
	///
	/// ```
	/// use weft_pages::ids::IdGenerator;
	///
	/// let ids = IdGenerator::with_prefix("run");
	/// assert_eq!(ids.next_id(), "run-1");
	/// assert_eq!(ids.next_id(), "run-2");
	/// ```
	pub fn next_id(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
		format!("{}-{}", self.prefix, n)
	}

	/// Number of ids issued so far.
	pub fn issued(&self) -> u64 {
		self.counter.load(Ordering::Relaxed)
	}
}
