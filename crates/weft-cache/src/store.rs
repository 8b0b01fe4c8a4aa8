//! Least-recently-used store backed by [`lru::LruCache`].

use lru::LruCache;
use std::num::NonZeroUsize;

/// Single-threaded LRU map from string keys to values.
///
/// Both [`get`](LruStore::get) and [`insert`](LruStore::insert) count as a use.
#[derive(Debug)]
pub struct LruStore<V> {
	// `None` when the capacity is zero
	entries: Option<LruCache<String, V>>,
	capacity: usize,
}

impl<V> LruStore<V> {
	/// Creates an empty store holding at most `capacity` entries.
	///
	/// A capacity of zero stores nothing.
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: NonZeroUsize::new(capacity).map(LruCache::new),
			capacity,
		}
	}

	/// Returns the value for `key` and marks it most recently used.
	pub fn get(&mut self, key: &str) -> Option<&V> {
		self.entries.as_mut()?.get(key)
	}

	/// Returns the value for `key` without changing recency.
	pub fn peek(&self, key: &str) -> Option<&V> {
		self.entries.as_ref()?.peek(key)
	}

	/// Inserts or replaces `key`, marking it most recently used.
	///
	/// Returns the key evicted to make room, if any.
	pub fn insert(&mut self, key: String, value: V) -> Option<String> {
		let entries = self.entries.as_mut()?;
		if let Some(slot) = entries.get_mut(&key) {
			*slot = value;
			return None;
		}
		entries.push(key, value).map(|(evicted, _)| evicted)
	}

	/// Removes `key`. Returns whether it was present.
	pub fn remove(&mut self, key: &str) -> bool {
		self.entries
			.as_mut()
			.is_some_and(|entries| entries.pop(key).is_some())
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		if let Some(entries) = self.entries.as_mut() {
			entries.clear();
		}
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.as_ref().map_or(0, LruCache::len)
	}

	/// Returns true when the store holds nothing.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Maximum number of entries.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Keys from least to most recently used.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries
			.iter()
			.flat_map(|entries| entries.iter().rev().map(|(key, _)| key.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	fn test_insert_then_get() {
		let mut store = LruStore::new(2);
		store.insert("a".to_string(), 1);
		assert_eq!(store.get("a"), Some(&1));
		assert_eq!(store.get("b"), None);
	}

	#[rstest]
	fn test_evicts_least_recently_read_not_oldest_inserted() {
		let mut store = LruStore::new(2);
		store.insert("a".to_string(), 1);
		store.insert("b".to_string(), 2);
		store.get("a");

		let evicted = store.insert("c".to_string(), 3);

		assert_eq!(evicted.as_deref(), Some("b"));
		assert_eq!(store.peek("a"), Some(&1));
		assert_eq!(store.peek("b"), None);
		assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "c"]);
	}

	#[rstest]
	fn test_replace_refreshes_recency_without_eviction() {
		let mut store = LruStore::new(2);
		store.insert("a".to_string(), 1);
		store.insert("b".to_string(), 2);

		assert_eq!(store.insert("a".to_string(), 10), None);
		assert_eq!(store.insert("c".to_string(), 3).as_deref(), Some("b"));
		assert_eq!(store.peek("a"), Some(&10));
	}

	#[rstest]
	fn test_peek_does_not_refresh() {
		let mut store = LruStore::new(2);
		store.insert("a".to_string(), 1);
		store.insert("b".to_string(), 2);
		store.peek("a");

		assert_eq!(store.insert("c".to_string(), 3).as_deref(), Some("a"));
	}

	#[rstest]
	fn test_zero_capacity_stores_nothing() {
		let mut store = LruStore::new(0);
		assert_eq!(store.insert("a".to_string(), 1), None);
		assert!(store.is_empty());
	}

	#[rstest]
	fn test_remove_and_clear() {
		let mut store = LruStore::new(3);
		store.insert("a".to_string(), 1);
		store.insert("b".to_string(), 2);

		assert!(store.remove("a"));
		assert!(!store.remove("a"));
		assert_eq!(store.len(), 1);

		store.clear();
		assert!(store.is_empty());
		assert_eq!(store.keys().count(), 0);
	}

	proptest! {
		/// The store never exceeds capacity and key listing matches its length.
		#[test]
		fn prop_bounded_and_consistent(
			capacity in 1usize..8,
			ops in prop::collection::vec((0u8..3, 0u8..12), 0..64),
		) {
			let mut store = LruStore::new(capacity);
			for (op, key) in ops {
				let key = format!("k{}", key);
				match op {
					0 => { store.insert(key, ()); }
					1 => { store.get(&key); }
					_ => { store.remove(&key); }
				}
				prop_assert!(store.len() <= capacity);
				prop_assert_eq!(store.keys().count(), store.len());
			}
		}

		/// A key read right before an insertion at capacity survives it.
		#[test]
		fn prop_recent_read_survives(capacity in 2usize..8) {
			let mut store = LruStore::new(capacity);
			for i in 0..capacity {
				store.insert(format!("k{}", i), i);
			}
			store.get("k0");
			store.insert("fresh".to_string(), 0);
			prop_assert!(store.peek("k0").is_some());
			prop_assert!(store.peek("k1").is_none());
		}
	}
}
