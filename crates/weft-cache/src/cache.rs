//! Thread-safe response cache

use crate::store::LruStore;
use crate::statistics::CacheStatistics;
use parking_lot::Mutex;
use std::sync::Arc;
use weft_core::metrics::{MetricsSink, NoopMetrics, names};

struct Inner<V> {
	store: LruStore<V>,
	hits: u64,
	misses: u64,
	evictions: u64,
}

/// Bounded LRU cache from keys to rendered responses.
///
/// Cloning is cheap and yields a handle to the same storage.
///
/// # Examples
///
/// ```
/// use weft_cache::ResponseCache;
///
/// let cache = ResponseCache::new(2);
/// cache.set("home", "<p>home</p>".to_string());
///
/// assert_eq!(cache.get("home").as_deref(), Some("<p>home</p>"));
/// assert_eq!(cache.statistics().hits, 1);
/// ```
pub struct ResponseCache<V = String> {
	inner: Arc<Mutex<Inner<V>>>,
	metrics: Arc<dyn MetricsSink>,
}

impl<V> Clone for ResponseCache<V> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
			metrics: Arc::clone(&self.metrics),
		}
	}
}

impl<V> std::fmt::Debug for ResponseCache<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("ResponseCache")
			.field("len", &inner.store.len())
			.field("capacity", &inner.store.capacity())
			.finish()
	}
}

impl<V: Clone> ResponseCache<V> {
	/// Creates a cache holding at most `capacity` entries.
	pub fn new(capacity: usize) -> Self {
		Self::with_metrics(capacity, Arc::new(NoopMetrics))
	}

	/// Creates a cache that reports hits, misses and evictions to `metrics`.
	pub fn with_metrics(capacity: usize, metrics: Arc<dyn MetricsSink>) -> Self {
		Self {
			inner: Arc::new(Mutex::new(Inner {
				store: LruStore::new(capacity),
				hits: 0,
				misses: 0,
				evictions: 0,
			})),
			metrics,
		}
	}

	/// Returns a copy of the value for `key`, refreshing its recency.
	pub fn get(&self, key: &str) -> Option<V> {
		let found = {
			let mut inner = self.inner.lock();
			let found = inner.store.get(key).cloned();
			if found.is_some() {
				inner.hits += 1;
			} else {
				inner.misses += 1;
			}
			found
		};

		if found.is_some() {
			self.metrics.increment(names::CACHE_HIT, 1);
			tracing::trace!(key, "cache hit");
		} else {
			self.metrics.increment(names::CACHE_MISS, 1);
			tracing::trace!(key, "cache miss");
		}
		found
	}

	/// Returns a copy of the value for `key` without touching recency or counters.
	pub fn peek(&self, key: &str) -> Option<V> {
		self.inner.lock().store.peek(key).cloned()
	}

	/// Stores `value` under `key`, evicting the least recently used entry when full.
	///
	/// Returns the evicted key, if any.
	pub fn set(&self, key: impl Into<String>, value: V) -> Option<String> {
		let evicted = {
			let mut inner = self.inner.lock();
			let evicted = inner.store.insert(key.into(), value);
			if evicted.is_some() {
				inner.evictions += 1;
			}
			evicted
		};

		if let Some(evicted) = &evicted {
			self.metrics.increment(names::CACHE_EVICTION, 1);
			tracing::debug!(key = %evicted, "evicted least recently used response");
		}
		evicted
	}

	/// Removes `key`. Returns whether it was present.
	pub fn delete(&self, key: &str) -> bool {
		self.inner.lock().store.remove(key)
	}

	/// Removes every entry. Counters are kept.
	pub fn clear(&self) {
		self.inner.lock().store.clear();
	}

	/// Removes every entry and zeroes the counters.
	pub fn reset(&self) {
		let mut inner = self.inner.lock();
		inner.store.clear();
		inner.hits = 0;
		inner.misses = 0;
		inner.evictions = 0;
	}

	/// Returns whether `key` is cached, without touching recency.
	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.lock().store.peek(key).is_some()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.inner.lock().store.len()
	}

	/// Returns true when the cache holds nothing.
	pub fn is_empty(&self) -> bool {
		self.inner.lock().store.is_empty()
	}

	/// Maximum number of entries.
	pub fn capacity(&self) -> usize {
		self.inner.lock().store.capacity()
	}

	/// Keys from least to most recently used.
	pub fn keys(&self) -> Vec<String> {
		self.inner
			.lock()
			.store
			.keys()
			.map(str::to_string)
			.collect()
	}

	/// Returns a snapshot of the counters.
	pub fn statistics(&self) -> CacheStatistics {
		let inner = self.inner.lock();
		CacheStatistics {
			hits: inner.hits,
			misses: inner.misses,
			evictions: inner.evictions,
			total_requests: inner.hits + inner.misses,
			entry_count: inner.store.len() as u64,
			capacity: inner.store.capacity() as u64,
		}
	}
}
