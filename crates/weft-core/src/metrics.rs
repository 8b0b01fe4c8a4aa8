//! Metrics reporting.
//!
//! The renderer reports named counters and timings through a [`MetricsSink`].
//! Collection and export belong to the host application; the sinks shipped
//! here either drop the samples, forward them to `tracing`, or keep them in
//! memory for inspection.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Metric names emitted by the Weft crates.
pub mod names {
	/// A pooled node was created because the pool was empty.
	pub const POOL_NODE_CREATED: &str = "pool.node.created";
	/// A pooled node was reused.
	pub const POOL_NODE_REUSED: &str = "pool.node.reused";
	/// A node was returned to the pool.
	pub const POOL_NODE_RELEASED: &str = "pool.node.released";
	/// A node was dropped because the pool was full.
	pub const POOL_NODE_DISCARDED: &str = "pool.node.discarded";
	/// A render context was created because the pool was empty.
	pub const POOL_CONTEXT_CREATED: &str = "pool.context.created";
	/// A render context was reused.
	pub const POOL_CONTEXT_REUSED: &str = "pool.context.reused";
	/// A render context was returned to the pool.
	pub const POOL_CONTEXT_RELEASED: &str = "pool.context.released";
	/// A render context was dropped because the pool was full.
	pub const POOL_CONTEXT_DISCARDED: &str = "pool.context.discarded";
	/// A cache lookup found an entry.
	pub const CACHE_HIT: &str = "cache.hit";
	/// A cache lookup found nothing.
	pub const CACHE_MISS: &str = "cache.miss";
	/// The least recently used entry was evicted.
	pub const CACHE_EVICTION: &str = "cache.eviction";
	/// A request joined a render already in flight for the same key.
	pub const CACHE_INFLIGHT_JOINED: &str = "cache.inflight.joined";
	/// A document render completed.
	pub const RENDER_COUNT: &str = "render.count";
	/// Time spent rendering a document.
	pub const RENDER_DURATION: &str = "render.duration";
	/// A page builder failed.
	pub const BUILD_FAILED: &str = "build.failed";
}

/// Receiver of named counters and timings.
pub trait MetricsSink: Send + Sync {
	/// Adds `by` to the counter `name`.
	fn increment(&self, name: &'static str, by: u64);

	/// Records a duration sample for `name`.
	fn timing(&self, name: &'static str, elapsed: Duration);
}

/// Sink that discards every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
	fn increment(&self, _name: &'static str, _by: u64) {}

	fn timing(&self, _name: &'static str, _elapsed: Duration) {}
}

/// Sink that emits each sample as a `tracing` event at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
	fn increment(&self, name: &'static str, by: u64) {
		tracing::trace!(metric = name, by, "counter");
	}

	fn timing(&self, name: &'static str, elapsed: Duration) {
		tracing::trace!(metric = name, elapsed_us = elapsed.as_micros() as u64, "timing");
	}
}

/// Sink that accumulates samples in memory.
///
/// # Examples
///
/// ```
/// use weft_core::metrics::{CounterMetrics, MetricsSink};
///
/// let metrics = CounterMetrics::new();
/// metrics.increment("cache.hit", 1);
/// metrics.increment("cache.hit", 2);
///
/// assert_eq!(metrics.counter("cache.hit"), 3);
/// assert_eq!(metrics.counter("cache.miss"), 0);
/// ```
#[derive(Debug, Default)]
pub struct CounterMetrics {
	counters: Mutex<HashMap<&'static str, u64>>,
	timings: Mutex<HashMap<&'static str, Vec<Duration>>>,
}

impl CounterMetrics {
	/// Creates an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the current value of a counter.
	pub fn counter(&self, name: &str) -> u64 {
		self.counters.lock().get(name).copied().unwrap_or(0)
	}

	/// Returns the number of timing samples recorded for `name`.
	pub fn timing_count(&self, name: &str) -> usize {
		self.timings.lock().get(name).map_or(0, Vec::len)
	}

	/// Returns a copy of all counters.
	pub fn counters(&self) -> HashMap<&'static str, u64> {
		self.counters.lock().clone()
	}

	/// Clears all samples.
	pub fn reset(&self) {
		self.counters.lock().clear();
		self.timings.lock().clear();
	}
}

impl MetricsSink for CounterMetrics {
	fn increment(&self, name: &'static str, by: u64) {
		*self.counters.lock().entry(name).or_insert(0) += by;
	}

	fn timing(&self, name: &'static str, elapsed: Duration) {
		self.timings.lock().entry(name).or_default().push(elapsed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::Arc;

	#[rstest]
	fn test_counter_metrics_accumulates() {
		let metrics = CounterMetrics::new();
		metrics.increment(names::CACHE_MISS, 1);
		metrics.increment(names::CACHE_MISS, 1);
		metrics.timing(names::RENDER_DURATION, Duration::from_millis(3));

		assert_eq!(metrics.counter(names::CACHE_MISS), 2);
		assert_eq!(metrics.timing_count(names::RENDER_DURATION), 1);

		metrics.reset();
		assert_eq!(metrics.counter(names::CACHE_MISS), 0);
		assert_eq!(metrics.timing_count(names::RENDER_DURATION), 0);
	}

	#[rstest]
	fn test_sinks_are_object_safe() {
		let sinks: Vec<Arc<dyn MetricsSink>> = vec![
			Arc::new(NoopMetrics),
			Arc::new(TracingMetrics),
			Arc::new(CounterMetrics::new()),
		];
		for sink in &sinks {
			sink.increment(names::POOL_NODE_CREATED, 1);
			sink.timing(names::RENDER_DURATION, Duration::ZERO);
		}
	}

	#[rstest]
	fn test_counter_metrics_concurrent_increments() {
		let metrics = Arc::new(CounterMetrics::new());
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let metrics = Arc::clone(&metrics);
				std::thread::spawn(move || {
					for _ in 0..100 {
						metrics.increment(names::CACHE_HIT, 1);
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}
		assert_eq!(metrics.counter(names::CACHE_HIT), 800);
	}
}
