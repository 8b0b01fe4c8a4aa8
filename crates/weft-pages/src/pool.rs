//! Object pools.
//!
//! Nodes and render contexts are allocated per render and discarded right
//! after, so they are kept on free lists and reset in place instead. A pool
//! never holds more than its capacity; surplus instances are dropped.

use crate::node::{Child, Node};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_core::metrics::{MetricsSink, NoopMetrics, names};

/// A type that can be cleared in place and reused.
pub trait Reusable: Default + Send {
	/// Clears every field while keeping allocated capacity.
	fn reset(&mut self);
}

/// Metric names reported by one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMetricNames {
	/// Counter for instances constructed on an empty pool.
	pub created: &'static str,
	/// Counter for instances taken from the free list.
	pub reused: &'static str,
	/// Counter for instances returned to the free list.
	pub released: &'static str,
	/// Counter for instances dropped on a full pool.
	pub discarded: &'static str,
}

/// Metric names of the node pool.
pub const NODE_POOL_METRICS: PoolMetricNames = PoolMetricNames {
	created: names::POOL_NODE_CREATED,
	reused: names::POOL_NODE_REUSED,
	released: names::POOL_NODE_RELEASED,
	discarded: names::POOL_NODE_DISCARDED,
};

/// Metric names of the render context pool.
pub const CONTEXT_POOL_METRICS: PoolMetricNames = PoolMetricNames {
	created: names::POOL_CONTEXT_CREATED,
	reused: names::POOL_CONTEXT_REUSED,
	released: names::POOL_CONTEXT_RELEASED,
	discarded: names::POOL_CONTEXT_DISCARDED,
};

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatistics {
	/// Instances currently on the free list
	pub free: usize,
	/// Maximum free list length
	pub capacity: usize,
	/// Instances constructed because the free list was empty
	pub created: u64,
	/// Instances handed out from the free list
	pub reused: u64,
	/// Instances returned to the free list
	pub released: u64,
	/// Instances dropped because the free list was full
	pub discarded: u64,
}

/// Bounded free list of reusable instances.
pub struct ObjectPool<T> {
	free: Mutex<Vec<T>>,
	capacity: usize,
	names: PoolMetricNames,
	metrics: Arc<dyn MetricsSink>,
	created: AtomicU64,
	reused: AtomicU64,
	released: AtomicU64,
	discarded: AtomicU64,
}

impl<T> std::fmt::Debug for ObjectPool<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ObjectPool")
			.field("free", &self.free.lock().len())
			.field("capacity", &self.capacity)
			.finish()
	}
}

impl<T: Reusable> ObjectPool<T> {
	/// Creates an empty pool that reports nothing.
	pub fn new(capacity: usize, names: PoolMetricNames) -> Self {
		Self::with_metrics(capacity, names, Arc::new(NoopMetrics))
	}

	/// Creates an empty pool reporting to `metrics`.
	pub fn with_metrics(
		capacity: usize,
		names: PoolMetricNames,
		metrics: Arc<dyn MetricsSink>,
	) -> Self {
		Self {
			free: Mutex::new(Vec::new()),
			capacity,
			names,
			metrics,
			created: AtomicU64::new(0),
			reused: AtomicU64::new(0),
			released: AtomicU64::new(0),
			discarded: AtomicU64::new(0),
		}
	}

	/// Takes a free instance, or constructs one when none is available.
	pub fn acquire(&self) -> T {
		let recycled = self.free.lock().pop();
		match recycled {
			Some(item) => {
				self.reused.fetch_add(1, Ordering::Relaxed);
				self.metrics.increment(self.names.reused, 1);
				item
			}
			None => {
				self.created.fetch_add(1, Ordering::Relaxed);
				self.metrics.increment(self.names.created, 1);
				T::default()
			}
		}
	}

	/// Takes an instance and initializes it with `init`.
	pub fn acquire_with(&self, init: impl FnOnce(&mut T)) -> T {
		let mut item = self.acquire();
		init(&mut item);
		item
	}

	/// Resets `item` and returns it to the free list.
	///
	/// Returns `false` when the pool is full and the instance was dropped.
	pub fn release(&self, mut item: T) -> bool {
		item.reset();

		let mut free = self.free.lock();
		if free.len() >= self.capacity {
			drop(free);
			self.discarded.fetch_add(1, Ordering::Relaxed);
			self.metrics.increment(self.names.discarded, 1);
			return false;
		}
		free.push(item);
		drop(free);

		self.released.fetch_add(1, Ordering::Relaxed);
		self.metrics.increment(self.names.released, 1);
		true
	}

	/// Drops every free instance and zeroes the counters.
	pub fn clear(&self) {
		self.free.lock().clear();
		for counter in [&self.created, &self.reused, &self.released, &self.discarded] {
			counter.store(0, Ordering::Relaxed);
		}
	}

	/// Maximum free list length.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Returns a snapshot of the counters.
	pub fn statistics(&self) -> PoolStatistics {
		PoolStatistics {
			free: self.free.lock().len(),
			capacity: self.capacity,
			created: self.created.load(Ordering::Relaxed),
			reused: self.reused.load(Ordering::Relaxed),
			released: self.released.load(Ordering::Relaxed),
			discarded: self.discarded.load(Ordering::Relaxed),
		}
	}
}

impl ObjectPool<Node> {
	/// Returns a node and all of its descendants to the pool.
	///
	/// Children are recycled depth-first before the node's own fields are
	/// cleared, so no descendant stays reachable from a pooled instance.
	pub fn recycle(&self, mut node: Node) {
		for child in node.take_children() {
			if let Child::Element(element) = child {
				self.recycle(element);
			}
		}
		self.release(node);
	}
}
