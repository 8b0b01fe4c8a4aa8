//! Single-flight loading.
//!
//! At most one computation per key is in progress at any time. Callers that
//! miss the cache while a computation for their key is running join it and
//! receive the same result.
//!
//! The computation runs on a spawned task, so it completes and populates the
//! cache even if every caller stops waiting. The registry entry is removed by
//! a scope guard inside that task once the result is stored, whether the
//! computation succeeded, failed or panicked.

use crate::cache::ResponseCache;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use weft_core::metrics::{MetricsSink, NoopMetrics, names};

/// Failure of a single-flight computation, shared by every joined caller.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlightError<E> {
	/// The computation returned an error.
	#[error("{0}")]
	Failed(E),

	/// The computation task panicked or was cancelled by the runtime.
	#[error("Computation for '{key}' did not complete: {reason}")]
	Aborted {
		/// Key of the computation.
		key: String,
		/// Reason reported by the runtime.
		reason: String,
	},
}

type Pending<V, E> = Shared<BoxFuture<'static, Result<V, FlightError<E>>>>;

/// Registry of in-flight computations keyed by cache key.
pub struct SingleFlight<V, E> {
	inflight: Arc<Mutex<HashMap<String, Pending<V, E>>>>,
	metrics: Arc<dyn MetricsSink>,
}

impl<V, E> Clone for SingleFlight<V, E> {
	fn clone(&self) -> Self {
		Self {
			inflight: Arc::clone(&self.inflight),
			metrics: Arc::clone(&self.metrics),
		}
	}
}

impl<V, E> std::fmt::Debug for SingleFlight<V, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SingleFlight")
			.field("in_flight", &self.inflight.lock().len())
			.finish()
	}
}

impl<V, E> Default for SingleFlight<V, E> {
	fn default() -> Self {
		Self::with_metrics(Arc::new(NoopMetrics))
	}
}

impl<V, E> SingleFlight<V, E> {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty registry that reports joins to `metrics`.
	pub fn with_metrics(metrics: Arc<dyn MetricsSink>) -> Self {
		Self {
			inflight: Arc::new(Mutex::new(HashMap::new())),
			metrics,
		}
	}

	/// Number of computations currently in progress.
	pub fn in_flight(&self) -> usize {
		self.inflight.lock().len()
	}

	/// Returns whether a computation for `key` is in progress.
	pub fn is_in_flight(&self, key: &str) -> bool {
		self.inflight.lock().contains_key(key)
	}
}

impl<V, E> SingleFlight<V, E>
where
	V: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + 'static,
{
	/// Returns the cached value for `key`, or computes it at most once.
	///
	/// Checking the cache, looking up the registry and registering a new
	/// computation happen in one critical section. On success the value is
	/// stored in `cache` before the registry entry is removed.
	///
	/// Must be called from within a tokio runtime.
	///
	/// # Examples
	///
	/// ```
	/// use weft_cache::{ResponseCache, SingleFlight};
	///
	/// # #[tokio::main(flavor = "current_thread")]
	/// # async fn main() {
	/// let cache = ResponseCache::new(8);
	/// let flight: SingleFlight<String, String> = SingleFlight::new();
	///
	/// let html = flight
	///     .load(&cache, "home", || async { Ok("<p>home</p>".to_string()) })
	///     .await
	///     .unwrap();
	///
	/// assert_eq!(html, "<p>home</p>");
	/// assert_eq!(cache.peek("home").as_deref(), Some("<p>home</p>"));
	/// # }
	/// ```
	pub async fn load<F, Fut>(
		&self,
		cache: &ResponseCache<V>,
		key: &str,
		compute: F,
	) -> Result<V, FlightError<E>>
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<V, E>> + Send + 'static,
	{
		if let Some(value) = cache.get(key) {
			return Ok(value);
		}

		let pending = {
			let mut inflight = self.inflight.lock();

			// A computation may have finished between the lookup above and this lock
			if let Some(value) = cache.peek(key) {
				return Ok(value);
			}

			match inflight.get(key) {
				Some(pending) => {
					self.metrics.increment(names::CACHE_INFLIGHT_JOINED, 1);
					tracing::debug!(key, "joined in-flight computation");
					pending.clone()
				}
				None => {
					let pending = self.spawn(cache.clone(), key.to_string(), compute);
					inflight.insert(key.to_string(), pending.clone());
					pending
				}
			}
		};

		pending.await
	}

	fn spawn<F, Fut>(&self, cache: ResponseCache<V>, key: String, compute: F) -> Pending<V, E>
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = Result<V, E>> + Send + 'static,
	{
		let registry = Arc::clone(&self.inflight);
		let task_key = key.clone();
		let handle = tokio::spawn(async move {
			let guard_key = task_key.clone();
			scopeguard::defer! {
				registry.lock().remove(&guard_key);
			}

			let result = compute().await;
			if let Ok(value) = &result {
				cache.set(task_key, value.clone());
			}
			result
		});

		tracing::debug!(key = %key, "started computation");
		async move {
			match handle.await {
				Ok(result) => result.map_err(FlightError::Failed),
				Err(error) => Err(FlightError::Aborted {
					key,
					reason: error.to_string(),
				}),
			}
		}
		.boxed()
		.shared()
	}
}
