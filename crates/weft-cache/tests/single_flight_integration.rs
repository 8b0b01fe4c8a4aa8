//! Concurrency tests for the response cache and single-flight registry.

use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use weft_cache::{FlightError, ResponseCache, SingleFlight};
use weft_core::metrics::{CounterMetrics, names};

#[rstest]
#[case(2)]
#[case(16)]
#[case(64)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_invoke_builder_once(#[case] callers: usize) {
	let metrics = Arc::new(CounterMetrics::new());
	let cache = ResponseCache::with_metrics(8, metrics.clone());
	let flight: SingleFlight<String, String> = SingleFlight::with_metrics(metrics.clone());
	let calls = Arc::new(AtomicUsize::new(0));

	let tasks: Vec<_> = (0..callers)
		.map(|_| {
			let cache = cache.clone();
			let flight = flight.clone();
			let calls = Arc::clone(&calls);
			tokio::spawn(async move {
				flight
					.load(&cache, "page", move || async move {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(30)).await;
						Ok("<main>rendered</main>".to_string())
					})
					.await
			})
		})
		.collect();

	let results = futures::future::join_all(tasks).await;

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	for result in results {
		assert_eq!(result.unwrap(), Ok("<main>rendered</main>".to_string()));
	}
	assert_eq!(flight.in_flight(), 0);
	assert_eq!(cache.peek("page").as_deref(), Some("<main>rendered</main>"));
	assert!(metrics.counter(names::CACHE_INFLIGHT_JOINED) <= (callers - 1) as u64);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_joined_callers_share_failure() {
	let cache: ResponseCache<String> = ResponseCache::new(8);
	let flight: SingleFlight<String, String> = SingleFlight::new();
	let calls = Arc::new(AtomicUsize::new(0));

	let tasks: Vec<_> = (0..8)
		.map(|_| {
			let cache = cache.clone();
			let flight = flight.clone();
			let calls = Arc::clone(&calls);
			tokio::spawn(async move {
				flight
					.load(&cache, "broken", move || async move {
						calls.fetch_add(1, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(30)).await;
						Err("template missing".to_string())
					})
					.await
			})
		})
		.collect();

	for result in futures::future::join_all(tasks).await {
		assert_eq!(
			result.unwrap(),
			Err(FlightError::Failed("template missing".to_string()))
		);
	}
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(cache.is_empty());
	assert_eq!(flight.in_flight(), 0);
}

#[rstest]
#[tokio::test]
async fn test_distinct_keys_run_independently() {
	let cache = ResponseCache::new(8);
	let flight: SingleFlight<String, String> = SingleFlight::new();

	let (a, b) = tokio::join!(
		flight.load(&cache, "a", || async { Ok("A".to_string()) }),
		flight.load(&cache, "b", || async { Ok("B".to_string()) }),
	);

	assert_eq!(a, Ok("A".to_string()));
	assert_eq!(b, Ok("B".to_string()));
	assert_eq!(cache.len(), 2);
}

#[rstest]
#[tokio::test]
async fn test_cached_value_skips_builder() {
	let cache = ResponseCache::new(8);
	cache.set("home", "cached".to_string());
	let flight: SingleFlight<String, String> = SingleFlight::new();

	let value = flight
		.load(&cache, "home", || async { Err("should not run".to_string()) })
		.await;

	assert_eq!(value, Ok("cached".to_string()));
	assert_eq!(cache.statistics().hits, 1);
}

#[rstest]
fn test_lru_eviction_prefers_stale_reads() {
	let cache = ResponseCache::new(3);
	cache.set("a", 1);
	cache.set("b", 2);
	cache.set("c", 3);
	cache.get("a");
	cache.get("b");

	assert_eq!(cache.set("d", 4).as_deref(), Some("c"));
	assert_eq!(cache.keys(), vec!["a", "b", "d"]);
}
