//! Weft Cache
//!
//! Response caching for rendered pages:
//!
//! - [`LruStore`]: single-threaded least-recently-used map
//! - [`ResponseCache`]: shared, bounded LRU cache with hit/miss/eviction counters
//! - [`SingleFlight`]: at most one in-progress computation per key
//!
//! ## Example
//!
//! ```
//! use weft_cache::{ResponseCache, SingleFlight};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = ResponseCache::new(100);
//! let flight: SingleFlight<String, String> = SingleFlight::new();
//!
//! let first = flight.load(&cache, "/about", || async { Ok("<h1>About</h1>".to_string()) }).await;
//! let second = flight.load(&cache, "/about", || async { Err("not called".to_string()) }).await;
//!
//! assert_eq!(first, second);
//! # }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod single_flight;
pub mod statistics;
pub mod store;

pub use cache::ResponseCache;
pub use single_flight::{FlightError, SingleFlight};
pub use statistics::CacheStatistics;
pub use store::LruStore;
