//! Cache statistics

/// Snapshot of response cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
	/// Number of lookups that found an entry
	pub hits: u64,
	/// Number of lookups that found nothing
	pub misses: u64,
	/// Number of entries removed to make room
	pub evictions: u64,
	/// Total number of lookups
	pub total_requests: u64,
	/// Current number of entries
	pub entry_count: u64,
	/// Maximum number of entries
	pub capacity: u64,
}

impl CacheStatistics {
	/// Calculate hit rate (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use weft_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 75,
	///     misses: 25,
	///     total_requests: 100,
	///     ..Default::default()
	/// };
	///
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.hits as f64 / self.total_requests as f64
		}
	}

	/// Calculate miss rate (0.0 to 1.0)
	pub fn miss_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.misses as f64 / self.total_requests as f64
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_statistics_hit_miss_rate_zero_requests() {
		let stats = CacheStatistics::default();
		assert_eq!(stats.hit_rate(), 0.0);
		assert_eq!(stats.miss_rate(), 0.0);
	}

	#[rstest]
	fn test_statistics_miss_rate() {
		let stats = CacheStatistics {
			hits: 1,
			misses: 3,
			total_requests: 4,
			..Default::default()
		};
		assert_eq!(stats.miss_rate(), 0.75);
	}
}
