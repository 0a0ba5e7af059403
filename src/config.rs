use std::time::Duration;

/// Roughly 30 Hz.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_micros(33_333);
pub const DEFAULT_SORT_BUDGET: Duration = Duration::from_millis(33);
pub const DEFAULT_RESULT_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    /// Minimum spacing between two sorts started by the background worker.
    pub throttle_interval: Duration,
    /// Sorts slower than this are reported with a warning.
    pub sort_budget: Duration,
    /// Bound of the sorted-indices channel.
    pub result_capacity: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            sort_budget: DEFAULT_SORT_BUDGET,
            result_capacity: DEFAULT_RESULT_CAPACITY,
        }
    }
}

impl SortConfig {
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    pub fn with_sort_budget(mut self, budget: Duration) -> Self {
        self.sort_budget = budget;
        self
    }

    /// Zero is bumped to one so the worker can always hand off a result.
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = SortConfig::default()
            .with_throttle_interval(Duration::from_millis(5))
            .with_sort_budget(Duration::from_millis(1))
            .with_result_capacity(0);
        assert_eq!(config.throttle_interval, Duration::from_millis(5));
        assert_eq!(config.sort_budget, Duration::from_millis(1));
        assert_eq!(config.result_capacity, 1);
        assert_eq!(SortConfig::default().result_capacity, DEFAULT_RESULT_CAPACITY);
    }
}
