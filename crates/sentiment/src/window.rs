//! Trailing-window statistics.
//!
//! Holds the last `capacity` observations of one series. Missing
//! observations occupy a slot but do not count toward `min_periods` and are
//! excluded from every statistic.

use ordered_float::OrderedFloat;
use statrs::statistics::{Data, Median};
use std::collections::VecDeque;

/// Rolling median / MAD / mean over a fixed number of observations.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Window size in observations.
    capacity: usize,
    /// Observations required for a statistic to be defined.
    min_periods: usize,
    /// Observations in arrival order.
    slots: VecDeque<Option<f64>>,
    /// Present values, kept sorted for the median.
    sorted: Vec<OrderedFloat<f64>>,
}

impl RollingWindow {
    /// Create a window. `capacity` is at least 1 and `min_periods` is clamped
    /// into `1..=capacity`.
    pub fn new(capacity: usize, min_periods: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            min_periods: min_periods.clamp(1, capacity),
            slots: VecDeque::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    /// Push an observation, evicting the oldest once full.
    pub fn push(&mut self, value: Option<f64>) {
        if self.slots.len() >= self.capacity {
            if let Some(Some(old)) = self.slots.pop_front() {
                if let Ok(i) = self.sorted.binary_search(&OrderedFloat(old)) {
                    self.sorted.remove(i);
                }
            }
        }

        let value = value.filter(|v| v.is_finite());
        self.slots.push_back(value);
        if let Some(v) = value {
            let key = OrderedFloat(v);
            let i = match self.sorted.binary_search(&key) {
                Ok(i) | Err(i) => i,
            };
            self.sorted.insert(i, key);
        }
    }

    /// Present observations in the window.
    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    /// Observation slots in the window, present or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Enough observations for statistics?
    pub fn is_ready(&self) -> bool {
        self.count() >= self.min_periods
    }

    /// Median of the present observations.
    pub fn median(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let n = self.sorted.len();
        let mid = n / 2;
        if n % 2 == 1 {
            Some(self.sorted[mid].0)
        } else {
            Some((self.sorted[mid - 1].0 + self.sorted[mid].0) / 2.0)
        }
    }

    /// Median absolute deviation from the window median.
    pub fn mad(&self) -> Option<f64> {
        let median = self.median()?;
        let deviations: Vec<f64> = self.sorted.iter().map(|v| (v.0 - median).abs()).collect();
        Some(Data::new(deviations).median())
    }

    /// Arithmetic mean of the present observations.
    pub fn mean(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        let sum: f64 = self.sorted.iter().map(|v| v.0).sum();
        Some(sum / self.sorted.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_not_ready() {
        let mut window = RollingWindow::new(5, 3);
        window.push(Some(1.0));
        window.push(Some(2.0));
        assert!(!window.is_ready());
        assert!(window.median().is_none());
        assert!(window.mad().is_none());
        assert!(window.mean().is_none());
    }

    #[test]
    fn test_median_odd_and_even() {
        let mut window = RollingWindow::new(10, 1);
        for v in [5.0, 1.0, 3.0] {
            window.push(Some(v));
        }
        assert_abs_diff_eq!(window.median().unwrap(), 3.0);

        window.push(Some(10.0));
        // 1, 3, 5, 10 -> (3 + 5) / 2
        assert_abs_diff_eq!(window.median().unwrap(), 4.0);
    }

    #[test]
    fn test_mad() {
        let mut window = RollingWindow::new(10, 1);
        // median 3; deviations 2, 1, 0, 1, 97 -> median 1
        for v in [1.0, 2.0, 3.0, 4.0, 100.0] {
            window.push(Some(v));
        }
        assert_abs_diff_eq!(window.mad().unwrap(), 1.0);
    }

    #[test]
    fn test_constant_series_has_zero_mad() {
        let mut window = RollingWindow::new(24, 24);
        for _ in 0..30 {
            window.push(Some(20.0));
        }
        assert_abs_diff_eq!(window.median().unwrap(), 20.0);
        assert_abs_diff_eq!(window.mad().unwrap(), 0.0);
    }

    #[test]
    fn test_eviction() {
        let mut window = RollingWindow::new(3, 1);
        for v in [100.0, 1.0, 2.0, 3.0] {
            window.push(Some(v));
        }
        assert_eq!(window.len(), 3);
        assert_abs_diff_eq!(window.mean().unwrap(), 2.0);
        assert_abs_diff_eq!(window.median().unwrap(), 2.0);
    }

    #[test]
    fn test_eviction_with_duplicates() {
        let mut window = RollingWindow::new(2, 1);
        window.push(Some(5.0));
        window.push(Some(5.0));
        window.push(Some(7.0));
        assert_eq!(window.count(), 2);
        assert_abs_diff_eq!(window.median().unwrap(), 6.0);
    }

    #[test]
    fn test_missing_values_hold_slots() {
        let mut window = RollingWindow::new(3, 2);
        window.push(Some(10.0));
        window.push(None);
        assert!(!window.is_ready());
        window.push(Some(20.0));
        assert!(window.is_ready());
        assert_abs_diff_eq!(window.mean().unwrap(), 15.0);

        // Evicts 10.0; the window now holds [None, 20, None].
        window.push(None);
        assert_eq!(window.count(), 1);
        assert!(window.mean().is_none());
    }

    #[test]
    fn test_min_periods_clamped() {
        let mut window = RollingWindow::new(2, 10);
        window.push(Some(1.0));
        window.push(Some(3.0));
        assert!(window.is_ready());

        let window = RollingWindow::new(0, 0);
        assert_eq!(window.len(), 0);
    }
}
