//! Bounded FIFO of 0/1 samples with a running sum

use std::collections::VecDeque;

/// Fixed-capacity rolling window over binary samples.
///
/// The running sum always equals the number of 1s currently held, and the
/// window never holds more than `capacity` samples.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    samples: VecDeque<u8>,
    sum: u32,
}

impl RollingWindow {
    /// Create an empty window. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            sum: 0,
        }
    }

    /// Push a sample, evicting the oldest one once over capacity.
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, hit: bool) -> Option<u8> {
        let value = u8::from(hit);
        self.samples.push_back(value);
        self.sum += u32::from(value);

        if self.samples.len() > self.capacity {
            let evicted = self.samples.pop_front()?;
            self.sum -= u32::from(evicted);
            return Some(evicted);
        }
        None
    }

    /// Fraction of 1s in the window (0.0 when empty)
    pub fn rate(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            f64::from(self.sum) / self.samples.len() as f64
        }
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.samples.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_rate_is_zero() {
        let window = RollingWindow::new(5);
        assert!(window.is_empty());
        assert_eq!(window.rate(), 0.0);
    }

    #[test]
    fn test_eviction_keeps_sum_consistent() {
        let mut window = RollingWindow::new(3);
        let pattern = [true, true, false, true, false, false, true];
        for (i, hit) in pattern.iter().enumerate() {
            window.push(*hit);
            assert!(window.len() <= 3);
            let ones = window.iter().filter(|v| *v == 1).count() as u32;
            assert_eq!(window.sum(), ones, "sum drifted after sample {}", i);
        }
        // Last three samples: false, false, true
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![0, 0, 1]);
    }

    #[test]
    fn test_push_reports_evicted_sample() {
        let mut window = RollingWindow::new(2);
        assert_eq!(window.push(true), None);
        assert_eq!(window.push(false), None);
        assert_eq!(window.push(false), Some(1));
        assert_eq!(window.sum(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = RollingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(true);
        window.push(false);
        assert_eq!(window.len(), 1);
        assert_eq!(window.rate(), 0.0);
    }
}
