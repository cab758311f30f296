//! Debug and statistics module

use std::collections::VecDeque;

use crate::transform::PropagationStats;

/// Rolling history of per-tick propagation statistics
#[derive(Debug)]
pub struct PassHistory {
    /// Per-tick stats, oldest first
    samples: VecDeque<PropagationStats>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average recomputed entities per tick over the window
    avg_recomputed: f32,
    /// Largest recompute count in the window
    max_recomputed: usize,
    /// Total ticks recorded
    total_passes: u64,
    /// Total aborted subtrees since creation
    total_failures: u64,
}

impl PassHistory {
    /// Create a history keeping the last `max_samples` ticks
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            avg_recomputed: 0.0,
            max_recomputed: 0,
            total_passes: 0,
            total_failures: 0,
        }
    }

    /// Record one tick
    pub fn record(&mut self, stats: PropagationStats) {
        self.total_passes += 1;
        self.total_failures += stats.failed as u64;

        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(stats);

        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.samples.is_empty() {
            return;
        }

        let total: usize = self.samples.iter().map(|s| s.recomputed).sum();
        self.avg_recomputed = total as f32 / self.samples.len() as f32;
        self.max_recomputed = self
            .samples
            .iter()
            .map(|s| s.recomputed)
            .max()
            .unwrap_or(0);
    }

    /// Most recent tick, if any
    pub fn last(&self) -> Option<&PropagationStats> {
        self.samples.back()
    }

    /// Average recomputed entities per tick over the window
    pub fn avg_recomputed(&self) -> f32 {
        self.avg_recomputed
    }

    /// Largest recompute count in the window
    pub fn max_recomputed(&self) -> usize {
        self.max_recomputed
    }

    /// Total ticks recorded
    pub fn total_passes(&self) -> u64 {
        self.total_passes
    }

    /// Total aborted subtrees
    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        let last = self.last().copied().unwrap_or_default();
        format!(
            "Transforms: {} visited, {} recomputed (avg: {:.1}, max: {}) | failures: {}",
            last.visited,
            last.recomputed,
            self.avg_recomputed,
            self.max_recomputed,
            self.total_failures
        )
    }
}

impl Default for PassHistory {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(recomputed: usize, failed: usize) -> PropagationStats {
        PropagationStats {
            visited: 10,
            recomputed,
            reconciled: 0,
            failed,
        }
    }

    #[test]
    fn test_history_window() {
        let mut history = PassHistory::new(2);
        history.record(stats(8, 0));
        history.record(stats(2, 1));
        history.record(stats(4, 0));

        assert_eq!(history.total_passes(), 3);
        assert_eq!(history.total_failures(), 1);
        assert_eq!(history.max_recomputed(), 4);
        assert!((history.avg_recomputed() - 3.0).abs() < 0.001);
        assert_eq!(history.last().map(|s| s.recomputed), Some(4));
    }

    #[test]
    fn test_format_stats_empty() {
        let history = PassHistory::default();
        assert!(history.format_stats().contains("0 recomputed"));
    }
}
