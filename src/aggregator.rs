//! Windowed statistics over one origin-destination group.
//!
//! [`WindowedStatAggregator`] is the analytical core of the crate. Given the
//! trip records of a single group, it computes, for every record past the
//! group's warm-up period, the trailing mean and sample standard deviation of
//! each target column over `W` fixed windows, then smooths remaining gaps.
//!
//! # Algorithm
//!
//! ```text
//!                         record at t
//!                              │
//!   ◄──── window W ── ... ── window 2 ──── window 1 ────┤
//!   [t−W·G, t−(W−1)·G)   [t−2G, t−G)      [t−G, t)      t
//! ```
//!
//! 1. Sort the group by entry timestamp (duplicates allowed).
//! 2. Drop records with `t < t_min + W·G`; they lack enough history to fill
//!    every window. This per-group warm-up is distinct from the global
//!    first-period filter applied after concatenation.
//! 3. For each surviving record, target and window: take the mean and sample
//!    std of the target values inside the window interval. An empty interval
//!    is retried at the same time-of-day one daily cycle earlier, up to
//!    `max_backtracks` cycles; the first non-empty interval wins. If every
//!    attempt is empty, both statistics are NaN. Results are rounded to
//!    three decimals.
//! 4. Smooth each derived column with a forward-fill/backward-fill average
//!    (see [`smoothing`](crate::smoothing)).
//!
//! Interval lookups run as binary searches over the sorted timestamp array,
//! so a group aggregates in `O(n · W · (K+1) · log n)` instead of rescanning
//! all records per window.
//!
//! # Example
//!
//! ```ignore
//! use trip_feature_extractor::aggregator::{GroupRecord, WindowedStatAggregator};
//!
//! let aggregator = WindowedStatAggregator::new(&config.features);
//! let rows = aggregator.aggregate(group_records);
//! ```

use crate::config::FeatureConfig;
use crate::smoothing::fill_and_average;
use crate::stats::{round3, RunningStats};
use crate::table::AggregatedRow;

/// One parsed record of a group, ready for aggregation.
///
/// `cells` carries the original row verbatim; it is moved into the output
/// unchanged. `targets` is aligned with the configured target columns.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    /// Original raw cells of the input row.
    pub cells: Vec<String>,
    /// Entry timestamp.
    pub in_time: i64,
    /// Pre-derived date.
    pub date: i64,
    /// Parsed target values, one per configured target column.
    pub targets: Vec<f64>,
}

/// Trailing-window mean/std aggregation for a single group.
#[derive(Debug, Clone)]
pub struct WindowedStatAggregator {
    window_count: usize,
    window_gap: i64,
    backtrack_period: i64,
    max_backtracks: usize,
    target_count: usize,
}

impl WindowedStatAggregator {
    /// Create an aggregator from a validated configuration.
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            window_count: config.window_count,
            window_gap: config.window_gap,
            backtrack_period: config.backtrack_period,
            max_backtracks: config.max_backtracks,
            target_count: config.targets.len(),
        }
    }

    /// Timestamp below which a record lacks full window history.
    fn warmup_threshold(&self, t_min: i64) -> i64 {
        t_min + self.window_count as i64 * self.window_gap
    }

    /// Aggregate one group.
    ///
    /// Returns the surviving records in timestamp order, each annotated with
    /// `2 × targets × W` derived values. A group whose records all fall in
    /// the warm-up period yields an empty vector; that is a valid result,
    /// not an error.
    pub fn aggregate(&self, mut records: Vec<GroupRecord>) -> Vec<AggregatedRow> {
        if records.is_empty() {
            return Vec::new();
        }
        debug_assert!(records.iter().all(|r| r.targets.len() == self.target_count));

        records.sort_by_key(|r| r.in_time);

        // Lookup index: sorted timestamps plus target-major value columns.
        // Warm-up records stay visible to window lookups even though they
        // produce no output rows themselves.
        let timestamps: Vec<i64> = records.iter().map(|r| r.in_time).collect();
        let values: Vec<Vec<f64>> = (0..self.target_count)
            .map(|t| records.iter().map(|r| r.targets[t]).collect())
            .collect();

        let threshold = self.warmup_threshold(timestamps[0]);
        let start = timestamps.partition_point(|&t| t < threshold);
        let surviving = records.split_off(start);

        let feature_width = self.target_count * self.window_count * 2;
        let mut out = Vec::with_capacity(surviving.len());

        for record in surviving {
            let t = record.in_time;
            let mut features = vec![f64::NAN; feature_width];

            for target_index in 0..self.target_count {
                for window in 1..=self.window_count {
                    let lower = t - self.window_gap * window as i64;
                    let upper = t - self.window_gap * (window as i64 - 1);
                    let (mean, std) =
                        self.window_stats(&timestamps, &values[target_index], lower, upper);

                    let slot = (target_index * self.window_count + (window - 1)) * 2;
                    features[slot] = round3(mean);
                    features[slot + 1] = round3(std);
                }
            }

            out.push(AggregatedRow {
                cells: record.cells,
                in_time: record.in_time,
                date: record.date,
                features,
            });
        }

        self.smooth(&mut out, feature_width);
        out
    }

    /// Mean and sample std of the first non-empty interval among
    /// `[lower − P·k, upper − P·k)` for `k = 0..=max_backtracks`.
    fn window_stats(&self, timestamps: &[i64], values: &[f64], lower: i64, upper: i64) -> (f64, f64) {
        for k in 0..=self.max_backtracks as i64 {
            let shift = self.backtrack_period * k;
            let lo = timestamps.partition_point(|&t| t < lower - shift);
            let hi = timestamps.partition_point(|&t| t < upper - shift);
            if lo < hi {
                let stats = RunningStats::from_values(&values[lo..hi]);
                return (stats.mean(), stats.sample_std());
            }
        }
        (f64::NAN, f64::NAN)
    }

    /// Fill-and-average pass over every derived column, in record order.
    fn smooth(&self, rows: &mut [AggregatedRow], feature_width: usize) {
        let mut column = vec![0.0; rows.len()];
        for j in 0..feature_width {
            for (i, row) in rows.iter().enumerate() {
                column[i] = row.features[j];
            }
            fill_and_average(&mut column);
            for (row, &value) in rows.iter_mut().zip(column.iter()) {
                row.features[j] = value;
            }
        }
    }
}
