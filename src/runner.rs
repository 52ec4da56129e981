//! Parallel per-group feature derivation.
//!
//! [`GroupedFeatureRunner`] partitions an input table into independent
//! groups, dispatches each group to a
//! [`WindowedStatAggregator`](crate::aggregator::WindowedStatAggregator) on a
//! worker pool, concatenates the results and applies the global first-period
//! filter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    GroupedFeatureRunner                      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                  Rayon Thread Pool                     │  │
//! │  │                                                        │  │
//! │  │  group "3_7"      group "4_1"      group "0_2"         │  │
//! │  │  ┌──────────┐    ┌──────────┐    ┌──────────┐          │  │
//! │  │  │aggregate │    │aggregate │    │aggregate │          │  │
//! │  │  └────┬─────┘    └────┬─────┘    └────┬─────┘          │  │
//! │  └───────┼───────────────┼───────────────┼────────────────┘  │
//! │          ▼               ▼               ▼                   │
//! │       concatenate → first-period filter → AggregatedTable    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each group task owns its working copy of the rows, so the tasks share no
//! mutable state and need no synchronization beyond the final join. Any
//! group failure (for example a malformed timestamp) aborts the whole run:
//! partially aggregated tables are never returned, because a silently
//! incomplete feature table would corrupt all downstream model training.
//!
//! Output row order within a group follows the group's timestamp order;
//! group-to-group order in the concatenation is unspecified.

use crate::aggregator::{GroupRecord, WindowedStatAggregator};
use crate::config::{FeatureConfig, RunnerConfig};
use crate::error::{FeatureError, Result};
use crate::table::{AggregatedRow, AggregatedTable, TripTable};
use ahash::AHashMap;
use rayon::prelude::*;

/// Output of a run, with row accounting.
///
/// `rows_read == table.len() + warmup_rows_dropped + first_period_rows_dropped`
/// always holds: no row is duplicated or silently lost.
#[derive(Debug)]
pub struct RunOutput {
    /// Concatenated, filtered output table.
    pub table: AggregatedTable,
    /// Number of groups the input was partitioned into.
    pub groups_processed: usize,
    /// Input row count.
    pub rows_read: usize,
    /// Rows removed by the per-group warm-up cut.
    pub warmup_rows_dropped: usize,
    /// Rows removed by the global first-period filter.
    pub first_period_rows_dropped: usize,
}

/// Resolved indices of the configured columns in the input header.
struct ColumnLayout {
    timestamp: usize,
    date: usize,
    group_keys: Vec<usize>,
    targets: Vec<usize>,
}

/// Per-group aggregation result, before concatenation.
struct GroupResult {
    rows: Vec<AggregatedRow>,
    input_rows: usize,
    input_min_date: i64,
}

/// Partitions a table by group key and runs the aggregator per group in
/// parallel.
#[derive(Debug, Clone)]
pub struct GroupedFeatureRunner {
    features: FeatureConfig,
    runner: RunnerConfig,
    aggregator: WindowedStatAggregator,
}

impl GroupedFeatureRunner {
    /// Create a runner, validating the feature configuration up front.
    pub fn new(features: FeatureConfig, runner: RunnerConfig) -> Result<Self> {
        features.validate()?;
        let aggregator = WindowedStatAggregator::new(&features);
        Ok(Self {
            features,
            runner,
            aggregator,
        })
    }

    /// Feature configuration in use.
    pub fn feature_config(&self) -> &FeatureConfig {
        &self.features
    }

    /// Runner configuration in use.
    pub fn runner_config(&self) -> &RunnerConfig {
        &self.runner
    }

    /// Derive features for the whole table.
    pub fn run(&self, table: &TripTable) -> Result<AggregatedTable> {
        Ok(self.run_with_report(table)?.table)
    }

    /// Derive features and report row accounting alongside the table.
    pub fn run_with_report(&self, table: &TripTable) -> Result<RunOutput> {
        let layout = self.resolve_columns(table)?;
        let groups = partition(table, &layout.group_keys);
        tracing::debug!(
            rows = table.len(),
            groups = groups.len(),
            threads = self.runner.effective_threads(),
            "partitioned input table"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.runner.effective_threads())
            .build()
            .map_err(|e| FeatureError::ThreadPool(e.to_string()))?;

        // collect() on Result short-circuits: the first failing group
        // aborts the run and discards every other group's output.
        let results: Vec<GroupResult> = pool.install(|| {
            groups
                .par_iter()
                .map(|(key, indices)| self.process_group(table, &layout, key, indices))
                .collect::<Result<Vec<_>>>()
        })?;

        // The first-period filter compares against the minimum date of the
        // *input* table, so groups whose early rows all fell to the warm-up
        // cut still filter against the true first day.
        let min_date = results
            .iter()
            .filter(|g| g.input_rows > 0)
            .map(|g| g.input_min_date)
            .min();

        let schema = self.features.schema();
        let groups_processed = results.len();
        let mut out = AggregatedTable::new(table.headers(), &schema);
        let mut warmup_rows_dropped = 0;
        let mut first_period_rows_dropped = 0;

        for group in results {
            warmup_rows_dropped += group.input_rows - group.rows.len();
            for row in group.rows {
                if self.features.drop_first_period && Some(row.date) == min_date {
                    first_period_rows_dropped += 1;
                    continue;
                }
                out.push(row);
            }
        }

        tracing::info!(
            rows_read = table.len(),
            rows_emitted = out.len(),
            groups = groups_processed,
            warmup_rows_dropped,
            first_period_rows_dropped,
            "derived windowed features"
        );

        Ok(RunOutput {
            rows_read: table.len(),
            table: out,
            groups_processed,
            warmup_rows_dropped,
            first_period_rows_dropped,
        })
    }

    /// Resolve all configured column names against the header, failing fast
    /// on the first missing column.
    fn resolve_columns(&self, table: &TripTable) -> Result<ColumnLayout> {
        let timestamp = table.require_column(&self.features.timestamp_column)?;
        let date = table.require_column(&self.features.date_column)?;
        let group_keys = self
            .features
            .group_key_columns
            .iter()
            .map(|name| table.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        let targets = self
            .features
            .targets
            .iter()
            .map(|name| table.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(ColumnLayout {
            timestamp,
            date,
            group_keys,
            targets,
        })
    }

    /// Parse and aggregate one group (runs on a worker thread).
    fn process_group(
        &self,
        table: &TripTable,
        layout: &ColumnLayout,
        key: &[String],
        indices: &[usize],
    ) -> Result<GroupResult> {
        let mut records = Vec::with_capacity(indices.len());
        let mut input_min_date = i64::MAX;

        for &row_index in indices {
            let row = &table.rows()[row_index];

            let in_time = parse_i64(&row[layout.timestamp], &self.features.timestamp_column)
                .map_err(|m| FeatureError::group(key, m))?;
            let date = parse_i64(&row[layout.date], &self.features.date_column)
                .map_err(|m| FeatureError::group(key, m))?;

            let mut targets = Vec::with_capacity(layout.targets.len());
            for (column_index, name) in layout.targets.iter().zip(&self.features.targets) {
                let value = parse_f64(&row[*column_index], name)
                    .map_err(|m| FeatureError::group(key, m))?;
                targets.push(value);
            }

            input_min_date = input_min_date.min(date);
            records.push(GroupRecord {
                cells: row.clone(),
                in_time,
                date,
                targets,
            });
        }

        let input_rows = records.len();
        let rows = self.aggregator.aggregate(records);
        Ok(GroupResult {
            rows,
            input_rows,
            input_min_date,
        })
    }
}

/// Partition row indices by the values of the group-key columns, preserving
/// row order within each group.
fn partition(table: &TripTable, group_keys: &[usize]) -> Vec<(Vec<String>, Vec<usize>)> {
    let mut groups: AHashMap<Vec<String>, Vec<usize>> = AHashMap::new();
    for (row_index, row) in table.rows().iter().enumerate() {
        let key: Vec<String> = group_keys.iter().map(|&i| row[i].clone()).collect();
        groups.entry(key).or_default().push(row_index);
    }
    groups.into_iter().collect()
}

fn parse_i64(cell: &str, column: &str) -> std::result::Result<i64, String> {
    cell.trim()
        .parse::<i64>()
        .map_err(|_| format!("column '{column}': cannot parse '{cell}' as an integer"))
}

fn parse_f64(cell: &str, column: &str) -> std::result::Result<f64, String> {
    cell.trim()
        .parse::<f64>()
        .map_err(|_| format!("column '{column}': cannot parse '{cell}' as a number"))
}
