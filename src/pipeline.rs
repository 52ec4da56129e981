//! End-to-end derivation pipeline.
//!
//! [`Pipeline`] wires the pieces together: read a trip table from CSV, run
//! the parallel group runner, write the augmented table back out. It holds a
//! validated configuration and can process any number of files.
//!
//! # Example
//!
//! ```ignore
//! use trip_feature_extractor::prelude::*;
//!
//! let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//! let output = pipeline.process_to("trips.csv", "trips_with_features.csv")?;
//! println!(
//!     "{} rows in, {} rows out across {} groups",
//!     output.rows_read, output.rows_emitted, output.groups_processed
//! );
//! ```

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::runner::GroupedFeatureRunner;
use crate::table::{AggregatedTable, TripTable};
use std::path::Path;
use std::time::{Duration, Instant};

/// Output from one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The augmented table.
    pub table: AggregatedTable,

    /// Input row count.
    pub rows_read: usize,

    /// Output row count after all filtering.
    pub rows_emitted: usize,

    /// Number of groups processed.
    pub groups_processed: usize,

    /// Rows removed by the per-group warm-up cut.
    pub warmup_rows_dropped: usize,

    /// Rows removed by the global first-period filter.
    pub first_period_rows_dropped: usize,

    /// Wall-clock processing time.
    pub elapsed: Duration,
}

/// Main pipeline: CSV in → grouped feature derivation → CSV out.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    runner: GroupedFeatureRunner,
}

impl Pipeline {
    /// Create a pipeline from configuration, validating it first.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let runner = GroupedFeatureRunner::new(config.features.clone(), config.runner.clone())?;
        Ok(Self { config, runner })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Derive features for an in-memory table.
    pub fn run(&self, table: &TripTable) -> Result<PipelineOutput> {
        let start = Instant::now();
        let report = self.runner.run_with_report(table)?;
        Ok(PipelineOutput {
            rows_read: report.rows_read,
            rows_emitted: report.table.len(),
            groups_processed: report.groups_processed,
            warmup_rows_dropped: report.warmup_rows_dropped,
            first_period_rows_dropped: report.first_period_rows_dropped,
            table: report.table,
            elapsed: start.elapsed(),
        })
    }

    /// Read a CSV file and derive features.
    pub fn process<P: AsRef<Path>>(&self, input: P) -> Result<PipelineOutput> {
        let input = input.as_ref();
        tracing::debug!(path = %input.display(), "reading trip table");
        let table = TripTable::from_csv_path(input)?;
        self.run(&table)
    }

    /// Read a CSV file, derive features and write the augmented table.
    pub fn process_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<PipelineOutput> {
        let result = self.process(input)?;
        let output = output.as_ref();
        result.table.to_csv_path(output)?;
        tracing::info!(
            path = %output.display(),
            rows = result.rows_emitted,
            "wrote aggregated table"
        );
        Ok(result)
    }
}
