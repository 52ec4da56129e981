//! Trip Feature Extractor
//!
//! Trailing-window travel-time feature derivation for traffic-simulation
//! trip records.
//!
//! # Overview
//!
//! Given a table of per-vehicle trip records, this library derives, for each
//! record, the recent mean and sample standard deviation of one or more
//! target columns (typically travel time), computed over fixed trailing time
//! windows *within the record's origin-destination group*. When a window is
//! empty, the lookup backtracks one simulated day at a time to the same
//! time-of-day interval; remaining gaps are smoothed by a forward/backward
//! fill-and-average pass.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Trip Feature Extractor                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  table       - CSV I/O, input/output table types                │
//! │  aggregator  - per-group windowed mean/std with backtracking    │
//! │  runner      - group partitioning + parallel dispatch (rayon)   │
//! │  smoothing   - forward/backward fill-and-average gap smoothing  │
//! │  stats       - Welford mean/variance accumulator                │
//! │  schema      - deterministic derived-column naming              │
//! │  config      - TOML/JSON configuration with validation          │
//! │  pipeline    - CSV in → runner → CSV out orchestration          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use trip_feature_extractor::prelude::*;
//!
//! // Six 600-step windows over Travel Time, grouped by OD bucket
//! let config = PipelineConfig::default();
//!
//! let pipeline = Pipeline::from_config(config)?;
//! let output = pipeline.process_to("VehicleData.csv", "VehicleData_time.csv")?;
//!
//! println!("{} rows emitted", output.rows_emitted);
//! ```
//!
//! Groups are processed in parallel; within a group, output rows follow the
//! group's timestamp order. Group-to-group order in the final table is
//! unspecified; sort explicitly if a deterministic total order is needed.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod runner;
pub mod schema;
pub mod smoothing;
pub mod stats;
pub mod table;

// Re-exports - Configuration
pub use config::{ExperimentMetadata, FeatureConfig, PipelineConfig, RunnerConfig};

// Re-exports - Core components
pub use aggregator::{GroupRecord, WindowedStatAggregator};
pub use runner::{GroupedFeatureRunner, RunOutput};

// Re-exports - Tables & schema
pub use schema::{FeatureDef, FeatureSchema, StatKind};
pub use table::{AggregatedRow, AggregatedTable, TripTable};

// Re-exports - Pipeline
pub use pipeline::{Pipeline, PipelineOutput};

// Re-exports - Error handling
pub use error::{FeatureError, Result};
