//! Prelude module for convenient imports.
//!
//! Re-exports the most commonly used types for ergonomic usage of the
//! feature derivation library.
//!
//! # Usage
//!
//! ```ignore
//! use trip_feature_extractor::prelude::*;
//!
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::from_config(config)?;
//! let output = pipeline.process_to("trips.csv", "features.csv")?;
//! ```

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::config::{ExperimentMetadata, FeatureConfig, PipelineConfig, RunnerConfig};
pub use crate::pipeline::{Pipeline, PipelineOutput};

// ============================================================================
// Aggregation
// ============================================================================

pub use crate::aggregator::{GroupRecord, WindowedStatAggregator};
pub use crate::runner::{GroupedFeatureRunner, RunOutput};

// ============================================================================
// Tables & Schema
// ============================================================================

pub use crate::schema::{FeatureDef, FeatureSchema, StatKind};
pub use crate::table::{AggregatedRow, AggregatedTable, TripTable};

// ============================================================================
// Statistics & Smoothing
// ============================================================================

pub use crate::smoothing::{backward_fill, fill_and_average, forward_fill};
pub use crate::stats::{round3, RunningStats};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::error::{FeatureError, Result};
