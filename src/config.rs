//! Pipeline configuration management.
//!
//! Unified configuration for feature derivation and the parallel group
//! runner, with TOML/JSON serialization for experiment reproducibility.
//!
//! # Example
//!
//! ```ignore
//! use trip_feature_extractor::config::PipelineConfig;
//!
//! // Create configuration
//! let config = PipelineConfig::default();
//!
//! // Save to file
//! config.save_toml("experiment_config.toml")?;
//!
//! // Load from file
//! let loaded = PipelineConfig::load_toml("experiment_config.toml")?;
//!
//! // Use with pipeline
//! let pipeline = Pipeline::from_config(loaded)?;
//! ```
//!
//! # Defaults
//!
//! Defaults reproduce the reference simulation setup: six trailing windows of
//! 600 time steps over `Travel Time`, grouped by `OD_Dig_2`, backtracking up
//! to five simulated days of 57 600 steps each, first simulated day dropped.

use crate::error::{FeatureError, Result};
use crate::schema::FeatureSchema;
use std::fs;
use std::path::Path;

/// Configuration for windowed feature derivation.
///
/// Consumed by [`WindowedStatAggregator`](crate::aggregator::WindowedStatAggregator)
/// and [`GroupedFeatureRunner`](crate::runner::GroupedFeatureRunner).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeatureConfig {
    /// Number of trailing windows per target (W). Window 1 is the most
    /// recent interval, window W the most distant.
    pub window_count: usize,

    /// Width of each window in timestamp units (G).
    pub window_gap: i64,

    /// Target columns the trailing statistics are computed over.
    pub targets: Vec<String>,

    /// Columns whose values define a group. Windows never cross group
    /// boundaries.
    pub group_key_columns: Vec<String>,

    /// Length of one daily cycle in timestamp units (P). When a window is
    /// empty, the lookup retries at the same time-of-day interval this many
    /// steps earlier. A single crate-wide value; inputs mixing scenarios
    /// with different daily-cycle lengths are not modeled.
    pub backtrack_period: i64,

    /// Maximum number of daily cycles to search backward (K). A window is
    /// attempted `K + 1` times in total, including the unshifted interval.
    pub max_backtracks: usize,

    /// Drop output rows whose date equals the minimum date observed in the
    /// input table. The first simulated day is unreliable because its own
    /// look-back spans the start of data collection.
    pub drop_first_period: bool,

    /// Name of the numeric entry-timestamp column.
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// Name of the pre-derived date column used by the first-period filter.
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_timestamp_column() -> String {
    "In Time".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_count: 6,
            window_gap: 600,
            targets: vec!["Travel Time".to_string()],
            group_key_columns: vec!["OD_Dig_2".to_string()],
            backtrack_period: 57_600,
            max_backtracks: 5,
            drop_first_period: true,
            timestamp_column: default_timestamp_column(),
            date_column: default_date_column(),
        }
    }
}

impl FeatureConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set window count and gap.
    pub fn with_windows(mut self, count: usize, gap: i64) -> Self {
        self.window_count = count;
        self.window_gap = gap;
        self
    }

    /// Set the target columns.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the group key columns.
    pub fn with_group_keys<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the backtracking parameters (daily-cycle length and max cycles).
    pub fn with_backtracking(mut self, period: i64, max_backtracks: usize) -> Self {
        self.backtrack_period = period;
        self.max_backtracks = max_backtracks;
        self
    }

    /// Enable or disable the first-period row filter.
    pub fn with_drop_first_period(mut self, drop: bool) -> Self {
        self.drop_first_period = drop;
        self
    }

    /// Override the timestamp column name.
    pub fn with_timestamp_column(mut self, name: impl Into<String>) -> Self {
        self.timestamp_column = name.into();
        self
    }

    /// Override the date column name.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = name.into();
        self
    }

    /// Derived-column schema for this configuration.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(&self.targets, self.window_count)
    }

    /// Validate the configuration. Fails before any group processing begins.
    pub fn validate(&self) -> Result<()> {
        if self.window_count == 0 {
            return Err(FeatureError::config("window_count must be >= 1"));
        }
        if self.window_gap <= 0 {
            return Err(FeatureError::config("window_gap must be > 0"));
        }
        if self.targets.is_empty() {
            return Err(FeatureError::config("targets must not be empty"));
        }
        if self.group_key_columns.is_empty() {
            return Err(FeatureError::config("group_key_columns must not be empty"));
        }
        if self.backtrack_period <= 0 {
            return Err(FeatureError::config("backtrack_period must be > 0"));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].contains(target) {
                return Err(FeatureError::config(format!(
                    "duplicate target column '{target}'"
                )));
            }
        }
        if self.timestamp_column.is_empty() || self.date_column.is_empty() {
            return Err(FeatureError::config(
                "timestamp_column and date_column must not be empty",
            ));
        }
        Ok(())
    }
}

/// Configuration for the parallel group runner.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RunnerConfig {
    /// Number of worker threads.
    ///
    /// - `None`: use Rayon's default (typically the number of CPUs)
    /// - `Some(n)`: use exactly n threads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
}

impl RunnerConfig {
    /// Create a runner configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `threads` is 0.
    pub fn with_threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "Thread count must be > 0");
        self.num_threads = Some(threads);
        self
    }

    /// Effective thread count: configured value or Rayon's default.
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Version or git commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Custom tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ExperimentMetadata {
    /// Create metadata stamped with the current UTC time.
    pub fn now(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            tags: None,
        }
    }
}

/// Unified pipeline configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Feature derivation configuration
    pub features: FeatureConfig,

    /// Parallel runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Experiment metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

impl PipelineConfig {
    /// Create a pipeline configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set feature configuration.
    pub fn with_features(mut self, config: FeatureConfig) -> Self {
        self.features = config;
        self
    }

    /// Set runner configuration.
    pub fn with_runner(mut self, config: RunnerConfig) -> Self {
        self.runner = config;
        self
    }

    /// Set experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.features.validate()
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from a TOML file and validate it.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from a JSON file and validate it.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}
