//! Derived feature column schema.
//!
//! Every (target, window) pair contributes two derived columns to the output
//! table: a trailing mean and a trailing sample standard deviation. Column
//! names are deterministic so downstream training code can select features
//! by name:
//!
//! ```text
//! mean_TravelTime_before_1, std_TravelTime_before_1,
//! mean_TravelTime_before_2, std_TravelTime_before_2, ...
//! ```
//!
//! Spaces are stripped from target names (`"Travel Time"` → `TravelTime`).
//! Window 1 is the most recent interval, window W the most distant. Columns
//! are laid out target-major: all windows of the first target, then all
//! windows of the second, and so on.

use serde::{Deserialize, Serialize};

/// Which statistic a derived column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Trailing arithmetic mean.
    Mean,
    /// Trailing sample standard deviation.
    Std,
}

impl StatKind {
    /// Column-name prefix for this statistic.
    pub fn prefix(&self) -> &'static str {
        match self {
            StatKind::Mean => "mean",
            StatKind::Std => "std",
        }
    }
}

/// Definition of a single derived feature column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDef {
    /// Column name, e.g. `mean_TravelTime_before_1`.
    pub name: String,
    /// Position inside a record's derived feature vector.
    pub index: usize,
    /// Statistic held by the column.
    pub kind: StatKind,
    /// Target column the statistic is computed over (original spelling).
    pub target: String,
    /// Trailing window index, 1-based, 1 = most recent.
    pub window: usize,
}

/// Ordered collection of derived feature columns for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureDef>,
    window_count: usize,
}

impl FeatureSchema {
    /// Build the schema for the given targets and window count.
    pub fn new(targets: &[String], window_count: usize) -> Self {
        let mut columns = Vec::with_capacity(targets.len() * window_count * 2);
        for target in targets {
            let stripped = target.replace(' ', "");
            for window in 1..=window_count {
                for kind in [StatKind::Mean, StatKind::Std] {
                    columns.push(FeatureDef {
                        name: format!("{}_{}_before_{}", kind.prefix(), stripped, window),
                        index: columns.len(),
                        kind,
                        target: target.clone(),
                        window,
                    });
                }
            }
        }
        Self {
            columns,
            window_count,
        }
    }

    /// Number of derived columns (`2 × targets × windows`).
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no derived columns are defined.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All column definitions in output order.
    pub fn columns(&self) -> &[FeatureDef] {
        &self.columns
    }

    /// Column names in output order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Feature-vector slot for a (target, window, statistic) triple.
    ///
    /// `target_index` refers to the position of the target in the configured
    /// target list; `window` is 1-based.
    pub fn slot(&self, target_index: usize, window: usize, kind: StatKind) -> usize {
        debug_assert!(window >= 1 && window <= self.window_count);
        let kind_offset = match kind {
            StatKind::Mean => 0,
            StatKind::Std => 1,
        };
        target_index * self.window_count * 2 + (window - 1) * 2 + kind_offset
    }
}
