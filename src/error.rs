//! Error types for the trip feature extraction pipeline.
//!
//! All fallible operations in this crate return [`Result`], which wraps
//! [`FeatureError`]. Configuration problems and malformed input data surface
//! as explicit errors; statistically undefined values (an empty window even
//! after backtracking) are *data*, represented as `f64::NAN` in the output,
//! and never raised through this type.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors produced while deriving trip features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Invalid configuration, detected before any processing begins.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required column is absent from the input header.
    #[error("required column '{0}' not found in input header")]
    MissingColumn(String),

    /// A group task failed; the whole run is aborted so a partially
    /// aggregated table is never returned.
    #[error("group '{group}': {message}")]
    Group {
        /// Joined group-key values identifying the failed group.
        group: String,
        /// What went wrong inside the group.
        message: String,
    },

    /// Worker pool construction failed.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// CSV parsing or writing failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed as TOML.
    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration could not be serialized to TOML.
    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Configuration file could not be parsed or written as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeatureError {
    /// Construct a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FeatureError::Config(message.into())
    }

    /// Construct a group-task error from the group's key values.
    pub fn group(key: &[String], message: impl Into<String>) -> Self {
        FeatureError::Group {
            group: key.join("_"),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_error_names_the_group() {
        let err = FeatureError::group(
            &["3".to_string(), "7".to_string()],
            "unparseable timestamp",
        );
        let text = err.to_string();
        assert!(text.contains("3_7"));
        assert!(text.contains("unparseable timestamp"));
    }

    #[test]
    fn missing_column_names_the_column() {
        let err = FeatureError::MissingColumn("Travel Time".to_string());
        assert!(err.to_string().contains("Travel Time"));
    }
}
