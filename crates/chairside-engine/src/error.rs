//! Engine error types

use chairside_domain::ConfigurationError;
use thiserror::Error;

/// Errors that can occur while loading rules or evaluating a case
///
/// Missing inputs and malformed external assessments are not errors: the
/// former classify as insufficient data, the latter fall back to the local
/// result.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A categorical value has no entry in its flag rule
    ///
    /// The rule table is stale relative to the form and must be fixed in
    /// configuration.
    #[error("Flag '{rule}' has no mapping for value '{value}'")]
    UnmappedCategory {
        /// Rule key
        rule: String,
        /// Unmapped input value
        value: String,
    },

    /// Aggregation was asked to combine zero results
    #[error("Cannot aggregate an empty set of results")]
    EmptyAggregate,

    /// Rule configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Rule file could not be read
    #[error("Failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    /// Rule file is not valid TOML for a rule set
    #[error("Failed to parse rule file: {0}")]
    Toml(#[from] toml::de::Error),
}
