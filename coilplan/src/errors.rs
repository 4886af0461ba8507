//! Error types for the winding engine.
//!
//! Each failure class gets its own type so callers can match on what went
//! wrong; `WindError` aggregates them for the orchestrator-level API.

use thiserror::Error;

/// Invalid caller-supplied construction parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("proportion vector has {got} entries but the coil has {expected} windings")]
    ProportionLength { expected: usize, got: usize },
    #[error("proportion for winding {index} must be positive, got {value}")]
    NonPositiveProportion { index: usize, value: f64 },
    #[error("pattern entry {value} is out of range for {windings} windings")]
    PatternIndexOutOfRange { value: usize, windings: usize },
    #[error("pattern is empty")]
    EmptyPattern,
    #[error("repetitions must be at least 1")]
    ZeroRepetitions,
    #[error("margin for winding {index} must be non-negative, got [{left}, {right}]")]
    NegativeMargin { index: usize, left: f64, right: f64 },
    #[error("margin spec has {got} entries but the coil has {expected} windings")]
    MarginLength { expected: usize, got: usize },
    #[error("winding {name} has zero turns")]
    ZeroTurns { name: String },
    #[error("winding {name} has zero parallels")]
    ZeroParallels { name: String },
    #[error("policy references unknown section {name}")]
    UnknownSection { name: String },
    #[error("section index {index} is out of range, coil has {sections} conduction sections")]
    SectionIndexOutOfRange { index: usize, sections: usize },
    #[error("planar stack-up of {got} layers exceeds the configured maximum of {max}")]
    TooManyPlanarLayers { got: usize, max: usize },
    #[error("planar stack distances have {got} entries, expected {expected}")]
    StackDistanceLength { expected: usize, got: usize },
    #[error("{0}")]
    Invalid(String),
}

/// Packed geometry exceeds a window bound.
///
/// `required` and `available` are in meters along the axis that overflowed,
/// expressed as the length the turns would need versus the length the window
/// offers (the layer count is clamped to what physically fits, so a stack
/// overflow is reported as a shortfall along the packing axis).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("turns do not fit in section {section}: required {required} m, available {available} m")]
pub struct FitError {
    pub section: String,
    pub required: f64,
    pub available: f64,
}

/// A stage was invoked without the artifact the prior stage produces.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{requested} requires a {missing}, but none is present on the coil")]
pub struct MissingPrerequisiteError {
    pub requested: &'static str,
    pub missing: &'static str,
}

/// Incompatible feature combination.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unsupported combination: {0}")]
pub struct UnsupportedCombinationError(pub String);

/// Wire construction could not be resolved to outer dimensions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("wire {0} is not in the catalog")]
    UnknownWire(String),
    #[error("wire {wire} has no outer dimensions and none could be derived")]
    MissingDimensions { wire: String },
    #[error("invalid wire construction: {0}")]
    InvalidConstruction(String),
}

/// Aggregate error for the orchestrator-level API.
#[derive(Debug, Error)]
pub enum WindError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("{0}")]
    Fit(#[from] FitError),
    #[error("{0}")]
    MissingPrerequisite(#[from] MissingPrerequisiteError),
    #[error("{0}")]
    Unsupported(#[from] UnsupportedCombinationError),
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_error_message() {
        let err = FitError {
            section: "Primary section 0".to_string(),
            required: 0.010,
            available: 0.005,
        };
        let msg = err.to_string();
        assert!(msg.contains("Primary section 0"));
        assert!(msg.contains("0.01"));
        assert!(msg.contains("0.005"));
    }

    #[test]
    fn test_missing_prerequisite_message() {
        let err = MissingPrerequisiteError {
            requested: "wind_by_layers",
            missing: "sections description",
        };
        assert_eq!(
            err.to_string(),
            "wind_by_layers requires a sections description, but none is present on the coil"
        );
    }

    #[test]
    fn test_configuration_error_into_wind_error() {
        let err: WindError = ConfigurationError::EmptyPattern.into();
        assert!(matches!(err, WindError::Configuration(_)));
        assert!(err.to_string().contains("pattern is empty"));
    }
}
