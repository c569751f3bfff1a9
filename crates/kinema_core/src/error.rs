//! Error types

use thiserror::Error;

use crate::diagnostics::WarningKind;

/// Errors produced while parsing or resolving animation input.
///
/// None of these ever escape the engine as a failure: the lenient entry
/// points report them on the warning channel and substitute a neutral
/// value. The fallible `try_*`/`FromStr` forms return them directly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinemaError {
    /// Text did not match `[+-]=? number unit?`
    #[error("invalid signed number: {0:?}")]
    InvalidNumber(String),

    /// Text is not a recognizable color
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// Malformed timeline placement expression
    #[error("invalid time placement: {0:?}")]
    InvalidPlacement(String),

    /// Placement or seek refers to a label that was never defined
    #[error("label {0:?} is not defined")]
    UnknownLabel(String),

    /// Label name does not start with a letter or contains illegal characters
    #[error("invalid label name: {0:?}")]
    InvalidLabel(String),

    /// Property is not exposed by the target's style interface
    #[error("unknown property: {0:?}")]
    UnknownProperty(String),

    /// Value rejected by the target's support check
    #[error("unsupported value for {property}: {value:?}")]
    UnsupportedValue { property: String, value: String },

    /// Unit cannot be converted for the property
    #[error("cannot convert unit {unit:?} for property {property:?}")]
    UnitConversion { property: String, unit: String },

    /// Easing name or arguments not recognized
    #[error("invalid ease: {0:?}")]
    InvalidEase(String),

    /// Transform function list could not be parsed
    #[error("invalid transform: {0:?}")]
    InvalidTransform(String),

    /// Target lookup produced no targets
    #[error("target {0:?} not found")]
    TargetNotFound(String),

    /// Configuration file or value is invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl KinemaError {
    /// Category used when this error is reported as a warning.
    pub fn kind(&self) -> WarningKind {
        match self {
            KinemaError::InvalidNumber(_)
            | KinemaError::InvalidColor(_)
            | KinemaError::InvalidPlacement(_)
            | KinemaError::InvalidEase(_)
            | KinemaError::InvalidTransform(_) => WarningKind::Parse,
            KinemaError::UnknownProperty(_) | KinemaError::UnsupportedValue { .. } => {
                WarningKind::UnsupportedProperty
            }
            KinemaError::UnitConversion { .. } => WarningKind::UnitConversion,
            KinemaError::UnknownLabel(_) | KinemaError::InvalidLabel(_) => {
                WarningKind::UnresolvedLabel
            }
            KinemaError::TargetNotFound(_) => WarningKind::TargetNotFound,
            KinemaError::Config(_) => WarningKind::InvalidOption,
        }
    }
}

/// Result type for kinema operations
pub type Result<T> = std::result::Result<T, KinemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            KinemaError::InvalidNumber("x".into()).kind(),
            WarningKind::Parse
        );
        assert_eq!(
            KinemaError::UnknownLabel("mid".into()).kind(),
            WarningKind::UnresolvedLabel
        );
        assert_eq!(
            KinemaError::UnitConversion {
                property: "width".into(),
                unit: "foo".into()
            }
            .kind(),
            WarningKind::UnitConversion
        );
    }

    #[test]
    fn test_error_display() {
        let err = KinemaError::UnsupportedValue {
            property: "width".into(),
            value: "red".into(),
        };
        assert_eq!(err.to_string(), "unsupported value for width: \"red\"");
    }
}
