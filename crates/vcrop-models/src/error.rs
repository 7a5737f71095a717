//! Crop validation errors.

use serde::Serialize;
use thiserror::Error;

use crate::rect::{CropRegion, SourceDimensions};

/// Result type for crop resolution.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Category of a validation failure, used for response codes and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Non-positive size, negative origin, or a field that is not an integer.
    InvalidDimensions,
    /// The rectangle extends past the source frame.
    OutOfBounds,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::InvalidDimensions => "invalid_dimensions",
            ValidationErrorKind::OutOfBounds => "out_of_bounds",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a crop request was rejected.
///
/// The display text is the user-facing message returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid crop values. Field '{field}' must be an integer, got '{value}'.")]
    NotANumber { field: &'static str, value: String },

    #[error(
        "Invalid crop values. Resulting dimensions would be {}x{} at ({}, {}).",
        .region.width, .region.height, .region.x, .region.y
    )]
    InvalidDimensions {
        region: CropRegion,
        frame: SourceDimensions,
    },

    #[error(
        "Crop region exceeds video boundaries. Video is {}x{}, crop would extend to {}x{}.",
        .frame.width, .frame.height, .extent_x, .extent_y
    )]
    OutOfBounds {
        region: CropRegion,
        frame: SourceDimensions,
        extent_x: i64,
        extent_y: i64,
    },
}

impl ValidationError {
    pub fn not_a_number(field: &'static str, value: impl Into<String>) -> Self {
        Self::NotANumber {
            field,
            value: value.into(),
        }
    }

    pub fn invalid_dimensions(region: CropRegion, frame: SourceDimensions) -> Self {
        Self::InvalidDimensions { region, frame }
    }

    pub fn out_of_bounds(region: CropRegion, frame: SourceDimensions) -> Self {
        Self::OutOfBounds {
            region,
            frame,
            extent_x: region.right(),
            extent_y: region.bottom(),
        }
    }

    /// Category of this failure. Unparseable fields count as invalid dimensions.
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::NotANumber { .. } | ValidationError::InvalidDimensions { .. } => {
                ValidationErrorKind::InvalidDimensions
            }
            ValidationError::OutOfBounds { .. } => ValidationErrorKind::OutOfBounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = ValidationError::invalid_dimensions(
            CropRegion::new(0, 300, 640, -120),
            SourceDimensions::new(640, 480),
        );
        assert_eq!(
            err.to_string(),
            "Invalid crop values. Resulting dimensions would be 640x-120 at (0, 300)."
        );
        assert_eq!(err.kind(), ValidationErrorKind::InvalidDimensions);
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = ValidationError::out_of_bounds(
            CropRegion::new(0, 0, 700, 480),
            SourceDimensions::new(640, 480),
        );
        assert_eq!(
            err.to_string(),
            "Crop region exceeds video boundaries. Video is 640x480, crop would extend to 700x480."
        );
        assert_eq!(err.kind().as_str(), "out_of_bounds");
    }

    #[test]
    fn test_not_a_number_kind() {
        let err = ValidationError::not_a_number("cropWidth", "abc");
        assert_eq!(err.kind(), ValidationErrorKind::InvalidDimensions);
        assert!(err.to_string().contains("cropWidth"));
    }
}
