//! Shared data models for the VCrop backend.
//!
//! This crate provides:
//! - Crop request shapes (edge-based and region-based)
//! - Raw form field parsing into a typed crop request
//! - Crop rectangle resolution and validation against source dimensions
//! - Encoding configuration for the cropped output

pub mod encoding;
pub mod error;
pub mod rect;
pub mod request;
pub mod resolver;

// Re-export common types
pub use encoding::EncodingConfig;
pub use error::{ValidationError, ValidationErrorKind, ValidationResult};
pub use rect::{CropRectangle, CropRegion, SourceDimensions};
pub use request::{CropFields, CropRequest, EdgeCrop, RegionCrop};
pub use resolver::resolve;
