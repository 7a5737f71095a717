//! Crop request shapes and form field parsing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Form field names accepted by the crop endpoint.
pub mod fields {
    pub const TOP: &str = "top";
    pub const BOTTOM: &str = "bottom";
    pub const LEFT: &str = "left";
    pub const RIGHT: &str = "right";
    pub const CROP_X: &str = "cropX";
    pub const CROP_Y: &str = "cropY";
    pub const CROP_WIDTH: &str = "cropWidth";
    pub const CROP_HEIGHT: &str = "cropHeight";
}

/// Pixels to remove from each side of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeCrop {
    #[serde(default)]
    pub top: i64,
    #[serde(default)]
    pub bottom: i64,
    #[serde(default)]
    pub left: i64,
    #[serde(default)]
    pub right: i64,
}

/// An absolute target rectangle within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegionCrop {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// A crop request. Exactly one shape is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CropRequest {
    Edge(EdgeCrop),
    Region(RegionCrop),
}

impl CropRequest {
    pub fn edge(top: i64, bottom: i64, left: i64, right: i64) -> Self {
        Self::Edge(EdgeCrop {
            top,
            bottom,
            left,
            right,
        })
    }

    pub fn region(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::Region(RegionCrop {
            x,
            y,
            width,
            height,
        })
    }

    /// Short name of the active shape, for logs and metrics.
    pub fn mode(&self) -> &'static str {
        match self {
            CropRequest::Edge(_) => "edge",
            CropRequest::Region(_) => "region",
        }
    }
}

impl Default for CropRequest {
    fn default() -> Self {
        Self::Edge(EdgeCrop::default())
    }
}

/// Raw crop fields as received in a form submission.
///
/// Values are kept as text until [`CropFields::into_request`] decides the
/// request shape and parses only the fields that shape uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CropFields {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub crop_x: Option<String>,
    pub crop_y: Option<String>,
    pub crop_width: Option<String>,
    pub crop_height: Option<String>,
}

impl CropFields {
    /// Store a field by its form name. Returns `false` for names that are not
    /// crop fields.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            fields::TOP => &mut self.top,
            fields::BOTTOM => &mut self.bottom,
            fields::LEFT => &mut self.left,
            fields::RIGHT => &mut self.right,
            fields::CROP_X => &mut self.crop_x,
            fields::CROP_Y => &mut self.crop_y,
            fields::CROP_WIDTH => &mut self.crop_width,
            fields::CROP_HEIGHT => &mut self.crop_height,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    /// Both region size fields are present, so the request is a region crop.
    pub fn has_region_fields(&self) -> bool {
        is_present(&self.crop_width) && is_present(&self.crop_height)
    }

    /// Any edge field is present.
    pub fn has_edge_fields(&self) -> bool {
        [&self.top, &self.bottom, &self.left, &self.right]
            .into_iter()
            .any(is_present)
    }

    /// Decide the request shape and parse the fields it uses.
    ///
    /// Region fields take precedence; edge fields are then not even parsed.
    /// Absent fields take their default of 0. Present fields, blank ones
    /// included, must be base-10 integers.
    pub fn into_request(&self) -> ValidationResult<CropRequest> {
        if self.has_region_fields() {
            Ok(CropRequest::Region(RegionCrop {
                x: parse_field(fields::CROP_X, &self.crop_x)?,
                y: parse_field(fields::CROP_Y, &self.crop_y)?,
                width: parse_field(fields::CROP_WIDTH, &self.crop_width)?,
                height: parse_field(fields::CROP_HEIGHT, &self.crop_height)?,
            }))
        } else {
            Ok(CropRequest::Edge(EdgeCrop {
                top: parse_field(fields::TOP, &self.top)?,
                bottom: parse_field(fields::BOTTOM, &self.bottom)?,
                left: parse_field(fields::LEFT, &self.left)?,
                right: parse_field(fields::RIGHT, &self.right)?,
            }))
        }
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.is_some()
}

fn parse_field(name: &'static str, value: &Option<String>) -> ValidationResult<i64> {
    match value.as_deref().map(str::trim) {
        None => Ok(0),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ValidationError::not_a_number(name, raw)),
    }
}
