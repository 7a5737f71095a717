use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of the source media, as reported by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SourceDimensions {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl SourceDimensions {
    /// Create source dimensions without checking them.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create source dimensions, rejecting a zero width or height.
    pub fn try_new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

/// A crop rectangle as computed from a request, before validation.
///
/// Uses signed coordinates so that an edge crop removing more than the frame
/// can still be reported with its (negative) resulting size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CropRegion {
    /// X coordinate of the top-left corner
    pub x: i64,
    /// Y coordinate of the top-left corner
    pub y: i64,
    /// Width of the region
    pub width: i64,
    /// Height of the region
    pub height: i64,
}

impl CropRegion {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    /// Horizontal extent (`x + width`), saturating instead of overflowing.
    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width)
    }

    /// Vertical extent (`y + height`), saturating instead of overflowing.
    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height)
    }

    /// True when the size is positive and the origin is non-negative.
    pub fn has_valid_shape(&self) -> bool {
        self.width > 0 && self.height > 0 && self.x >= 0 && self.y >= 0
    }

    /// True when the region lies entirely inside the source frame.
    /// Touching the right or bottom edge is allowed.
    pub fn fits_within(&self, source: SourceDimensions) -> bool {
        self.right() <= i64::from(source.width) && self.bottom() <= i64::from(source.height)
    }
}

/// A validated crop rectangle in pixel coordinates of the source frame.
///
/// Always satisfies `width > 0`, `height > 0`, `x + width <= source.width`
/// and `y + height <= source.height` for the source it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CropRectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRectangle {
    /// Whether the rectangle covers the whole source frame.
    pub fn is_full_frame(&self, source: SourceDimensions) -> bool {
        self.x == 0 && self.y == 0 && self.width == source.width && self.height == source.height
    }
}

impl From<CropRectangle> for CropRegion {
    fn from(rect: CropRectangle) -> Self {
        Self {
            x: i64::from(rect.x),
            y: i64::from(rect.y),
            width: i64::from(rect.width),
            height: i64::from(rect.height),
        }
    }
}
