//! FFmpeg video filter definitions.

use vcrop_models::CropRectangle;

/// Build the `crop` filter for a resolved rectangle (`crop=w:h:x:y`).
pub fn crop_filter(rect: &CropRectangle) -> String {
    format!("crop={}:{}:{}:{}", rect.width, rect.height, rect.x, rect.y)
}
