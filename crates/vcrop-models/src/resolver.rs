//! Crop rectangle resolution.
//!
//! Turns a [`CropRequest`] into a [`CropRectangle`] inside the source frame,
//! or a [`ValidationError`] describing the rectangle that was computed.
//! Pure and deterministic; callers run it before any transcoding work.

use crate::error::{ValidationError, ValidationResult};
use crate::rect::{CropRectangle, CropRegion, SourceDimensions};
use crate::request::CropRequest;

/// Resolve a crop request against the source frame.
///
/// Validation order: shape first (positive size, non-negative origin), then
/// bounds. A rectangle touching the right or bottom edge is in bounds.
pub fn resolve(source: SourceDimensions, request: &CropRequest) -> ValidationResult<CropRectangle> {
    let region = compute_region(source, request);

    if !region.has_valid_shape() {
        return Err(ValidationError::invalid_dimensions(region, source));
    }

    if !region.fits_within(source) {
        return Err(ValidationError::out_of_bounds(region, source));
    }

    to_rectangle(region, source)
}

impl CropRequest {
    /// Resolve this request against the source frame. See [`resolve`].
    pub fn resolve(&self, source: SourceDimensions) -> ValidationResult<CropRectangle> {
        resolve(source, self)
    }
}

/// Translate either request shape into a single candidate region.
fn compute_region(source: SourceDimensions, request: &CropRequest) -> CropRegion {
    match request {
        CropRequest::Region(region) => {
            CropRegion::new(region.x, region.y, region.width, region.height)
        }
        CropRequest::Edge(edge) => CropRegion::new(
            edge.left,
            edge.top,
            i64::from(source.width)
                .saturating_sub(edge.left)
                .saturating_sub(edge.right),
            i64::from(source.height)
                .saturating_sub(edge.top)
                .saturating_sub(edge.bottom),
        ),
    }
}

/// Narrow a validated region to unsigned pixel coordinates.
fn to_rectangle(region: CropRegion, source: SourceDimensions) -> ValidationResult<CropRectangle> {
    let narrow = |v: i64| u32::try_from(v).map_err(|_| ValidationError::out_of_bounds(region, source));
    Ok(CropRectangle {
        x: narrow(region.x)?,
        y: narrow(region.y)?,
        width: narrow(region.width)?,
        height: narrow(region.height)?,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating source frame sizes.
    fn source_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=4096, 1u32..=4096)
    }

    proptest! {
        /// Property: edge crops leaving at least one pixel resolve to the remaining area.
        #[test]
        fn prop_edge_crop_resolves(
            (width, height) in source_strategy(),
            fractions in (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0),
        ) {
            let (ft, fb, fl, fr) = fractions;
            let max_v = i64::from(height) - 1;
            let max_h = i64::from(width) - 1;
            let top = (ft * max_v as f64) as i64;
            let bottom = (fb * (max_v - top) as f64) as i64;
            let left = (fl * max_h as f64) as i64;
            let right = (fr * (max_h - left) as f64) as i64;
            prop_assume!(top + bottom < i64::from(height) && left + right < i64::from(width));

            let source = SourceDimensions::new(width, height);
            let resolved = resolve(source, &CropRequest::edge(top, bottom, left, right)).unwrap();

            prop_assert_eq!(i64::from(resolved.x), left);
            prop_assert_eq!(i64::from(resolved.y), top);
            prop_assert_eq!(i64::from(resolved.width), i64::from(width) - left - right);
            prop_assert_eq!(i64::from(resolved.height), i64::from(height) - top - bottom);
        }

        /// Property: in-bounds regions resolve to exactly themselves.
        #[test]
        fn prop_region_crop_is_identity(
            (width, height) in source_strategy(),
            seed in (0u32..4096, 0u32..4096, 1u32..=4096, 1u32..=4096),
        ) {
            let (sx, sy, sw, sh) = seed;
            let x = sx % width;
            let y = sy % height;
            let w = 1 + (sw - 1) % (width - x);
            let h = 1 + (sh - 1) % (height - y);

            let source = SourceDimensions::new(width, height);
            let request = CropRequest::region(i64::from(x), i64::from(y), i64::from(w), i64::from(h));
            let resolved = resolve(source, &request).unwrap();

            prop_assert_eq!(resolved, CropRectangle { x, y, width: w, height: h });
        }

        /// Property: resolving twice gives the same answer.
        #[test]
        fn prop_resolve_is_deterministic(
            (width, height) in source_strategy(),
            values in (-100i64..5000, -100i64..5000, -100i64..5000, -100i64..5000),
            region in any::<bool>(),
        ) {
            let (a, b, c, d) = values;
            let source = SourceDimensions::new(width, height);
            let request = if region {
                CropRequest::region(a, b, c, d)
            } else {
                CropRequest::edge(a, b, c, d)
            };
            prop_assert_eq!(resolve(source, &request), resolve(source, &request));
        }

        /// Property: every successful result satisfies the rectangle invariant.
        #[test]
        fn prop_success_is_inside_frame(
            (width, height) in source_strategy(),
            values in (-100i64..5000, -100i64..5000, -100i64..5000, -100i64..5000),
            region in any::<bool>(),
        ) {
            let (a, b, c, d) = values;
            let source = SourceDimensions::new(width, height);
            let request = if region {
                CropRequest::region(a, b, c, d)
            } else {
                CropRequest::edge(a, b, c, d)
            };
            if let Ok(rect) = resolve(source, &request) {
                prop_assert!(rect.width > 0 && rect.height > 0);
                prop_assert!(u64::from(rect.x) + u64::from(rect.width) <= u64::from(width));
                prop_assert!(u64::from(rect.y) + u64::from(rect.height) <= u64::from(height));
            }
        }
    }
}
