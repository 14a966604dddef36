//! Stroke rasterization into the mask.
//!
//! A stroke is drawn as one filled disc per sampled pointer position. Discs
//! overwrite what is underneath (no blending, no anti-aliasing) and are
//! clipped to the mask bounds.

use crate::color::Color;
use crate::mask::{Mask, PixelPos};

/// Draw a filled disc of `radius` centered at `center`.
///
/// A pixel belongs to the disc when `dx² + dy² <= radius²`. Returns the
/// number of in-bounds pixels written.
pub fn stamp(mask: &mut Mask, center: PixelPos, radius: u32, color: Color) -> usize {
    let r = radius.min(i32::MAX as u32 / 2) as i32;
    let r_sq = i64::from(r) * i64::from(r);

    // bounding square, clipped to the mask
    let x0 = (center.x.saturating_sub(r)).max(0);
    let y0 = (center.y.saturating_sub(r)).max(0);
    let x1 = (center.x.saturating_add(r)).min(mask.width() as i32 - 1);
    let y1 = (center.y.saturating_add(r)).min(mask.height() as i32 - 1);

    let mut written = 0;
    for y in y0..=y1 {
        let dy = i64::from(y) - i64::from(center.y);
        for x in x0..=x1 {
            let dx = i64::from(x) - i64::from(center.x);
            if dx * dx + dy * dy <= r_sq && mask.put(PixelPos::new(x, y), color) {
                written += 1;
            }
        }
    }
    written
}

/// Stamp discs along the segment `from -> to`, excluding `from`.
///
/// Discs are spaced at most half a radius apart so consecutive samples
/// join into a solid band. Used only when stroke interpolation is enabled.
pub fn stamp_segment(
    mask: &mut Mask,
    from: PixelPos,
    to: PixelPos,
    radius: u32,
    color: Color,
) -> usize {
    let dx = f64::from(to.x) - f64::from(from.x);
    let dy = f64::from(to.y) - f64::from(from.y);
    let distance = dx.hypot(dy);
    let spacing = (f64::from(radius) / 2.0).max(1.0);
    let steps = (distance / spacing).ceil().max(1.0) as u32;

    let mut written = 0;
    for step in 1..=steps {
        let t = f64::from(step) / f64::from(steps);
        let pos = PixelPos::new(
            (f64::from(from.x) + dx * t).round() as i32,
            (f64::from(from.y) + dy * t).round() as i32,
        );
        written += stamp(mask, pos, radius, color);
    }
    written
}
