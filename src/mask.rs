//! The mutable instance mask.

use std::collections::BTreeSet;

use image::RgbImage;

use crate::color::Color;

/// A position in mask pixel coordinates. May lie outside the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Map a sub-pixel pointer coordinate onto the pixel containing it.
    pub fn from_pointer(x: f32, y: f32) -> Self {
        Self::new(x.floor() as i32, y.floor() as i32)
    }
}

/// Raster buffer encoding instance membership by color.
///
/// Starts out all background. Cloning duplicates the pixel data, so a
/// snapshot never aliases the live mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pixels: RgbImage,
}

impl Mask {
    /// Create an all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Whether `pos` addresses a pixel of this mask.
    pub fn contains(&self, pos: PixelPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.pixels.width()
            && (pos.y as u32) < self.pixels.height()
    }

    /// Color at `pos`, or `None` outside the mask.
    pub fn get(&self, pos: PixelPos) -> Option<Color> {
        self.contains(pos)
            .then(|| Color::from(*self.pixels.get_pixel(pos.x as u32, pos.y as u32)))
    }

    /// Overwrite one pixel. Out-of-bounds writes are dropped.
    pub fn put(&mut self, pos: PixelPos, color: Color) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.pixels
            .put_pixel(pos.x as u32, pos.y as u32, color.into());
        true
    }

    /// Replace the contents with `other`, which must have the same dimensions.
    pub(crate) fn restore_from(&mut self, other: Mask) {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        self.pixels = other.pixels;
    }

    /// Number of non-background pixels.
    pub fn painted_pixel_count(&self) -> usize {
        self.pixels
            .pixels()
            .filter(|px| !Color::from(**px).is_background())
            .count()
    }

    /// Distinct instance colors present in the mask.
    pub fn instance_colors(&self) -> BTreeSet<Color> {
        self.pixels
            .pixels()
            .map(|px| Color::from(*px))
            .filter(|c| !c.is_background())
            .collect()
    }

    /// Borrow the underlying image for encoding or compositing.
    pub fn as_image(&self) -> &RgbImage {
        &self.pixels
    }
}

impl From<RgbImage> for Mask {
    fn from(pixels: RgbImage) -> Self {
        Self { pixels }
    }
}
