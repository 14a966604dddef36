//! Display-only contrast enhancement.
//!
//! The session shows the user an enhanced copy of the source image. Nothing
//! here ever touches the mask or the pixels that get exported.
//!
//! [`Clahe`] equalizes the L* channel of CIE L*a*b* tile by tile, clipping
//! each tile's histogram to limit noise amplification, then blends the tile
//! mappings bilinearly so tile seams do not show.

use image::{Rgb, RgbImage};

use crate::config::ClaheSettings;

/// A purely visual image transform.
pub trait ContrastFilter {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Return an enhanced copy of `image` with the same dimensions.
    fn enhance(&self, image: &RgbImage) -> RgbImage;
}

/// Contrast Limited Adaptive Histogram Equalization on lightness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clahe {
    clip_limit: f32,
    tile_grid: u32,
}

impl Clahe {
    pub fn new(clip_limit: f32, tile_grid: u32) -> Self {
        Self {
            clip_limit,
            tile_grid: tile_grid.max(1),
        }
    }
}

impl Default for Clahe {
    fn default() -> Self {
        ClaheSettings::default().into()
    }
}

impl From<ClaheSettings> for Clahe {
    fn from(settings: ClaheSettings) -> Self {
        Self::new(settings.clip_limit, settings.tile_grid)
    }
}

impl ContrastFilter for Clahe {
    fn name(&self) -> &'static str {
        "clahe"
    }

    fn enhance(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }

        let lab: Vec<[f32; 3]> = image.pixels().map(|px| rgb_to_lab(*px)).collect();
        let lightness: Vec<u8> = lab
            .iter()
            .map(|[l, _, _]| (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8)
            .collect();

        let equalized = equalize_tiles(
            &lightness,
            width as usize,
            height as usize,
            self.clip_limit,
            self.tile_grid as usize,
        );

        let mut out = RgbImage::new(width, height);
        for ((px, [_, a, b]), l) in out.pixels_mut().zip(&lab).zip(&equalized) {
            *px = lab_to_rgb([f32::from(*l) * 100.0 / 255.0, *a, *b]);
        }
        log::debug!(
            "CLAHE applied to {}x{} image (clip {}, grid {})",
            width,
            height,
            self.clip_limit,
            self.tile_grid
        );
        out
    }
}

/// Run CLAHE over an 8-bit plane of `width * height` samples.
fn equalize_tiles(
    plane: &[u8],
    width: usize,
    height: usize,
    clip_limit: f32,
    grid: usize,
) -> Vec<u8> {
    let tiles_x = grid.min(width).max(1);
    let tiles_y = grid.min(height).max(1);
    let bounds = |i: usize, tiles: usize, len: usize| (i * len / tiles, (i + 1) * len / tiles);

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        let (y0, y1) = bounds(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = bounds(tx, tiles_x, width);
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for &v in &plane[y * width + x0..y * width + x1] {
                    hist[usize::from(v)] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, ((x1 - x0) * (y1 - y0)) as u32, clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;
    let neighbours = |pos: usize, tile: f32, tiles: usize| {
        let t = (pos as f32 + 0.5) / tile - 0.5;
        let lo = (t.floor().max(0.0) as usize).min(tiles - 1);
        let hi = (lo + 1).min(tiles - 1);
        (lo, hi, (t - lo as f32).clamp(0.0, 1.0))
    };

    let mut out = vec![0u8; plane.len()];
    for y in 0..height {
        let (ty0, ty1, wy) = neighbours(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, wx) = neighbours(x, tile_w, tiles_x);
            let v = usize::from(plane[y * width + x]);
            let at = |tx: usize, ty: usize| f32::from(luts[ty * tiles_x + tx][v]);
            let top = at(tx0, ty0) * (1.0 - wx) + at(tx1, ty0) * wx;
            let bottom = at(tx0, ty1) * (1.0 - wx) + at(tx1, ty1) * wx;
            out[y * width + x] = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Clip a tile histogram, redistribute the excess and build its mapping.
fn tile_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if area == 0 {
        for (v, slot) in lut.iter_mut().enumerate() {
            *slot = v as u8;
        }
        return lut;
    }

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let per_bin = excess / 256;
    let residual = excess % 256;
    for bin in hist.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step).take(residual as usize) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (bin, slot) in hist.iter().zip(lut.iter_mut()) {
        cdf += bin;
        *slot = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// D65 reference white
const XN: f32 = 0.950_456;
const ZN: f32 = 1.088_754;
const LAB_EPSILON: f32 = 0.008_856;

fn srgb_to_linear(c: u8) -> f32 {
    let c = f32::from(c) / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let s = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    let cube = t * t * t;
    if cube > LAB_EPSILON {
        cube
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

fn rgb_to_lab(px: Rgb<u8>) -> [f32; 3] {
    let [r, g, b] = px.0.map(srgb_to_linear);
    let x = 0.412_453 * r + 0.357_580 * g + 0.180_423 * b;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = 0.019_334 * r + 0.119_193 * g + 0.950_227 * b;

    let fy = lab_f(y);
    let l = if y > LAB_EPSILON {
        116.0 * fy - 16.0
    } else {
        903.3 * y
    };
    [l, 500.0 * (lab_f(x / XN) - fy), 200.0 * (fy - lab_f(z / ZN))]
}

fn lab_to_rgb([l, a, b]: [f32; 3]) -> Rgb<u8> {
    let fy = (l + 16.0) / 116.0;
    let y = if l > 903.3 * LAB_EPSILON {
        fy * fy * fy
    } else {
        l / 903.3
    };
    let x = lab_f_inv(fy + a / 500.0) * XN;
    let z = lab_f_inv(fy - b / 200.0) * ZN;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;
    Rgb([linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)])
}
