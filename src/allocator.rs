//! Per-instance color allocation.
//!
//! Every stroke that starts a new instance asks the allocator for a color.
//! Colors are sampled at random and rejected when they are too dark or were
//! already handed out in this session. Rejection sampling degrades as the
//! bright color space fills up, so after a bounded number of misses the
//! allocator falls back to a linear scan, which either finds a free color or
//! proves there is none left.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Color;
use crate::error::{AnnotatorError, AnnotatorResult};

/// Random draws attempted before switching to the exhaustive scan.
const MAX_RANDOM_ATTEMPTS: usize = 4096;

/// Hands out unique, sufficiently bright colors.
#[derive(Debug)]
pub struct ColorAllocator {
    used: HashSet<Color>,
    brightness_threshold: u8,
    /// Number of colors that can ever be allocated with this threshold.
    capacity: usize,
    rng: StdRng,
}

impl ColorAllocator {
    /// Create an allocator seeded from OS entropy.
    pub fn new(brightness_threshold: u8) -> Self {
        Self::with_rng(brightness_threshold, StdRng::from_entropy())
    }

    /// Create an allocator with a fixed seed, for reproducible sessions.
    pub fn with_seed(brightness_threshold: u8, seed: u64) -> Self {
        Self::with_rng(brightness_threshold, StdRng::seed_from_u64(seed))
    }

    fn with_rng(brightness_threshold: u8, rng: StdRng) -> Self {
        Self {
            used: HashSet::new(),
            brightness_threshold,
            capacity: eligible_color_count(brightness_threshold),
            rng,
        }
    }

    /// Allocate a color not seen before in this session.
    ///
    /// Fails with [`AnnotatorError::ColorSpaceExhausted`] once every color
    /// meeting the threshold is in use.
    pub fn next_color(&mut self) -> AnnotatorResult<Color> {
        if self.used.len() >= self.capacity {
            return Err(self.exhausted());
        }

        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let [r, g, b] = self.rng.r#gen::<[u8; 3]>();
            let candidate = Color::new(r, g, b);
            if self.accepts(candidate) {
                return Ok(self.claim(candidate));
            }
        }

        log::debug!(
            "Color allocator: {} random misses, scanning ({} of {} used)",
            MAX_RANDOM_ATTEMPTS,
            self.used.len(),
            self.capacity
        );
        match self.scan_for_free() {
            Some(candidate) => Ok(self.claim(candidate)),
            None => Err(self.exhausted()),
        }
    }

    /// Whether `color` was handed out by this allocator.
    pub fn is_allocated(&self, color: Color) -> bool {
        self.used.contains(&color)
    }

    /// Number of colors handed out so far.
    pub fn allocated_count(&self) -> usize {
        self.used.len()
    }

    /// Total number of colors this allocator can ever hand out.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn accepts(&self, color: Color) -> bool {
        !color.is_background()
            && color.is_at_least(self.brightness_threshold)
            && !self.used.contains(&color)
    }

    fn claim(&mut self, color: Color) -> Color {
        self.used.insert(color);
        log::trace!("Color allocator: allocated {}", color);
        color
    }

    fn scan_for_free(&self) -> Option<Color> {
        (0..=255u8).rev().find_map(|r| {
            (0..=255u8).rev().find_map(|g| {
                (0..=255u8)
                    .rev()
                    .map(|b| Color::new(r, g, b))
                    .take_while(|c| c.is_at_least(self.brightness_threshold))
                    .find(|c| self.accepts(*c))
            })
        })
    }

    fn exhausted(&self) -> AnnotatorError {
        log::warn!(
            "Color allocator exhausted at threshold {}",
            self.brightness_threshold
        );
        AnnotatorError::ColorSpaceExhausted {
            threshold: self.brightness_threshold,
            allocated: self.used.len(),
        }
    }
}

/// Count the non-background colors whose channel mean is at least `threshold`.
fn eligible_color_count(threshold: u8) -> usize {
    let needed = 3 * u32::from(threshold);
    let mut count = 0usize;
    for r in 0..=255u32 {
        for g in 0..=255u32 {
            let min_b = needed.saturating_sub(r + g);
            if min_b <= 255 {
                count += (256 - min_b) as usize;
            }
        }
    }
    if threshold == 0 {
        // black passes a zero threshold but is reserved for background
        count -= 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_are_unique_and_bright() {
        let mut allocator = ColorAllocator::with_seed(80, 7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let color = allocator.next_color().unwrap();
            assert!(color.brightness() >= 80.0, "{} too dark", color);
            assert!(!color.is_background());
            assert!(seen.insert(color), "{} allocated twice", color);
        }
        assert_eq!(allocator.allocated_count(), 500);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ColorAllocator::with_seed(80, 42);
        let mut b = ColorAllocator::with_seed(80, 42);
        for _ in 0..20 {
            assert_eq!(a.next_color().unwrap(), b.next_color().unwrap());
        }
    }

    #[test]
    fn test_eligible_count_extremes() {
        assert_eq!(eligible_color_count(255), 1);
        assert_eq!(eligible_color_count(0), 256 * 256 * 256 - 1);
        // sum >= 762: sums 762..=765 -> 10 + 6 + 3 + 1
        assert_eq!(eligible_color_count(254), 20);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut allocator = ColorAllocator::with_seed(255, 1);
        assert_eq!(allocator.next_color().unwrap(), Color::new(255, 255, 255));
        let err = allocator.next_color().unwrap_err();
        assert!(matches!(
            err,
            AnnotatorError::ColorSpaceExhausted {
                threshold: 255,
                allocated: 1
            }
        ));
    }

    #[test]
    fn test_small_space_is_drained_completely() {
        let mut allocator = ColorAllocator::with_seed(254, 3);
        let mut seen = HashSet::new();
        for _ in 0..allocator.capacity() {
            let color = allocator.next_color().unwrap();
            assert!(color.is_at_least(254));
            assert!(seen.insert(color));
        }
        assert_eq!(seen.len(), 20);
        assert!(allocator.next_color().is_err());
    }
}
