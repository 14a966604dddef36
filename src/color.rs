//! Instance colors stored in the mask.

use image::Rgb;

/// An RGB color identifying one drawn instance.
///
/// The mask carries no instance table: a pixel's color is its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Background sentinel: pixels that belong to no instance.
    pub const BACKGROUND: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of the three channels (0..=765).
    pub const fn channel_sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    /// Perceptual brightness as the plain mean of the channels.
    pub fn brightness(self) -> f32 {
        f32::from(self.channel_sum()) / 3.0
    }

    /// True when the mean channel value is at least `threshold`.
    ///
    /// Compared on the channel sum so no rounding is involved.
    pub const fn is_at_least(self, threshold: u8) -> bool {
        self.channel_sum() >= 3 * threshold as u16
    }

    pub const fn is_background(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

impl From<Rgb<u8>> for Color {
    fn from(px: Rgb<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb([color.r, color.g, color.b])
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_is_channel_mean() {
        assert_eq!(Color::new(30, 60, 90).brightness(), 60.0);
        assert_eq!(Color::BACKGROUND.brightness(), 0.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // mean exactly 80
        assert!(Color::new(80, 80, 80).is_at_least(80));
        assert!(Color::new(79, 80, 81).is_at_least(80));
        assert!(!Color::new(79, 80, 80).is_at_least(80));
        assert!(Color::new(255, 255, 255).is_at_least(255));
    }

    #[test]
    fn test_rgb_conversion() {
        let color = Color::new(1, 2, 3);
        let px: Rgb<u8> = color.into();
        assert_eq!(px, Rgb([1, 2, 3]));
        assert_eq!(Color::from(px), color);
        assert_eq!(color.to_string(), "#010203");
    }
}
