//! The mask canvas: mask state plus the stroke state machine.
//!
//! ```text
//!   Idle --begin_stroke--> Drawing --extend_stroke--> Drawing
//!     ^                       |
//!     +------end_stroke-------+
//!   Idle --undo--> Idle
//! ```
//!
//! A snapshot of the mask is pushed onto the history immediately before a
//! stroke lays down its first disc, so undo restores the mask exactly as it
//! was before the most recent stroke.

use crate::allocator::ColorAllocator;
use crate::color::Color;
use crate::config::AnnotatorConfig;
use crate::error::AnnotatorResult;
use crate::mask::{Mask, PixelPos};
use crate::raster;
use crate::undo::{HistoryConfig, MaskHistory, UndoOutcome};

/// Brush parameters fixed for the lifetime of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSettings {
    /// Disc radius in pixels
    pub radius: u32,
    /// Stamp along the segment between consecutive samples
    pub interpolate: bool,
}

/// Whether a stroke is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    Idle,
    Drawing,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    color: Color,
    last: PixelPos,
    samples: usize,
    pixels_written: usize,
}

/// What a finished stroke did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeSummary {
    pub color: Color,
    /// Pointer samples stamped, including the initial press
    pub samples: usize,
    /// In-bounds pixel writes (overlapping discs count more than once)
    pub pixels_written: usize,
}

/// Owns the mask and services draw and undo requests against it.
#[derive(Debug)]
pub struct MaskCanvas {
    mask: Mask,
    history: MaskHistory,
    allocator: ColorAllocator,
    brush: BrushSettings,
    stroke: Option<ActiveStroke>,
}

impl MaskCanvas {
    /// Create an all-background canvas sized `width` x `height`.
    pub fn new(width: u32, height: u32, config: &AnnotatorConfig) -> Self {
        let allocator = match config.color_seed {
            Some(seed) => ColorAllocator::with_seed(config.brightness_threshold, seed),
            None => ColorAllocator::new(config.brightness_threshold),
        };
        let history = MaskHistory::with_config(HistoryConfig {
            max_history: config.max_history_size,
        });
        let brush = BrushSettings {
            radius: config.circle_size,
            interpolate: config.interpolate_strokes,
        };
        Self::with_parts(Mask::new(width, height), history, allocator, brush)
    }

    /// Assemble a canvas from explicit components.
    pub fn with_parts(
        mask: Mask,
        history: MaskHistory,
        allocator: ColorAllocator,
        brush: BrushSettings,
    ) -> Self {
        Self {
            mask,
            history,
            allocator,
            brush,
            stroke: None,
        }
    }

    pub fn state(&self) -> CanvasState {
        if self.stroke.is_some() {
            CanvasState::Drawing
        } else {
            CanvasState::Idle
        }
    }

    /// Start a new instance stroke at `pos`.
    ///
    /// Returns the color allocated for the stroke, or `None` when the press
    /// is ignored (already drawing, or `pos` is outside the mask). Fails only
    /// when the allocator has no color left; the mask and history are then
    /// untouched.
    pub fn begin_stroke(&mut self, pos: PixelPos) -> AnnotatorResult<Option<Color>> {
        if self.stroke.is_some() {
            log::trace!("Canvas: press at {:?} ignored, stroke already active", pos);
            return Ok(None);
        }
        if !self.mask.contains(pos) {
            log::trace!("Canvas: press at {:?} outside mask ignored", pos);
            return Ok(None);
        }

        let color = self.allocator.next_color()?;
        self.history.checkpoint(&self.mask);

        let pixels_written = raster::stamp(&mut self.mask, pos, self.brush.radius, color);
        self.stroke = Some(ActiveStroke {
            color,
            last: pos,
            samples: 1,
            pixels_written,
        });
        log::debug!("Canvas: stroke started at {:?} with {}", pos, color);
        Ok(Some(color))
    }

    /// Stamp the active stroke's color at `pos`.
    ///
    /// Returns false when idle or when `pos` lies outside the mask.
    pub fn extend_stroke(&mut self, pos: PixelPos) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        if !self.mask.contains(pos) {
            log::trace!("Canvas: move to {:?} outside mask ignored", pos);
            return false;
        }

        let written = if self.brush.interpolate {
            raster::stamp_segment(&mut self.mask, stroke.last, pos, self.brush.radius, stroke.color)
        } else {
            raster::stamp(&mut self.mask, pos, self.brush.radius, stroke.color)
        };
        stroke.last = pos;
        stroke.samples += 1;
        stroke.pixels_written += written;
        true
    }

    /// Finish the active stroke. Returns `None` when idle.
    pub fn end_stroke(&mut self) -> Option<StrokeSummary> {
        let stroke = self.stroke.take()?;
        let summary = StrokeSummary {
            color: stroke.color,
            samples: stroke.samples,
            pixels_written: stroke.pixels_written,
        };
        log::debug!(
            "Canvas: stroke {} finished ({} samples, {} px)",
            summary.color,
            summary.samples,
            summary.pixels_written
        );
        Some(summary)
    }

    /// Revert the most recent stroke.
    pub fn undo(&mut self) -> UndoOutcome {
        if self.stroke.is_some() {
            log::debug!("Canvas: undo ignored while drawing");
            return UndoOutcome::StrokeInProgress;
        }
        match self.history.undo() {
            Some(snapshot) => {
                self.mask.restore_from(snapshot);
                log::debug!("Canvas: undo applied");
                UndoOutcome::Reverted
            }
            None => {
                log::debug!("Canvas: nothing to undo");
                UndoOutcome::NothingToUndo
            }
        }
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn history(&self) -> &MaskHistory {
        &self.history
    }

    pub fn allocator(&self) -> &ColorAllocator {
        &self.allocator
    }

    /// Color of the stroke in progress, if any.
    pub fn current_color(&self) -> Option<Color> {
        self.stroke.map(|s| s.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(config: AnnotatorConfig) -> MaskCanvas {
        MaskCanvas::new(32, 24, &config)
    }

    fn seeded() -> AnnotatorConfig {
        AnnotatorConfig {
            color_seed: Some(11),
            ..AnnotatorConfig::default()
        }
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut canvas = canvas(seeded());
        assert_eq!(canvas.state(), CanvasState::Idle);
        assert!(!canvas.extend_stroke(PixelPos::new(1, 1)));
        assert!(canvas.end_stroke().is_none());

        let color = canvas.begin_stroke(PixelPos::new(5, 5)).unwrap().unwrap();
        assert_eq!(canvas.state(), CanvasState::Drawing);
        assert_eq!(canvas.current_color(), Some(color));

        // second press while drawing does not restart the stroke
        assert_eq!(canvas.begin_stroke(PixelPos::new(9, 9)).unwrap(), None);
        assert!(canvas.extend_stroke(PixelPos::new(6, 5)));

        let summary = canvas.end_stroke().unwrap();
        assert_eq!(summary.color, color);
        assert_eq!(summary.samples, 2);
        assert_eq!(canvas.state(), CanvasState::Idle);
    }

    #[test]
    fn test_color_fixed_for_whole_stroke() {
        let mut canvas = canvas(seeded());
        let color = canvas.begin_stroke(PixelPos::new(5, 5)).unwrap().unwrap();
        canvas.extend_stroke(PixelPos::new(20, 5));
        canvas.end_stroke();

        assert_eq!(canvas.mask().get(PixelPos::new(5, 5)), Some(color));
        assert_eq!(canvas.mask().get(PixelPos::new(20, 5)), Some(color));
        assert_eq!(canvas.mask().instance_colors().len(), 1);
    }

    #[test]
    fn test_each_stroke_gets_new_color() {
        let mut canvas = canvas(seeded());
        let first = canvas.begin_stroke(PixelPos::new(5, 5)).unwrap().unwrap();
        canvas.end_stroke();
        let second = canvas.begin_stroke(PixelPos::new(20, 15)).unwrap().unwrap();
        canvas.end_stroke();
        assert_ne!(first, second);
        assert!(canvas.allocator().is_allocated(first));
        assert!(canvas.allocator().is_allocated(second));
    }

    #[test]
    fn test_press_outside_mask_is_ignored() {
        let mut canvas = canvas(seeded());
        assert_eq!(canvas.begin_stroke(PixelPos::new(-3, 4)).unwrap(), None);
        assert_eq!(canvas.begin_stroke(PixelPos::new(32, 4)).unwrap(), None);
        assert_eq!(canvas.state(), CanvasState::Idle);
        assert!(canvas.history().is_empty());
        assert_eq!(canvas.allocator().allocated_count(), 0);
    }

    #[test]
    fn test_undo_ignored_while_drawing() {
        let mut canvas = canvas(seeded());
        canvas.begin_stroke(PixelPos::new(5, 5)).unwrap();
        assert_eq!(canvas.undo(), UndoOutcome::StrokeInProgress);
        assert!(canvas.mask().painted_pixel_count() > 0);

        canvas.end_stroke();
        assert_eq!(canvas.undo(), UndoOutcome::Reverted);
        assert_eq!(canvas.mask().painted_pixel_count(), 0);
        assert_eq!(canvas.undo(), UndoOutcome::NothingToUndo);
    }

    #[test]
    fn test_exhaustion_leaves_state_untouched() {
        let config = AnnotatorConfig {
            brightness_threshold: 255,
            ..seeded()
        };
        let mut canvas = canvas(config);
        canvas.begin_stroke(PixelPos::new(5, 5)).unwrap();
        canvas.end_stroke();
        let before = canvas.mask().clone();

        assert!(canvas.begin_stroke(PixelPos::new(20, 20)).is_err());
        assert_eq!(canvas.state(), CanvasState::Idle);
        assert_eq!(canvas.mask(), &before);
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn test_interpolation_fills_gaps() {
        let sparse = {
            let mut canvas = canvas(seeded());
            canvas.begin_stroke(PixelPos::new(2, 10)).unwrap();
            canvas.extend_stroke(PixelPos::new(28, 10));
            canvas.end_stroke();
            canvas.mask().get(PixelPos::new(15, 10))
        };
        assert_eq!(sparse, Some(Color::BACKGROUND));

        let config = AnnotatorConfig {
            interpolate_strokes: true,
            ..seeded()
        };
        let mut canvas = canvas(config);
        let color = canvas.begin_stroke(PixelPos::new(2, 10)).unwrap();
        canvas.extend_stroke(PixelPos::new(28, 10));
        canvas.end_stroke();
        assert_eq!(canvas.mask().get(PixelPos::new(15, 10)), color);
    }

    #[test]
    fn test_stroke_touches_only_its_discs() {
        let mut canvas = canvas(seeded());
        let samples = [
            PixelPos::new(4, 4),
            PixelPos::new(11, 7),
            PixelPos::new(19, 6),
            PixelPos::new(30, 22),
        ];
        let radius = canvas.brush.radius as i32;

        let color = canvas.begin_stroke(samples[0]).unwrap().unwrap();
        for &pos in &samples[1..] {
            assert!(canvas.extend_stroke(pos));
        }
        canvas.end_stroke();

        let (width, height) = canvas.mask().dimensions();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let covered = samples.iter().any(|c| {
                    (x - c.x) * (x - c.x) + (y - c.y) * (y - c.y) <= radius * radius
                });
                let expected = if covered { color } else { Color::BACKGROUND };
                assert_eq!(
                    canvas.mask().get(PixelPos::new(x, y)),
                    Some(expected),
                    "pixel ({}, {})",
                    x,
                    y
                );
            }
        }
    }
}
