//! One annotation session: source image, display copy, canvas and export.
//!
//! The session is driven by a feed of [`InputEvent`]s and knows nothing about
//! how they are captured. Pointer and key events are mapped onto canvas
//! operations according to the configured paint button and undo key; a
//! [`InputEvent::Close`] (or the end of the feed) exports the mask.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::canvas::{MaskCanvas, StrokeSummary};
use crate::codec::{FileCodec, ImageCodec};
use crate::color::Color;
use crate::config::AnnotatorConfig;
use crate::contrast::{Clahe, ContrastFilter};
use crate::error::AnnotatorResult;
use crate::event::InputEvent;
use crate::mask::{Mask, PixelPos};
use crate::undo::UndoOutcome;


/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event had no effect
    Ignored,
    /// A stroke began with the given instance color
    StrokeStarted(Color),
    /// The active stroke was stamped at a new position
    StrokeExtended,
    /// The active stroke ended
    StrokeFinished(StrokeSummary),
    /// The undo key was handled
    Undo(UndoOutcome),
    /// The session exported its mask and closed
    Closed(PathBuf),
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
}

/// Orchestrates one image's annotation from load to export.
pub struct Session {
    config: AnnotatorConfig,
    source: RgbImage,
    display: RgbImage,
    canvas: MaskCanvas,
    mask_save_path: PathBuf,
    codec: Box<dyn ImageCodec>,
    dirty: bool,
    status: SessionStatus,
}

impl Session {
    /// Load `image_path` from disk and start a session that saves to `mask_save_path`.
    pub fn open(
        image_path: &Path,
        mask_save_path: impl Into<PathBuf>,
        config: AnnotatorConfig,
    ) -> AnnotatorResult<Self> {
        Self::open_with_codec(image_path, mask_save_path, config, Box::new(FileCodec))
    }

    /// Like [`Session::open`], with a caller-supplied codec.
    pub fn open_with_codec(
        image_path: &Path,
        mask_save_path: impl Into<PathBuf>,
        config: AnnotatorConfig,
        codec: Box<dyn ImageCodec>,
    ) -> AnnotatorResult<Self> {
        let image = codec.decode(image_path)?;
        log::info!(
            "Opened {:?} ({}x{})",
            image_path,
            image.width(),
            image.height()
        );
        Self::from_image(image, mask_save_path, config, codec)
    }

    /// Start a session over an already decoded image.
    pub fn from_image(
        image: RgbImage,
        mask_save_path: impl Into<PathBuf>,
        config: AnnotatorConfig,
        codec: Box<dyn ImageCodec>,
    ) -> AnnotatorResult<Self> {
        config.validate()?;

        let display = if config.apply_clahe {
            let filter = Clahe::from(config.clahe);
            log::debug!("Enhancing display copy with {}", filter.name());
            filter.enhance(&image)
        } else {
            image.clone()
        };
        let canvas = MaskCanvas::new(image.width(), image.height(), &config);

        Ok(Self {
            config,
            source: image,
            display,
            canvas,
            mask_save_path: mask_save_path.into(),
            codec,
            dirty: false,
            status: SessionStatus::Open,
        })
    }

    /// Apply one input event.
    ///
    /// Only allocator exhaustion and export failures are errors; everything
    /// else that does not apply is reported as [`EventOutcome::Ignored`].
    pub fn handle_event(&mut self, event: InputEvent) -> AnnotatorResult<EventOutcome> {
        if self.status == SessionStatus::Closed {
            log::trace!("Session closed, dropping {:?}", event);
            return Ok(EventOutcome::Ignored);
        }

        let outcome = match event {
            InputEvent::PointerDown { button, x, y } if button == self.config.paint_button => {
                match self.canvas.begin_stroke(PixelPos::from_pointer(x, y))? {
                    Some(color) => {
                        self.dirty = true;
                        EventOutcome::StrokeStarted(color)
                    }
                    None => EventOutcome::Ignored,
                }
            }
            InputEvent::PointerMove { x, y } => {
                if self.canvas.extend_stroke(PixelPos::from_pointer(x, y)) {
                    EventOutcome::StrokeExtended
                } else {
                    EventOutcome::Ignored
                }
            }
            InputEvent::PointerUp { button } if button == self.config.paint_button => {
                match self.canvas.end_stroke() {
                    Some(summary) => EventOutcome::StrokeFinished(summary),
                    None => EventOutcome::Ignored,
                }
            }
            InputEvent::KeyPress { key } if key == self.config.undo_key => {
                let result = self.canvas.undo();
                if result == UndoOutcome::Reverted {
                    self.dirty = true;
                }
                EventOutcome::Undo(result)
            }
            InputEvent::Close => EventOutcome::Closed(self.close()?),
            other => {
                log::trace!("Ignoring {:?}", other);
                EventOutcome::Ignored
            }
        };
        Ok(outcome)
    }

    /// Feed `events` until the session closes. A feed that ends without a
    /// close event closes the session as if the window had been closed.
    pub fn run<I>(&mut self, events: I) -> AnnotatorResult<PathBuf>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        for event in events {
            if let EventOutcome::Closed(path) = self.handle_event(event)? {
                return Ok(path);
            }
        }
        log::debug!("Event feed ended, closing session");
        self.close()
    }

    /// Export the mask to the save path. May be retried after a failure.
    pub fn save(&mut self) -> AnnotatorResult<()> {
        if let Err(err) = self.codec.encode(self.canvas.mask(), &self.mask_save_path) {
            log::warn!("Export failed: {}", err);
            return Err(err);
        }
        self.dirty = false;
        log::info!(
            "Saved mask with {} instance(s) to {:?}",
            self.canvas.mask().instance_colors().len(),
            self.mask_save_path
        );
        Ok(())
    }

    /// End any stroke in progress, export, and mark the session closed.
    ///
    /// On export failure the session stays open with its mask intact.
    pub fn close(&mut self) -> AnnotatorResult<PathBuf> {
        if self.status == SessionStatus::Closed {
            return Ok(self.mask_save_path.clone());
        }
        if let Some(summary) = self.canvas.end_stroke() {
            log::debug!("Closing mid-stroke; kept stroke {}", summary.color);
        }
        self.save()?;
        self.status = SessionStatus::Closed;
        Ok(self.mask_save_path.clone())
    }

    /// The display image with every painted mask pixel drawn over it.
    pub fn overlay_frame(&self) -> RgbImage {
        let mut frame = self.display.clone();
        for (out, mask_px) in frame.pixels_mut().zip(self.canvas.mask().as_image().pixels()) {
            if !Color::from(*mask_px).is_background() {
                *out = *mask_px;
            }
        }
        frame
    }

    pub fn mask(&self) -> &Mask {
        self.canvas.mask()
    }

    pub fn canvas(&self) -> &MaskCanvas {
        &self.canvas
    }

    /// The image as loaded; never modified.
    pub fn source_image(&self) -> &RgbImage {
        &self.source
    }

    /// The image shown to the user (enhanced when CLAHE is on).
    pub fn display_image(&self) -> &RgbImage {
        &self.display
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn mask_save_path(&self) -> &Path {
        &self.mask_save_path
    }

    /// Whether the mask changed since the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dimensions", &self.source.dimensions())
            .field("mask_save_path", &self.mask_save_path)
            .field("codec", &self.codec.id())
            .field("state", &self.canvas.state())
            .field("dirty", &self.dirty)
            .field("status", &self.status)
            .finish()
    }
}
