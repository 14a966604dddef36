//! mask-annotator - instance mask painting core
//!
//! Load an image, paint instance regions with freehand strokes, and export a
//! color-coded segmentation mask. Each instance gets its own bright color;
//! the color is the instance's only identity in the exported file.
//!
//! The GUI is not part of this crate: any front end feeds
//! [`event::InputEvent`]s into a [`Session`], which drives the
//! [`canvas::MaskCanvas`] state machine and exports through an
//! [`codec::ImageCodec`].

pub mod allocator;
pub mod canvas;
pub mod codec;
pub mod color;
pub mod config;
pub mod constants;
pub mod contrast;
pub mod error;
pub mod event;
pub mod mask;
pub mod raster;
pub mod session;
pub mod undo;

pub use color::Color;
pub use config::AnnotatorConfig;
pub use error::{AnnotatorError, AnnotatorResult};
pub use mask::{Mask, PixelPos};
pub use session::{EventOutcome, Session, SessionStatus};
