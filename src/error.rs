//! Error types for mask annotation sessions.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type AnnotatorResult<T> = std::result::Result<T, AnnotatorError>;

/// Errors surfaced by the mask-editing core and the session controller.
///
/// Malformed input (out-of-bounds pointers, unknown keys, foreign buttons)
/// never produces an error; it is ignored by the canvas.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// No unused color satisfies the brightness threshold.
    #[error(
        "color space exhausted: {allocated} colors allocated, none left with brightness >= {threshold}"
    )]
    ColorSpaceExhausted {
        /// The configured brightness threshold
        threshold: u8,
        /// Number of colors handed out so far
        allocated: usize,
    },

    /// The mask could not be written to its save path.
    #[error("failed to export mask to {path:?}: {source}")]
    ExportIo {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O or encoder failure
        #[source]
        source: ExportSource,
    },

    /// The save path maps to a lossy or unknown image format.
    #[error("refusing to export mask to {path:?}: format is not lossless")]
    LossyExportFormat {
        /// The rejected destination
        path: PathBuf,
    },

    /// The source image could not be read or decoded.
    #[error("failed to decode image {path:?}: {source}")]
    Decode {
        /// Path of the source image
        path: PathBuf,
        /// Decoder failure
        #[source]
        source: image::ImageError,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Root cause of an [`AnnotatorError::ExportIo`].
#[derive(Error, Debug)]
pub enum ExportSource {
    /// Creating the parent directory failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The image encoder failed
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl AnnotatorError {
    /// Wrap an export failure with the path it was writing to.
    pub fn export_io(path: impl Into<PathBuf>, source: impl Into<ExportSource>) -> Self {
        Self::ExportIo {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Errors from loading, saving or validating an [`AnnotatorConfig`](crate::config::AnnotatorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error while reading or writing the config file
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("invalid config: {message}")]
    Invalid {
        /// Description of the offending value
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_names_path() {
        let err = AnnotatorError::export_io(
            "/nowhere/mask.png",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/nowhere/mask.png"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: AnnotatorError = ConfigError::invalid("circle_size must be >= 1").into();
        assert!(matches!(err, AnnotatorError::Config(ConfigError::Invalid { .. })));
        assert_eq!(err.to_string(), "invalid config: circle_size must be >= 1");
    }
}
