//! Reading source images and writing masks.

use std::path::Path;

use image::{ImageFormat, RgbImage};

use crate::error::{AnnotatorError, AnnotatorResult};
use crate::mask::Mask;

/// Image decode/encode backend used by a session.
pub trait ImageCodec {
    /// Unique identifier for this codec (e.g., "file").
    fn id(&self) -> &'static str;

    /// Decode the image at `path` into 8-bit RGB.
    fn decode(&self, path: &Path) -> AnnotatorResult<RgbImage>;

    /// Write `mask` to `path` without altering any pixel value.
    fn encode(&self, mask: &Mask, path: &Path) -> AnnotatorResult<()>;
}

/// Formats that store 8-bit RGB without loss.
const LOSSLESS_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::Tga,
    ImageFormat::Pnm,
];

/// Codec backed by the local filesystem.
///
/// Encoding picks the format from the file extension and refuses lossy
/// ones, since instance identity lives in exact pixel values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCodec;

impl FileCodec {
    /// Format for `path`, if it is one we can write losslessly.
    pub fn lossless_format(path: &Path) -> Option<ImageFormat> {
        ImageFormat::from_path(path)
            .ok()
            .filter(|format| LOSSLESS_FORMATS.contains(format))
    }
}

impl ImageCodec for FileCodec {
    fn id(&self) -> &'static str {
        "file"
    }

    fn decode(&self, path: &Path) -> AnnotatorResult<RgbImage> {
        let img = image::open(path)
            .map_err(|source| AnnotatorError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        log::trace!(
            "FileCodec: decoded {:?} ({}x{})",
            path,
            img.width(),
            img.height()
        );
        Ok(img)
    }

    fn encode(&self, mask: &Mask, path: &Path) -> AnnotatorResult<()> {
        let format =
            Self::lossless_format(path).ok_or_else(|| AnnotatorError::LossyExportFormat {
                path: path.to_path_buf(),
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| AnnotatorError::export_io(path, err))?;
        }

        mask.as_image()
            .save_with_format(path, format)
            .map_err(|err| AnnotatorError::export_io(path, err))?;
        log::trace!("FileCodec: wrote {:?} as {:?}", path, format);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::mask::PixelPos;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mask-annotator-codec-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_lossless_detection() {
        assert_eq!(
            FileCodec::lossless_format(Path::new("out/mask.png")),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            FileCodec::lossless_format(Path::new("mask.BMP")),
            Some(ImageFormat::Bmp)
        );
        assert_eq!(FileCodec::lossless_format(Path::new("mask.jpg")), None);
        assert_eq!(FileCodec::lossless_format(Path::new("mask")), None);
    }

    #[test]
    fn test_png_round_trip_is_exact() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("deep").join("mask.png");

        let mut mask = Mask::new(5, 4);
        mask.put(PixelPos::new(0, 0), Color::new(255, 1, 128));
        mask.put(PixelPos::new(4, 3), Color::new(81, 82, 83));

        FileCodec.encode(&mask, &path).unwrap();
        let decoded = FileCodec.decode(&path).unwrap();
        assert_eq!(Mask::from(decoded), mask);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_lossy_export_rejected() {
        let path = scratch_dir("lossy").join("mask.jpg");
        let err = FileCodec.encode(&Mask::new(2, 2), &path).unwrap_err();
        assert!(matches!(err, AnnotatorError::LossyExportFormat { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path_is_export_error() {
        let dir = scratch_dir("blocked");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = FileCodec
            .encode(&Mask::new(2, 2), &blocker.join("mask.png"))
            .unwrap_err();
        assert!(matches!(err, AnnotatorError::ExportIo { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_source_is_decode_error() {
        let err = FileCodec
            .decode(Path::new("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, AnnotatorError::Decode { .. }));
    }
}
