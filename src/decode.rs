use image::DynamicImage;

use crate::common::Frame;
use crate::error::DecodeError;

/// A code string extracted from a frame, used as the membership lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanCode(pub String);

impl ScanCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScanCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScanCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Extracts a scannable code from a single frame.
///
/// `Ok(None)` is the common case (no code visible) and must be cheap.
/// `Err` means the frame data itself was unreadable; the pipeline logs it
/// and moves on as if no code was found.
pub trait CodeDecoder: Send {
    fn decode(&self, frame: &Frame) -> Result<Option<ScanCode>, DecodeError>;
}

/// Grayscale conversion for decoder implementations that detect better on
/// luma data, matching the kiosk's pre-processing step.
pub fn to_grayscale(frame: &Frame) -> DynamicImage {
    DynamicImage::ImageLuma8(frame.image().to_luma8())
}

impl<F> CodeDecoder for F
where
    F: Fn(&Frame) -> Result<Option<ScanCode>, DecodeError> + Send,
{
    fn decode(&self, frame: &Frame) -> Result<Option<ScanCode>, DecodeError> {
        self(frame)
    }
}
