use crate::common::Frame;
use crate::error::CaptureError;

/// An opened camera handle. Exclusively owned by the capture loop while it
/// runs; dropping it releases the device.
pub trait CaptureDevice: Send {
    /// Blocks until the next frame is available or the device fails.
    fn grab(&mut self) -> Result<Frame, CaptureError>;
}

/// Opens a capture device by platform index. Device access itself is a
/// platform capability; the crate only depends on this seam.
pub trait DeviceOpener: Send + Sync {
    fn open(&self, index: u32) -> Result<Box<dyn CaptureDevice>, CaptureError>;
}

/// Tries the configured device indices in order (primary, then fallback)
/// and returns the first device that opens.
pub fn open_first(
    opener: &dyn DeviceOpener,
    indices: &[u32],
) -> Result<Box<dyn CaptureDevice>, CaptureError> {
    for &index in indices {
        match opener.open(index) {
            Ok(device) => {
                tracing::info!("Opened capture device at index {}", index);
                return Ok(device);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open capture device {}: {}. Check that the camera is connected and drivers are installed.",
                    index,
                    e
                );
            }
        }
    }
    Err(CaptureError::DeviceUnavailable(indices.to_vec()))
}
