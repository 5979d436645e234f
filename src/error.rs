use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("The pipeline is already running.")]
    AlreadyRunning,
    #[error("Pipeline is missing required component: {0}")]
    MissingComponent(&'static str),
}

// Camera/device error type
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No capture device available, tried indices {0:?}")]
    DeviceUnavailable(Vec<u32>),
    #[error("Failed to open capture device {index}: {reason}")]
    OpenFailed { index: u32, reason: String },
    #[error("Failed to grab frame: {0}")]
    GrabFailed(String),
}

/// Per-frame decode fault. Swallowed each tick and treated as no-code.
#[derive(Error, Debug)]
#[error("Failed to decode frame: {0}")]
pub struct DecodeError(pub String);

#[derive(Error, Debug)]
#[error("Member directory lookup failed: {0}")]
pub struct DirectoryError(pub String);

#[derive(Error, Debug)]
#[error("Failed to record attendance: {0}")]
pub struct AttendanceError(pub String);
