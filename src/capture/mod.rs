pub mod device;
pub mod frame_source;

pub use device::{CaptureDevice, DeviceOpener};
pub use frame_source::{CaptureEvent, FrameSource};
