pub mod capture;
pub mod common;
pub mod config;
pub mod decode;
pub mod directory;
pub mod error;
pub mod pipeline;

pub use common::Frame;
pub use config::ScannerConfig;
pub use decode::{CodeDecoder, ScanCode};
pub use directory::{AttendanceSink, MemberDirectory, MemberRecord, MembershipStatus};
pub use error::{CaptureError, ScanError};
pub use pipeline::{CheckInOutcome, CheckInPipeline, ResultSink};
