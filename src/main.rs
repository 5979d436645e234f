use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use image::{DynamicImage, ImageBuffer, Rgb};
use tracing::Level;

use turnstile::capture::{CaptureDevice, DeviceOpener};
use turnstile::error::{AttendanceError, CaptureError, DirectoryError};
use turnstile::{
    CheckInOutcome, CheckInPipeline, CodeDecoder, Frame, MemberDirectory, MemberRecord,
    ResultSink, ScanCode, ScanError, ScannerConfig,
};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

// A stand-in camera so the kiosk loop can run end to end without hardware:
// blank frames at the configured cadence, with a badge "held up" to the
// lens every few seconds via the paired decoder.

struct SimulatedCamera;

impl CaptureDevice for SimulatedCamera {
    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let image = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            320,
            240,
            Rgb([40, 40, 40]),
        ));
        Ok(Frame::new(image, Utc::now()))
    }
}

struct SimulatedOpener;

impl DeviceOpener for SimulatedOpener {
    fn open(&self, index: u32) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        if index == 0 {
            Ok(Box::new(SimulatedCamera))
        } else {
            Err(CaptureError::OpenFailed {
                index,
                reason: "simulator only exposes index 0".into(),
            })
        }
    }
}

/// Pretends a badge appears roughly every six seconds, cycling through a
/// known, an expiring, an expired and an unknown code.
struct BadgeFeed {
    frames_seen: AtomicU64,
}

impl CodeDecoder for BadgeFeed {
    fn decode(&self, _frame: &Frame) -> Result<Option<ScanCode>, turnstile::error::DecodeError> {
        const CODES: [&str; 4] = ["MBR-1001", "MBR-2002", "MBR-3003", "UNKNOWN"];
        let n = self.frames_seen.fetch_add(1, Ordering::Relaxed);
        if n % 180 == 0 {
            let code = CODES[(n / 180) as usize % CODES.len()];
            Ok(Some(ScanCode::from(code)))
        } else {
            Ok(None)
        }
    }
}

struct InMemoryDirectory {
    members: HashMap<ScanCode, MemberRecord>,
}

impl InMemoryDirectory {
    fn seeded() -> Self {
        let today = Utc::now().date_naive();
        let members = [
            ("MBR-1001", 1, "Ada Lovelace", today + Duration::days(90)),
            ("MBR-2002", 2, "Edsger Dijkstra", today + Duration::days(3)),
            ("MBR-3003", 3, "Grace Hopper", today - Duration::days(10)),
        ]
        .into_iter()
        .map(|(code, id, name, valid_until)| {
            (
                ScanCode::from(code),
                MemberRecord {
                    id,
                    full_name: name.to_string(),
                    phone: "555-0100".to_string(),
                    valid_until,
                    photo_path: None,
                },
            )
        })
        .collect();
        Self { members }
    }
}

#[async_trait]
impl MemberDirectory for InMemoryDirectory {
    async fn lookup_by_scan_code(
        &self,
        code: &ScanCode,
    ) -> Result<Option<MemberRecord>, DirectoryError> {
        Ok(self.members.get(code).cloned())
    }
}

struct LogAttendance;

#[async_trait]
impl turnstile::AttendanceSink for LogAttendance {
    async fn record(&self, member_id: i64, at: DateTime<Utc>) -> Result<(), AttendanceError> {
        tracing::info!("Attendance recorded: member {} at {}", member_id, at);
        Ok(())
    }
}

struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn on_frame(&mut self, _frame: Frame) {}

    fn on_outcome(&mut self, outcome: CheckInOutcome) {
        match outcome {
            CheckInOutcome::NoCode => {}
            CheckInOutcome::Welcome {
                member,
                status,
                days_remaining,
            } => tracing::info!(
                "Welcome, {}! ({:?}, {} days remaining)",
                member.full_name,
                status,
                days_remaining
            ),
            CheckInOutcome::Expired { member } => {
                tracing::warn!("Membership expired: {}", member.full_name)
            }
            CheckInOutcome::Unrecognized { code } => {
                tracing::warn!("Scan code not recognized: {}", code)
            }
            other => tracing::warn!("{:?}", other),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ScanError> {
    init_logging();
    let config = ScannerConfig::load();

    let mut pipeline = CheckInPipeline::builder(config)
        .opener(Arc::new(SimulatedOpener))
        .decoder(Box::new(BadgeFeed {
            frames_seen: AtomicU64::new(0),
        }))
        .directory(Arc::new(InMemoryDirectory::seeded()))
        .attendance(Arc::new(LogAttendance))
        .sink(Box::new(ConsoleSink))
        .build()?;

    pipeline.start()?;
    tracing::info!("Scanning; press Ctrl-C to stop");
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to listen for shutdown signal");
    }
    pipeline.shutdown().await;
    Ok(())
}
