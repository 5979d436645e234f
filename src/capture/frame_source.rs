use std::time::{Duration, Instant};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::capture::device::{open_first, CaptureDevice, DeviceOpener};
use crate::common::Frame;
use crate::error::CaptureError;

/// What the capture thread delivers to the pipeline.
#[derive(Debug)]
pub enum CaptureEvent {
    Frame(Frame),
    /// Mid-run capture failure. The loop has already stopped and the device
    /// is released; the pipeline surfaces this and goes idle.
    Failed(CaptureError),
}

/// Wraps a camera device and produces frames at a fixed target cadence on a
/// dedicated thread until stopped.
pub struct FrameSource {
    cancel_token: CancellationToken,
    capture_thread: Option<std::thread::JoinHandle<()>>,
}

impl FrameSource {
    /// Opens the first available device from `indices` and starts the
    /// capture loop. Fails with `DeviceUnavailable` when every index fails;
    /// there is no retry beyond that single pass.
    pub fn start(
        opener: &dyn DeviceOpener,
        indices: &[u32],
        period: Duration,
        frame_tx: Sender<CaptureEvent>,
    ) -> Result<Self, CaptureError> {
        let device = open_first(opener, indices)?;
        let cancel_token = CancellationToken::new();
        let worker = CaptureWorker {
            device,
            period,
            frame_tx,
        };
        Ok(Self {
            cancel_token: cancel_token.clone(),
            capture_thread: Some(std::thread::spawn(move || worker.run(cancel_token))),
        })
    }

    /// Idempotent. Joins the capture thread, so no frame is produced after
    /// this returns and the device handle has been dropped.
    pub fn stop(&mut self) {
        self.cancel_token.cancel();
        if let Some(thread) = self.capture_thread.take() {
            if thread.join().is_err() {
                tracing::error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

struct CaptureWorker {
    device: Box<dyn CaptureDevice>,
    period: Duration,
    frame_tx: Sender<CaptureEvent>,
}

impl CaptureWorker {
    fn run(mut self, cancel_token: CancellationToken) {
        tracing::info!("Capture loop started with period {:?}", self.period);
        while !cancel_token.is_cancelled() {
            let tick_start = Instant::now();
            match self.device.grab() {
                Ok(frame) => {
                    if !self.send_frame(frame) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Error grabbing frame from camera: {}", e);
                    // Failure must reach the pipeline even when the frame
                    // channel is momentarily full.
                    let _ = self.frame_tx.blocking_send(CaptureEvent::Failed(e));
                    break;
                }
            }
            // Fixed-delay pacing: a grab that overruns the period delays the
            // next tick instead of overlapping it.
            if let Some(remaining) = self.period.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        tracing::info!("Capture loop stopped, device released");
    }

    fn send_frame(&mut self, frame: Frame) -> bool {
        match self.frame_tx.try_send(CaptureEvent::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                // Drop frame to keep real-time
                tracing::warn!("Dropping frame: channel full");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("Frame channel closed, stopping capture loop");
                false
            }
        }
    }
}
