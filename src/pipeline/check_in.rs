use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::capture::{CaptureEvent, DeviceOpener, FrameSource};
use crate::common::Frame;
use crate::config::ScannerConfig;
use crate::decode::{CodeDecoder, ScanCode};
use crate::directory::{
    days_remaining, membership_status, AttendanceSink, MemberDirectory, MembershipStatus,
};
use crate::error::ScanError;
use crate::pipeline::gate::CheckInGate;
use crate::pipeline::outcome::{CheckInOutcome, FaultStage};
use crate::pipeline::publish::{spawn_forwarder, ResultPublisher, ResultSink};

/// Decode, gate, lookup and record for a single frame. Owned by one
/// pipeline; ticks run strictly serialized, so the cooldown state needs no
/// sharing beyond the mutex the tick task holds while processing.
struct ScanProcessor {
    gate: CheckInGate,
    decoder: Box<dyn CodeDecoder>,
    directory: Arc<dyn MemberDirectory>,
    attendance: Arc<dyn AttendanceSink>,
    expiring_soon_days: i64,
}

impl ScanProcessor {
    async fn process_frame(&mut self, frame: &Frame, publisher: &ResultPublisher) {
        match self.decoder.decode(frame) {
            Ok(Some(code)) => {
                self.process_code(code, Instant::now(), Utc::now(), publisher)
                    .await;
            }
            Ok(None) => publisher.publish_outcome(CheckInOutcome::NoCode),
            Err(e) => {
                // Unreadable frame data is normal wear, not a reason to stop.
                tracing::warn!("Decode fault, treating as no code: {}", e);
                publisher.publish_outcome(CheckInOutcome::NoCode);
            }
        }
    }

    /// Cooldown check comes first so that suppressed and duplicate scans
    /// never reach the directory at all.
    async fn process_code(
        &mut self,
        code: ScanCode,
        now: Instant,
        wall_now: DateTime<Utc>,
        publisher: &ResultPublisher,
    ) {
        if !self.gate.admit(now) {
            tracing::debug!("Scan {} suppressed by cooldown", code);
            return;
        }

        let member = match self.directory.lookup_by_scan_code(&code).await {
            Ok(member) => member,
            Err(e) => {
                tracing::error!("Directory lookup for scan {} failed: {}", code, e);
                publisher.publish_outcome(CheckInOutcome::Fault {
                    stage: FaultStage::Directory,
                    reason: e.to_string(),
                });
                return;
            }
        };
        let Some(member) = member else {
            tracing::info!("Scan code {} not recognized", code);
            publisher.publish_outcome(CheckInOutcome::Unrecognized { code });
            return;
        };

        let today = wall_now.date_naive();
        match membership_status(member.valid_until, today, self.expiring_soon_days) {
            MembershipStatus::Expired => {
                tracing::info!("Member {} scanned with expired membership", member.id);
                publisher.publish_outcome(CheckInOutcome::Expired { member });
            }
            status => match self.attendance.record(member.id, wall_now).await {
                Ok(()) => {
                    tracing::info!("Member {} checked in", member.id);
                    publisher.publish_outcome(CheckInOutcome::Welcome {
                        days_remaining: days_remaining(member.valid_until, today),
                        member,
                        status,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to record attendance for member {}: {}", member.id, e);
                    publisher.publish_outcome(CheckInOutcome::Fault {
                        stage: FaultStage::Attendance,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }
}

struct Running {
    cancel_token: CancellationToken,
    source: FrameSource,
    tick_task: tokio::task::JoinHandle<()>,
}

/// Orchestrates the check-in loop: frame source, decoder, cooldown gate,
/// directory lookup and attendance dispatch. `Idle` until `start()`;
/// `start()`/`stop()` may be called repeatedly, and the cooldown window
/// survives restarts.
pub struct CheckInPipeline {
    config: ScannerConfig,
    opener: Arc<dyn DeviceOpener>,
    processor: Arc<Mutex<ScanProcessor>>,
    publisher: ResultPublisher,
    forwarder: tokio::task::JoinHandle<()>,
    running: Option<Running>,
}

impl CheckInPipeline {
    pub fn builder(config: ScannerConfig) -> CheckInPipelineBuilder {
        CheckInPipelineBuilder::new(config)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.tick_task.is_finished())
    }

    /// Opens a camera (primary index, then the one fallback) and starts
    /// consuming frames. Fails with `DeviceUnavailable` when neither opens
    /// and with `AlreadyRunning` when called while running.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.is_running() {
            return Err(ScanError::AlreadyRunning);
        }
        self.running = None;

        let (frame_tx, frame_rx) = tokio::sync::mpsc::channel(self.config.frame_buffer_size);
        let source = FrameSource::start(
            self.opener.as_ref(),
            &self.config.device_indices,
            self.config.capture_period(),
            frame_tx,
        )?;
        let cancel_token = CancellationToken::new();
        let tick_task = tokio::spawn(run_tick_loop(
            self.processor.clone(),
            frame_rx,
            self.publisher.clone(),
            self.config.stall_timeout(),
            cancel_token.clone(),
        ));
        self.running = Some(Running {
            cancel_token,
            source,
            tick_task,
        });
        tracing::info!("Check-in pipeline running");
        Ok(())
    }

    /// Idempotent. Cancels the tick loop, stops the camera and awaits the
    /// in-flight tick; once this returns the device is released and no
    /// further tick can start.
    pub async fn stop(&mut self) {
        if let Some(mut running) = self.running.take() {
            running.cancel_token.cancel();
            // Await the tick task first: dropping its receiver unblocks a
            // capture thread stuck reporting into a full channel, so the
            // join below cannot hang.
            if running.tick_task.await.is_err() {
                tracing::error!("Tick task panicked");
            }
            running.source.stop();
            tracing::info!("Check-in pipeline stopped");
        }
    }

    /// Stops the pipeline and waits for every queued outcome to reach the
    /// result sink.
    pub async fn shutdown(mut self) {
        self.stop().await;
        let CheckInPipeline {
            publisher,
            forwarder,
            ..
        } = self;
        drop(publisher);
        if forwarder.await.is_err() {
            tracing::error!("Result forwarder panicked");
        }
    }
}

async fn run_tick_loop(
    processor: Arc<Mutex<ScanProcessor>>,
    mut frame_rx: Receiver<CaptureEvent>,
    publisher: ResultPublisher,
    stall_timeout: Duration,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            event = tokio::time::timeout(stall_timeout, frame_rx.recv()) => match event {
                Err(_) => {
                    tracing::warn!("No frame within {:?}, source appears stalled", stall_timeout);
                    publisher.publish_outcome(CheckInOutcome::SourceStalled);
                }
                Ok(None) => break,
                Ok(Some(CaptureEvent::Failed(e))) => {
                    tracing::error!("Capture source failed, pipeline going idle: {}", e);
                    publisher.publish_outcome(CheckInOutcome::SourceFailed {
                        reason: e.to_string(),
                    });
                    break;
                }
                Ok(Some(CaptureEvent::Frame(frame))) => {
                    // Live preview updates regardless of what the frame holds.
                    publisher.publish_frame(frame.clone());
                    processor.lock().await.process_frame(&frame, &publisher).await;
                }
            }
        }
    }
}

pub struct CheckInPipelineBuilder {
    config: ScannerConfig,
    opener: Option<Arc<dyn DeviceOpener>>,
    decoder: Option<Box<dyn CodeDecoder>>,
    directory: Option<Arc<dyn MemberDirectory>>,
    attendance: Option<Arc<dyn AttendanceSink>>,
    sink: Option<Box<dyn ResultSink>>,
}

impl CheckInPipelineBuilder {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            opener: None,
            decoder: None,
            directory: None,
            attendance: None,
            sink: None,
        }
    }

    pub fn opener(mut self, opener: Arc<dyn DeviceOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn decoder(mut self, decoder: Box<dyn CodeDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn MemberDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn attendance(mut self, attendance: Arc<dyn AttendanceSink>) -> Self {
        self.attendance = Some(attendance);
        self
    }

    pub fn sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the idle pipeline and spawns its result forwarder task. Must
    /// run inside a tokio runtime.
    pub fn build(self) -> Result<CheckInPipeline, ScanError> {
        let opener = self.opener.ok_or(ScanError::MissingComponent("opener"))?;
        let decoder = self.decoder.ok_or(ScanError::MissingComponent("decoder"))?;
        let directory = self
            .directory
            .ok_or(ScanError::MissingComponent("directory"))?;
        let attendance = self
            .attendance
            .ok_or(ScanError::MissingComponent("attendance"))?;
        let sink = self.sink.ok_or(ScanError::MissingComponent("sink"))?;

        let (publisher, forwarder) = spawn_forwarder(sink);
        let processor = ScanProcessor {
            gate: CheckInGate::new(self.config.cooldown()),
            decoder,
            directory,
            attendance,
            expiring_soon_days: self.config.expiring_soon_days,
        };
        Ok(CheckInPipeline {
            config: self.config,
            opener,
            processor: Arc::new(Mutex::new(processor)),
            publisher,
            forwarder,
            running: None,
        })
    }
}
