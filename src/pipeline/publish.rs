use tokio::sync::{mpsc, watch};

use crate::common::Frame;
use crate::pipeline::outcome::CheckInOutcome;

/// Presentation-side consumer of the pipeline's output. Callbacks run on a
/// dedicated forwarder task, never on the capture/decode path, so an
/// implementation may block briefly without stalling scanning.
pub trait ResultSink: Send + 'static {
    /// Latest camera frame for live preview. Stale frames are coalesced
    /// before delivery: a slow sink only ever sees the newest frame.
    fn on_frame(&mut self, frame: Frame);
    /// A check-in outcome. Delivered losslessly and in order.
    fn on_outcome(&mut self, outcome: CheckInOutcome);
}

/// Write side of the handoff to the sink. Frames go through a latest-value
/// slot, outcomes through an unbounded queue; neither send ever blocks.
#[derive(Clone)]
pub struct ResultPublisher {
    frame_tx: watch::Sender<Option<Frame>>,
    outcome_tx: mpsc::UnboundedSender<CheckInOutcome>,
}

impl ResultPublisher {
    pub fn publish_frame(&self, frame: Frame) {
        // Overwrites any frame the sink has not consumed yet.
        let _ = self.frame_tx.send(Some(frame));
    }

    pub fn publish_outcome(&self, outcome: CheckInOutcome) {
        if self.outcome_tx.send(outcome).is_err() {
            tracing::warn!("Result sink gone, dropping outcome");
        }
    }
}

/// Spawns the forwarder task that drains both channels into the sink.
/// Outcomes take priority over frames; the task ends once the publisher is
/// dropped and everything pending has been delivered.
pub fn spawn_forwarder(
    mut sink: Box<dyn ResultSink>,
) -> (ResultPublisher, tokio::task::JoinHandle<()>) {
    let (frame_tx, mut frame_rx) = watch::channel(None);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let mut frames_open = true;
        loop {
            tokio::select! {
                biased;
                outcome = outcome_rx.recv() => match outcome {
                    Some(outcome) => sink.on_outcome(outcome),
                    None => break,
                },
                changed = frame_rx.changed(), if frames_open => match changed {
                    Ok(()) => {
                        let latest = frame_rx.borrow_and_update().clone();
                        if let Some(frame) = latest {
                            sink.on_frame(frame);
                        }
                    }
                    Err(_) => frames_open = false,
                },
            }
        }
        // Publisher dropped: deliver outcomes that were already queued.
        while let Ok(outcome) = outcome_rx.try_recv() {
            sink.on_outcome(outcome);
        }
    });

    (
        ResultPublisher {
            frame_tx,
            outcome_tx,
        },
        task,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink {
        frames: Arc<AtomicUsize>,
        outcomes: Arc<AtomicUsize>,
    }

    impl ResultSink for CountingSink {
        fn on_frame(&mut self, _frame: Frame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }

        fn on_outcome(&mut self, _outcome: CheckInOutcome) {
            self.outcomes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn outcomes_are_never_dropped() {
        let outcomes = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            frames: Arc::new(AtomicUsize::new(0)),
            outcomes: outcomes.clone(),
        };
        let (publisher, task) = spawn_forwarder(Box::new(sink));
        for _ in 0..100 {
            publisher.publish_outcome(CheckInOutcome::NoCode);
        }
        drop(publisher);
        task.await.unwrap();
        assert_eq!(outcomes.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn publishing_never_blocks_without_a_consumer() {
        let (frame_tx, _frame_rx) = watch::channel(None);
        let (outcome_tx, _outcome_rx) = mpsc::unbounded_channel();
        let publisher = ResultPublisher {
            frame_tx,
            outcome_tx,
        };
        // A sink that never polls must not be able to stall the tick.
        for _ in 0..1000 {
            publisher.publish_outcome(CheckInOutcome::NoCode);
        }
    }
}
