//! Capture side: frame source → motion tracker → control datagrams

pub mod pgm;

pub use pgm::{parse_pgm, PgmDirectorySource, PgmError};

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::net::{ControlSender, SendError};
use crate::tracking::{ControlVector, FrameError, GrayFrame, MotionTracker};

/// Anything that yields grayscale frames; `None` means exhausted
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>, CaptureError>;
}

/// Frames held in memory, handed out in order
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<GrayFrame>,
}

impl FrameQueue {
    pub fn new(frames: impl IntoIterator<Item = GrayFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for FrameQueue {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>, CaptureError> {
        Ok(self.frames.pop_front())
    }
}

/// Capture errors
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad frame {}: {source}", .path.display())]
    Pgm {
        path: PathBuf,
        #[source]
        source: PgmError,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Send(#[from] SendError),
}

/// Drives one tracker from one source and reports as one device
pub struct CapturePipeline<S: FrameSource> {
    source: S,
    tracker: MotionTracker,
    sender: ControlSender,
    mirror: bool,
    pace: Duration,
}

impl<S: FrameSource> CapturePipeline<S> {
    pub fn new(source: S, sender: ControlSender) -> Self {
        Self {
            source,
            tracker: MotionTracker::new(),
            sender,
            mirror: true,
            pace: Duration::ZERO,
        }
    }

    /// Flip frames horizontally before tracking
    pub fn mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Minimum delay between frames
    pub fn pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    /// Process the next frame and send its vector
    ///
    /// Returns `None` once the source is exhausted. A failed send is logged
    /// and the vector is still returned; delivery is best effort.
    pub async fn step(&mut self) -> Result<Option<ControlVector>, CaptureError> {
        let Some(frame) = self.source.next_frame()? else {
            return Ok(None);
        };
        let frame = if self.mirror { frame.flip_horizontal() } else { frame };

        let vector = self.tracker.process(frame);
        if let Err(e) = self.sender.send(vector).await {
            warn!(device = %self.sender.device(), error = %e, "Control update not sent");
        }
        debug!(x = vector.x(), y = vector.y(), "Frame processed");
        Ok(Some(vector))
    }

    /// Run until the source is exhausted or `stop` fires; returns frames processed
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<u64, CaptureError> {
        info!(
            device = %self.sender.device(),
            target = %self.sender.target(),
            mirror = self.mirror,
            "Capture started"
        );

        let mut pacing = interval(self.pace.max(Duration::from_millis(1)));
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut frames = 0u64;
        loop {
            if *stop.borrow() {
                break;
            }

            tokio::select! {
                _ = pacing.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            match self.step().await? {
                Some(_) => frames += 1,
                None => {
                    info!(frames, "Frame source exhausted");
                    break;
                }
            }
        }

        info!(frames, "Capture stopped");
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::decode;
    use tokio::net::UdpSocket;
    use tokio_test::assert_ok;

    fn blank(width: usize, height: usize) -> GrayFrame {
        GrayFrame::from_fn(width, height, |x, y| ((x * 7 + y * 13) % 200) as u8)
    }

    #[tokio::test]
    async fn every_frame_sends_one_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = ControlSender::connect(receiver.local_addr().unwrap(), "joystick1")
            .await
            .unwrap();

        let source = FrameQueue::new([blank(64, 48), blank(64, 48), blank(64, 48)]);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let frames = assert_ok!(CapturePipeline::new(source, sender).run(stop_rx).await);
        assert_eq!(frames, 3);

        let mut buf = [0u8; 64];
        for _ in 0..3 {
            let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
            let packet = decode(&buf[..n]).unwrap();
            assert_eq!(packet.name, "joystick1");
            assert_eq!((packet.x, packet.y), (0.0, 0.0));
        }
    }

    #[tokio::test]
    async fn step_reports_exhaustion() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = ControlSender::connect(receiver.local_addr().unwrap(), "cam")
            .await
            .unwrap();

        let mut pipeline = CapturePipeline::new(FrameQueue::new([blank(32, 32)]), sender).mirror(false);
        assert_eq!(pipeline.step().await.unwrap(), Some(ControlVector::ZERO));
        assert_eq!(pipeline.step().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stop_signal_ends_run_early() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = ControlSender::connect(receiver.local_addr().unwrap(), "cam")
            .await
            .unwrap();

        let source = FrameQueue::new(std::iter::repeat_with(|| blank(16, 16)).take(10_000));
        let (stop_tx, stop_rx) = watch::channel(false);
        let pipeline = CapturePipeline::new(source, sender).pace(Duration::from_millis(5));

        let task = tokio::spawn(pipeline.run(stop_rx));
        tokio::time::sleep(Duration::from_millis(40)).await;
        stop_tx.send(true).unwrap();

        let frames = task.await.unwrap().unwrap();
        assert!(frames < 10_000);
    }
}
