//! Pipeline Thread - latest-frame-wins scan processing.
//!
//! This thread:
//! - Receives `(ScanFrame, OdometryDelta)` pairs through a single-slot crossbeam channel
//! - Drains the slot before each pass and processes only the newest frame
//! - Abandons a pass that has outlived its latency budget when a newer frame arrives
//!
//! A pass started right after an abandoned one always runs to completion,
//! so a steady stream of frames can delay commits but never starve them.
//! Odometry of superseded frames is composed into the frame that replaces
//! them, so skipping a frame never loses motion.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::core::types::{OdometryDelta, ScanFrame};
use crate::engine::{CancelToken, Pipeline};
use crate::error::PipelineError;

/// One frame and the robot motion since the previous frame.
pub type FrameInput = (ScanFrame, OdometryDelta);

/// How long the worker waits before re-checking the running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Worker thread settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineThreadConfig {
    /// Age after which an in-flight pass is abandoned for a newer frame.
    /// Typical: one scanner period (25-100ms)
    pub max_pass_latency: Duration,
}

impl Default for PipelineThreadConfig {
    fn default() -> Self {
        Self {
            max_pass_latency: Duration::from_millis(100),
        }
    }
}

struct InFlight {
    token: CancelToken,
    started: Instant,
    cancellable: bool,
}

/// Handle to the pipeline worker thread.
pub struct PipelineThread {
    pipeline: Arc<Pipeline>,
    config: PipelineThreadConfig,
    sender: Option<Sender<FrameInput>>,
    // Producer-side receiver used to evict the queued frame
    evict: Receiver<FrameInput>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    superseded: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineThread {
    /// Spawn the worker.
    pub fn spawn(pipeline: Arc<Pipeline>, config: PipelineThreadConfig) -> io::Result<Self> {
        let (sender, receiver) = bounded(1);
        let in_flight = Arc::new(Mutex::new(None));
        let superseded = Arc::new(AtomicU64::new(0));
        let running = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            pipeline: Arc::clone(&pipeline),
            receiver: receiver.clone(),
            in_flight: Arc::clone(&in_flight),
            superseded: Arc::clone(&superseded),
            running: Arc::clone(&running),
        };
        let handle = thread::Builder::new()
            .name("drishti-pipeline".into())
            .spawn(move || worker.run())?;

        log::info!(
            "Pipeline thread spawned, pass latency budget {:?}",
            config.max_pass_latency
        );

        Ok(Self {
            pipeline,
            config,
            sender: Some(sender),
            evict: receiver,
            in_flight,
            superseded,
            running,
            handle: Some(handle),
        })
    }

    /// The pipeline driven by this thread.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineThreadConfig {
        &self.config
    }

    /// Whether the worker is still accepting frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Frames skipped or abandoned because a newer one arrived.
    pub fn superseded_frames(&self) -> u64 {
        self.superseded.load(Ordering::Relaxed)
    }

    /// Queue a frame, replacing any frame still waiting.
    ///
    /// A pass older than the latency budget is cancelled. Returns false
    /// once the thread has stopped.
    pub fn submit(&self, frame: ScanFrame, odometry: OdometryDelta) -> bool {
        let Some(sender) = self.sender.as_ref().filter(|_| self.is_running()) else {
            return false;
        };

        if let Some(pass) = self.in_flight.lock().as_ref()
            && pass.cancellable
            && pass.started.elapsed() > self.config.max_pass_latency
        {
            pass.token.cancel();
        }

        match push_latest(sender, &self.evict, (frame, odometry)) {
            Some(evicted) => {
                self.superseded.fetch_add(evicted, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(pass) = self.in_flight.lock().as_ref() {
            pass.token.cancel();
        }
        self.sender.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("Pipeline thread panicked");
        }
    }
}

impl Drop for PipelineThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Put `input` in the single-slot queue, folding the motion of an evicted
/// frame in front of its own.
///
/// Returns the number of evicted frames, or `None` if the worker is gone.
fn push_latest(
    sender: &Sender<FrameInput>,
    evict: &Receiver<FrameInput>,
    mut input: FrameInput,
) -> Option<u64> {
    let mut evicted = 0;
    loop {
        match sender.try_send(input) {
            Ok(()) => return Some(evicted),
            Err(TrySendError::Full(back)) => {
                input = match evict.try_recv() {
                    Ok((_, older)) => {
                        evicted += 1;
                        (back.0, older.compose(&back.1))
                    }
                    // Worker took it first
                    Err(_) => back,
                };
            }
            Err(TrySendError::Disconnected(_)) => return None,
        }
    }
}

struct Worker {
    pipeline: Arc<Pipeline>,
    receiver: Receiver<FrameInput>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    superseded: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(self) {
        log::info!("Pipeline thread starting");
        // Motion of abandoned passes, carried into the next frame
        let mut carried: Option<OdometryDelta> = None;

        while self.running.load(Ordering::Acquire) {
            let (mut frame, mut odometry) = match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(input) => input,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            while let Ok((newer, motion)) = self.receiver.try_recv() {
                self.superseded.fetch_add(1, Ordering::Relaxed);
                odometry = odometry.compose(&motion);
                frame = newer;
            }
            let cancellable = carried.is_none();
            if let Some(previous) = carried.take() {
                odometry = previous.compose(&odometry);
            }

            let token = CancelToken::new();
            *self.in_flight.lock() = Some(InFlight {
                token: token.clone(),
                started: Instant::now(),
                cancellable,
            });
            let result = self.pipeline.process_cancellable(&frame, &odometry, &token);
            self.in_flight.lock().take();

            match result {
                Ok(report) => log::debug!(
                    "Committed frame {} in {:?}",
                    report.frame_index,
                    report.elapsed
                ),
                Err(PipelineError::Cancelled) => {
                    self.superseded.fetch_add(1, Ordering::Relaxed);
                    carried = Some(odometry);
                }
                Err(e) => log::warn!("Frame failed: {}", e),
            }
        }

        self.running.store(false, Ordering::Release);
        log::info!("Pipeline thread stopped");
    }
}
