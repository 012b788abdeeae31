//! Progress reporting and cancellation.
//!
//! [`ProgressCallback`] observes frame sampling and the remote call;
//! [`CancellationToken`] aborts
//! both the sampler (checked before every seek) and the remote model call
//! (raced against the in-flight request).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidverdict::{
//!     CancellationToken, FrameSampler, ProgressCallback, ProgressInfo, SampleOptions,
//!     VideoSource,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {}/{:?}", info.operation, info.current, info.total);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SampleOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//!
//! let frames = FrameSampler::new(options).sample(VideoSource::open("input.mp4")?)?;
//! # Ok::<(), vidverdict::VerdictError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

/// The kind of work being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking and capturing frames from the video.
    FrameSampling,
    /// Waiting on the remote model.
    RemoteAnalysis,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Items (frames) completed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Timestamp of the frame that was just captured.
    pub current_timestamp: Option<Duration>,
}

/// Receives progress updates.
///
/// Sampling callbacks run on the decoding thread, hence `Send + Sync`. They
/// observe but cannot halt the operation; use [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called after every captured frame and once at the end of sampling,
    /// then when the remote call starts and when it succeeds.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation shared by the sampler and the remote call.
///
/// Clones share state. [`cancel`](CancellationToken::cancel) flips an atomic
/// flag for the blocking sampler and wakes every task awaiting
/// [`cancelled`](CancellationToken::cancelled).
///
/// # Example
///
/// ```
/// use vidverdict::CancellationToken;
///
/// let token = CancellationToken::new();
/// let clone = token.clone();
/// assert!(!clone.is_cancelled());
///
/// token.cancel();
/// assert!(clone.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        // Registered before the flag check so a concurrent cancel is not lost.
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing for one operation and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Report that the operation has started, before any item completes.
    pub(crate) fn begin(&self) {
        self.report(None);
    }

    /// Record one completed item and report it.
    pub(crate) fn advance(&mut self, timestamp: Option<Duration>) {
        self.current += 1;
        self.report(timestamp);
    }

    /// Emit the closing report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, timestamp: Option<Duration>) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_timestamp: timestamp,
        });
    }
}
