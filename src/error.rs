//! Error types for the `vidverdict` crate.
//!
//! [`VerdictError`] is the single error type returned by every fallible
//! operation: opening and sampling a video, talking to the remote model, and
//! driving a [`Session`](crate::Session) through its phases. Extraction
//! errors carry paths and timestamps; remote failures are
//! collapsed into [`VerdictError::AnalysisFailed`].

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::session::Phase;

/// The unified error type for all `vidverdict` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerdictError {
    /// The video file could not be opened or probed.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`VideoSource::open`](crate::VideoSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The selected file is not a video.
    #[error("{} is not a video file (detected type: {mime_type})", path.display())]
    NotAVideo {
        /// The rejected path.
        path: PathBuf,
        /// The MIME type detected for it.
        mime_type: String,
    },

    /// Analysis was requested before any file was selected.
    #[error("Please select a video file first.")]
    NoFileSelected,

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video reports a duration of zero.
    #[error("Video has no duration.")]
    ZeroDuration,

    /// A frame count of zero was requested.
    #[error("Frame count must be at least 1")]
    InvalidFrameCount,

    /// No frame could be captured at the given timestamp.
    #[error("Failed to decode video frame at {:.3}s: {reason}", timestamp.as_secs_f64())]
    VideoDecodeError {
        /// Seek target of the failed capture.
        timestamp: Duration,
        /// What went wrong.
        reason: String,
    },

    /// Sampling finished without producing a single frame.
    #[error(
        "Could not extract any frames from the video. The file might be corrupted or in an unsupported format."
    )]
    NoFramesExtracted,

    /// A frame payload is not valid base64.
    #[error("Invalid frame payload: {0}")]
    InvalidFramePayload(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The remote model call failed for any reason.
    ///
    /// Transport errors, bad HTTP statuses, malformed bodies and schema
    /// mismatches all end up here. The cause is logged, not carried.
    #[error(
        "Failed to analyze video frames with the remote model. The model may have returned an invalid response."
    )]
    AnalysisFailed,

    /// The HTTP client for the remote model could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClientError(String),

    /// A required credential is missing from the environment.
    #[error("{variable} environment variable is not set.")]
    MissingCredential {
        /// Name of the environment variable that was read.
        variable: &'static str,
    },

    /// A session action is not allowed in the current phase.
    #[error("Cannot {action} while the session is {phase}")]
    InvalidTransition {
        /// What was attempted.
        action: &'static str,
        /// The phase the session was in.
        phase: Phase,
    },

    /// A completion arrived for an analysis the session no longer tracks.
    #[error("Analysis #{id} is no longer current")]
    StaleAnalysis {
        /// Identifier of the superseded analysis.
        id: u64,
    },

    /// A background decoding task panicked or was aborted.
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for VerdictError {
    fn from(error: FfmpegError) -> Self {
        VerdictError::FfmpegError(error.to_string())
    }
}
