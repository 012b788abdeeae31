//! # vidverdict
//!
//! Sample a few frames from a video and ask a multimodal model whether the
//! footage looks AI-generated.
//!
//! `vidverdict` decodes frames with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), encodes them as
//! JPEG, sends them to Google Gemini with a forensic-analyst prompt, and
//! returns a typed [`AnalysisResult`]: a verdict, a confidence score, the
//! model's reasoning and the artifacts it claims to have seen.
//!
//! The classification itself happens entirely inside the remote model.
//! This crate samples, packages, parses and keeps track of state.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidverdict::{
//!     AnalysisClient, AnalysisOptions, ApiCredential, CancellationToken, Detector,
//!     SampleOptions,
//! };
//!
//! # async fn example() -> Result<(), vidverdict::VerdictError> {
//! let client = AnalysisClient::gemini(ApiCredential::from_env()?, AnalysisOptions::new())?;
//! let detector = Detector::new(client, SampleOptions::new().with_frame_count(5));
//!
//! let result = detector
//!     .analyze_path("suspicious.mp4".as_ref(), &CancellationToken::new())
//!     .await?;
//!
//! println!("{} ({} confidence)", result.title(), result.confidence_percent());
//! for artifact in &result.artifacts_detected {
//!     println!("  - {artifact}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Sampling only
//!
//! ```no_run
//! use vidverdict::{FrameSampler, SampleOptions, VideoSource};
//!
//! let sampler = FrameSampler::new(SampleOptions::new().with_frame_count(3));
//! for frame in sampler.sample(VideoSource::open("input.mp4")?)? {
//!     println!("{:?}: {} base64 bytes", frame.timestamp(), frame.data().len());
//! }
//! # Ok::<(), vidverdict::VerdictError>(())
//! ```
//!
//! ## Configuration
//!
//! The only required setting is the `API_KEY` environment variable, read by
//! [`ApiCredential::from_env`]. Diagnostics go through the
//! [`log`](https://crates.io/crates/log) facade.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the build machine.

pub mod client;
pub mod configuration;
mod conversion;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod progress;
pub mod prompt;
pub mod result;
pub mod sampler;
pub mod session;
pub mod source;

pub use client::{
    AnalysisClient, Content, GeminiTransport, GenerateContentRequest, GenerationConfig,
    InlineData, ModelTransport, Part, TransportError,
};
pub use configuration::{
    AnalysisOptions, ApiCredential, DEFAULT_BASE_URL, DEFAULT_FRAME_COUNT, DEFAULT_JPEG_QUALITY,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE, SampleOptions,
};
pub use detector::Detector;
pub use error::VerdictError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::Frame;
pub use metadata::VideoMetadata;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use prompt::{PromptSet, analysis_result_schema};
pub use result::{AnalysisResult, Severity};
pub use sampler::FrameSampler;
pub use session::{AnalysisTicket, Phase, SelectedFile, Session};
pub use source::{FfmpegOpener, SeekableVideo, VideoOpener, VideoSource};
