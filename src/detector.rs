//! The sample-then-analyze pipeline.
//!
//! [`Detector`] runs one analysis as a single sequential flow: open the
//! video and sample frames on a blocking thread, then send the frames to the
//! model. It can drive a [`Session`] through its phases or be used piecemeal.

use std::path::Path;

use crate::client::{AnalysisClient, ModelTransport};
use crate::configuration::SampleOptions;
use crate::error::VerdictError;
use crate::frame::Frame;
use crate::progress::{CancellationToken, OperationType, ProgressTracker};
use crate::result::AnalysisResult;
use crate::sampler::FrameSampler;
use crate::session::{AnalysisTicket, Session};
use crate::source::{FfmpegOpener, VideoOpener};

/// Samples a video and asks the model for a verdict.
///
/// # Example
///
/// ```no_run
/// use vidverdict::{
///     AnalysisClient, AnalysisOptions, ApiCredential, Detector, SampleOptions, SelectedFile,
///     Session,
/// };
///
/// # async fn example() -> Result<(), vidverdict::VerdictError> {
/// let client = AnalysisClient::gemini(ApiCredential::from_env()?, AnalysisOptions::new())?;
/// let detector = Detector::new(client, SampleOptions::new());
///
/// let mut session = Session::new();
/// session.select_file(SelectedFile::new("clip.mp4"))?;
/// detector.run(&mut session).await?;
///
/// match session.result() {
///     Some(result) => println!("{}", result.title()),
///     None => println!("Analysis failed: {}", session.message().unwrap_or_default()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Detector<T, O = FfmpegOpener> {
    client: AnalysisClient<T>,
    sample_options: SampleOptions,
    opener: O,
}

impl<T: ModelTransport> Detector<T> {
    /// A detector that opens files with FFmpeg.
    pub fn new(client: AnalysisClient<T>, sample_options: SampleOptions) -> Self {
        Self {
            client,
            sample_options,
            opener: FfmpegOpener,
        }
    }
}

impl<T: ModelTransport, O: VideoOpener> Detector<T, O> {
    /// Open videos with `opener` instead.
    pub fn with_opener<P: VideoOpener>(self, opener: P) -> Detector<T, P> {
        Detector {
            client: self.client,
            sample_options: self.sample_options,
            opener,
        }
    }

    pub fn client(&self) -> &AnalysisClient<T> {
        &self.client
    }

    pub fn sample_options(&self) -> &SampleOptions {
        &self.sample_options
    }

    /// Open `path` and sample frames from it on a blocking thread.
    ///
    /// The source is opened and released on that thread.
    ///
    /// # Errors
    ///
    /// Open, extraction and cancellation errors; see
    /// [`FrameSampler::sample`].
    pub async fn sample(
        &self,
        path: &Path,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Frame>, VerdictError> {
        let path = path.to_path_buf();
        let opener = self.opener.clone();
        let sampler = FrameSampler::new(
            self.sample_options
                .clone()
                .with_cancellation(cancellation.clone()),
        );

        tokio::task::spawn_blocking(move || {
            let video = opener.open(&path)?;
            sampler.sample(video)
        })
        .await
        .map_err(|error| VerdictError::TaskFailed(error.to_string()))?
    }

    /// Ask the model about already-sampled frames.
    ///
    /// The progress callback from the sample options sees a
    /// [`OperationType::RemoteAnalysis`] report at `0/1` when the request
    /// starts and `1/1` once a verdict has been parsed.
    ///
    /// # Errors
    ///
    /// [`VerdictError::NoFramesExtracted`] for an empty slice (the client is
    /// not called), otherwise see
    /// [`AnalysisClient::analyze_with_cancellation`].
    pub async fn analyze_frames(
        &self,
        frames: &[Frame],
        cancellation: &CancellationToken,
    ) -> Result<AnalysisResult, VerdictError> {
        if frames.is_empty() {
            return Err(VerdictError::NoFramesExtracted);
        }

        let mut tracker = ProgressTracker::new(
            self.sample_options.progress.clone(),
            OperationType::RemoteAnalysis,
            Some(1),
        );
        tracker.begin();
        let result = self
            .client
            .analyze_with_cancellation(frames, Some(cancellation))
            .await?;
        tracker.advance(None);
        Ok(result)
    }

    /// Sample `path` and analyze the frames.
    ///
    /// # Errors
    ///
    /// Any error from [`sample`](Detector::sample) or
    /// [`analyze_frames`](Detector::analyze_frames).
    pub async fn analyze_path(
        &self,
        path: &Path,
        cancellation: &CancellationToken,
    ) -> Result<AnalysisResult, VerdictError> {
        let frames = self.sample(path, cancellation).await?;
        self.analyze_frames(&frames, cancellation).await
    }

    /// Run the analysis a ticket was issued for.
    ///
    /// # Errors
    ///
    /// See [`analyze_path`](Detector::analyze_path).
    pub async fn execute(&self, ticket: &AnalysisTicket) -> Result<AnalysisResult, VerdictError> {
        self.analyze_path(ticket.file().path(), ticket.cancellation())
            .await
    }

    /// Drive `session` from idle through loading to success or error.
    ///
    /// Pipeline failures are not returned; they put the session into
    /// [`Phase::Error`](crate::Phase::Error) with a readable message.
    ///
    /// # Errors
    ///
    /// Only what [`Session::begin_analysis`] rejects: no file selected, or
    /// a session that is not idle.
    pub async fn run(&self, session: &mut Session) -> Result<(), VerdictError> {
        let ticket = session.begin_analysis()?;
        let outcome = self.execute(&ticket).await;

        let applied = match outcome {
            Ok(result) => session.complete(ticket.id(), result),
            Err(error) => {
                log::warn!("Analysis #{} failed: {error}", ticket.id());
                session.fail(ticket.id(), error.to_string())
            }
        };

        if let Err(error) = applied {
            log::debug!("Discarded outcome: {error}");
        }
        Ok(())
    }
}
