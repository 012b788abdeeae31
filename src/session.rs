//! Analysis session state.
//!
//! A [`Session`] is the single-user, in-memory state of the application: the
//! selected file plus exactly one of four phases. The phase and its payload
//! live in one enum, so a successful session always has a result and a
//! failed one always has a message.
//!
//! ```text
//!             select_file / reset
//!   ┌──────────────────────────────────────────┐
//!   ▼                                          │
//! Idle ──begin_analysis──▶ Loading ──complete──▶ Success
//!                             │
//!                             └────fail───────▶ Error
//! ```
//!
//! Selecting a new file (or resetting) while an analysis is in flight
//! cancels that analysis; its eventual completion is rejected as stale.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use crate::conversion::mime_type_for_path;
use crate::error::VerdictError;
use crate::progress::CancellationToken;
use crate::result::AnalysisResult;

/// Generic message used when a failure carries no text of its own.
const UNKNOWN_FAILURE_MESSAGE: &str = "An unknown error occurred during analysis.";

/// The four phases of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Success => "success",
            Phase::Error => "error",
        };
        f.write_str(label)
    }
}

/// A user-selected file and its detected MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    mime_type: String,
}

impl SelectedFile {
    /// Select `path`, detecting its MIME type from the extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = mime_type_for_path(&path).to_string();
        Self { path, mime_type }
    }

    /// Select `path` with a MIME type supplied by the caller.
    pub fn with_mime_type(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Handle for one in-flight analysis, returned by
/// [`Session::begin_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    id: u64,
    file: SelectedFile,
    cancellation: CancellationToken,
}

impl AnalysisTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Fires when the session abandons this analysis.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

#[derive(Debug)]
enum State {
    Idle { notice: Option<String> },
    Loading { id: u64, cancellation: CancellationToken },
    Success { result: AnalysisResult },
    Error { message: String },
}

/// The state of one user's analysis workflow.
///
/// # Example
///
/// ```
/// use vidverdict::{AnalysisResult, Phase, SelectedFile, Session};
///
/// let mut session = Session::new();
/// session.select_file(SelectedFile::new("clip.mp4"))?;
///
/// let ticket = session.begin_analysis()?;
/// assert_eq!(session.phase(), Phase::Loading);
///
/// session.complete(ticket.id(), AnalysisResult {
///     is_ai_generated: false,
///     confidence_score: 0.2,
///     reasoning: "Consistent lighting.".into(),
///     artifacts_detected: vec![],
/// })?;
/// assert_eq!(session.phase(), Phase::Success);
/// # Ok::<(), vidverdict::VerdictError>(())
/// ```
#[derive(Debug)]
pub struct Session {
    file: Option<SelectedFile>,
    state: State,
    analyses_started: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An idle session with nothing selected.
    pub fn new() -> Self {
        Self {
            file: None,
            state: State::Idle { notice: None },
            analyses_started: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle { .. } => Phase::Idle,
            State::Loading { .. } => Phase::Loading,
            State::Success { .. } => Phase::Success,
            State::Error { .. } => Phase::Error,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    /// The verdict, present only in [`Phase::Success`].
    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            State::Success { result } => Some(result),
            _ => None,
        }
    }

    /// The failure message in [`Phase::Error`], or the inline notice left on
    /// an idle session by a rejected request.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            State::Error { message } => Some(message),
            State::Idle { notice } => notice.as_deref(),
            _ => None,
        }
    }

    /// Select a new file, returning the session to idle.
    ///
    /// Any analysis in flight is cancelled and any previous result or error
    /// is discarded.
    ///
    /// # Errors
    ///
    /// [`VerdictError::NotAVideo`] if `file` is not a video; the session is
    /// left exactly as it was.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), VerdictError> {
        if !file.is_video() {
            log::warn!(
                "Rejected non-video file {} ({})",
                file.path().display(),
                file.mime_type()
            );
            return Err(VerdictError::NotAVideo {
                path: file.path,
                mime_type: file.mime_type,
            });
        }

        self.abandon_in_flight();
        log::debug!("Selected {}", file.path().display());
        self.file = Some(file);
        self.state = State::Idle { notice: None };
        Ok(())
    }

    /// Clear the selection and return to idle from any phase.
    pub fn reset(&mut self) {
        self.abandon_in_flight();
        self.file = None;
        self.state = State::Idle { notice: None };
    }

    /// Move from idle to loading.
    ///
    /// # Errors
    ///
    /// - [`VerdictError::NoFileSelected`] if nothing is selected. The phase
    ///   stays idle and the message is recorded as a notice.
    /// - [`VerdictError::InvalidTransition`] outside [`Phase::Idle`].
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, VerdictError> {
        let phase = self.phase();
        let State::Idle { notice } = &mut self.state else {
            return Err(VerdictError::InvalidTransition {
                action: "start an analysis",
                phase,
            });
        };

        let Some(file) = self.file.clone() else {
            let error = VerdictError::NoFileSelected;
            *notice = Some(error.to_string());
            return Err(error);
        };

        self.analyses_started += 1;
        let id = self.analyses_started;
        let cancellation = CancellationToken::new();

        self.state = State::Loading {
            id,
            cancellation: cancellation.clone(),
        };

        Ok(AnalysisTicket {
            id,
            file,
            cancellation,
        })
    }

    /// Move from loading to success.
    ///
    /// # Errors
    ///
    /// [`VerdictError::StaleAnalysis`] if `id` is not the analysis in flight;
    /// the session is unchanged.
    pub fn complete(&mut self, id: u64, result: AnalysisResult) -> Result<(), VerdictError> {
        self.ensure_current(id)?;
        self.state = State::Success { result };
        Ok(())
    }

    /// Move from loading to error with a human-readable `message`.
    ///
    /// # Errors
    ///
    /// [`VerdictError::StaleAnalysis`] if `id` is not the analysis in flight;
    /// the session is unchanged.
    pub fn fail(&mut self, id: u64, message: impl Into<String>) -> Result<(), VerdictError> {
        self.ensure_current(id)?;
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        self.state = State::Error { message };
        Ok(())
    }

    fn ensure_current(&self, id: u64) -> Result<(), VerdictError> {
        match self.state {
            State::Loading { id: current, .. } if current == id => Ok(()),
            _ => Err(VerdictError::StaleAnalysis { id }),
        }
    }

    fn abandon_in_flight(&mut self) {
        if let State::Loading { id, cancellation } = &self.state {
            log::info!("Cancelling analysis #{id}");
            cancellation.cancel();
        }
    }
}
