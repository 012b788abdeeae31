//! Sampling and analysis configuration.
//!
//! [`SampleOptions`] and [`AnalysisOptions`] are builders that thread the
//! tunables of the pipeline (frame count, JPEG quality, progress callbacks,
//! cancellation, model name, temperature, prompts) through the sampler and
//! the client without widening every signature. [`ApiCredential`] holds the
//! single secret the remote model needs.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vidverdict::{AnalysisOptions, ApiCredential, SampleOptions};
//!
//! let credential = ApiCredential::from_env()?;
//! let sampling = SampleOptions::new().with_frame_count(8).with_max_dimension(1280);
//! let analysis = AnalysisOptions::new()
//!     .with_model("gemini-2.5-flash")
//!     .with_timeout(Duration::from_secs(90));
//! # Ok::<(), vidverdict::VerdictError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::error::VerdictError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::prompt::PromptSet;

/// Frames sampled per analysis unless configured otherwise.
pub const DEFAULT_FRAME_COUNT: usize = 5;
/// JPEG quality used for captured frames (matches the browser canvas default).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;
/// Model asked for a verdict unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
/// Low randomness for a deterministic-leaning verdict.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Root of the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Options for [`FrameSampler`](crate::FrameSampler).
///
/// Defaults: five frames at native resolution, JPEG quality 92, no progress
/// callback, never cancelled.
#[derive(Clone)]
pub struct SampleOptions {
    pub(crate) frame_count: usize,
    pub(crate) jpeg_quality: u8,
    pub(crate) max_dimension: Option<u32>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for SampleOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SampleOptions")
            .field("frame_count", &self.frame_count)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_dimension", &self.max_dimension)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleOptions {
    pub fn new() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_dimension: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set how many frames to sample.
    ///
    /// Zero is accepted here and rejected by the sampler with
    /// [`VerdictError::InvalidFrameCount`].
    #[must_use]
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count;
        self
    }

    /// Set the JPEG quality, clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Downscale frames so their longest edge is at most `max_dimension`
    /// pixels. Frames already smaller keep their native size.
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = Some(max_dimension.max(1));
        self
    }

    /// Attach a progress callback, invoked after every captured frame.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before every seek.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    /// Output size for a source of `width`×`height`, preserving aspect ratio.
    pub(crate) fn resolve_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match self.max_dimension {
            Some(max) if width.max(height) > max => {
                let scale = max as f64 / width.max(height) as f64;
                let scaled_width = (width as f64 * scale).round() as u32;
                let scaled_height = (height as f64 * scale).round() as u32;
                (scaled_width.max(1), scaled_height.max(1))
            }
            _ => (width, height),
        }
    }
}

/// Options for [`AnalysisClient`](crate::AnalysisClient).
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) prompts: PromptSet,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Defaults: `gemini-2.5-pro`, temperature 0.2, the public Gemini
    /// endpoint, no timeout, the stock forensic prompts.
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            prompts: PromptSet::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature, clamped to `0.0..=2.0`.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Point the client at another API root (a proxy or a local stub).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Give up on the remote call after `timeout`. Unset by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }
}

/// The access key for the remote model.
///
/// Read once at startup; a missing key is fatal. `Debug` output is redacted.
#[derive(Clone)]
pub struct ApiCredential(String);

impl Debug for ApiCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("ApiCredential(<redacted>)")
    }
}

impl ApiCredential {
    /// Environment variable holding the key.
    pub const ENV_VAR: &'static str = "API_KEY";

    /// Wrap a key obtained elsewhere.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from [`ENV_VAR`](ApiCredential::ENV_VAR).
    ///
    /// # Errors
    ///
    /// [`VerdictError::MissingCredential`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self, VerdictError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the key through an arbitrary lookup (e.g. a parsed `.env` map).
    ///
    /// # Errors
    ///
    /// [`VerdictError::MissingCredential`] if the lookup yields nothing or
    /// only whitespace.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VerdictError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        lookup(Self::ENV_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Self)
            .ok_or(VerdictError::MissingCredential {
                variable: Self::ENV_VAR,
            })
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_resolution_by_default() {
        let options = SampleOptions::new();
        assert_eq!(options.resolve_dimensions(1920, 1080), (1920, 1080));
    }

    #[test]
    fn max_dimension_preserves_aspect_ratio() {
        let options = SampleOptions::new().with_max_dimension(640);
        assert_eq!(options.resolve_dimensions(1920, 1080), (640, 360));
        assert_eq!(options.resolve_dimensions(1080, 1920), (360, 640));
        assert_eq!(options.resolve_dimensions(320, 240), (320, 240));
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(SampleOptions::new().with_jpeg_quality(0).jpeg_quality(), 1);
        assert_eq!(SampleOptions::new().with_jpeg_quality(250).jpeg_quality(), 100);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let options = AnalysisOptions::new().with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(options.base_url(), "http://localhost:8080/v1beta");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = ApiCredential::new("super-secret");
        assert!(!format!("{credential:?}").contains("super-secret"));
    }
}
