//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and cached for its lifetime. The sampler only needs the
//! duration and pixel dimensions; the rest is reported by `vidverdict probe`.

use std::time::Duration;

/// Metadata for the best video stream of a file.
///
/// # Example
///
/// ```no_run
/// use vidverdict::{SeekableVideo, VideoSource};
///
/// let source = VideoSource::open("input.mp4")?;
/// let metadata = source.metadata();
/// println!("{}x{} for {:?}", metadata.width, metadata.height, metadata.duration);
/// # Ok::<(), vidverdict::VerdictError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Total duration of the media.
    pub duration: Duration,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second; `0.0` when the container does not say.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Metadata for a stream with only the fields the sampler reads.
    pub fn new(duration: Duration, width: u32, height: u32) -> Self {
        Self {
            duration,
            width,
            height,
            frames_per_second: 0.0,
            codec: "unknown".to_string(),
            format: "unknown".to_string(),
        }
    }
}
