//! Internal conversion helpers.
//!
//! Timestamp arithmetic, pixel-buffer copying, data-URI handling and MIME
//! detection shared by the sampler, the video source and the session.

use std::{path::Path, time::Duration};

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// MIME type reported for files whose extension is unknown.
pub(crate) const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// `AV_NOPTS_VALUE`.
const NO_PTS_VALUE: i64 = i64::MIN;

/// Evenly spaced interior timestamps: `duration / (count + 1) * k` for
/// `k = 1..=count`. The very start and very end are never included.
pub(crate) fn sample_timestamps(duration: Duration, count: usize) -> Vec<Duration> {
    let step = duration.as_secs_f64() / (count as f64 + 1.0);
    (1..=count)
        .map(|k| Duration::from_secs_f64(step * k as f64))
        .collect()
}

/// Convert a [`Duration`] to a container-level seek position in
/// AV_TIME_BASE units (microseconds).
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// A stream's first timestamp, or zero when FFmpeg does not know it.
pub(crate) fn known_start_pts(start_time: i64) -> i64 {
    if start_time == NO_PTS_VALUE { 0 } else { start_time }
}

/// Seconds from the first timestamp of the stream to `pts`.
pub(crate) fn relative_pts_seconds(pts: i64, start_pts: i64, time_base: Rational) -> f64 {
    pts_to_seconds(pts.saturating_sub(start_pts), time_base)
}

/// Copy an RGB24 FFmpeg frame into a tightly packed buffer, dropping any
/// row padding.
pub(crate) fn frame_to_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * height as usize].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }
    buffer
}

/// Strip a `data:<mime>;base64,` prefix, returning the raw payload.
pub(crate) fn strip_data_uri_prefix(payload: &str) -> &str {
    let trimmed = payload.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, data)) = trimmed.split_once(',') {
            return data;
        }
    }
    trimmed
}

/// Guess a MIME type from the file extension.
pub(crate) fn mime_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp4") => "video/mp4",
        Some("m4v") => "video/x-m4v",
        Some("mov" | "qt") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogv") => "video/ogg",
        Some("mpg" | "mpeg") => "video/mpeg",
        Some("ts" | "m2ts") => "video/mp2t",
        Some("3gp") => "video/3gpp",
        Some("flv") => "video/x-flv",
        Some("wmv") => "video/x-ms-wmv",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        _ => UNKNOWN_MIME_TYPE,
    }
}
