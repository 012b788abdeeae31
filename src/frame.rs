//! Sampled frames.
//!
//! A [`Frame`] is a base64 JPEG payload plus the timestamp it was captured
//! at. Frames are created by the sampler, consumed by the analysis client
//! and never persisted by the library.

use std::io::Cursor;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::conversion::strip_data_uri_prefix;
use crate::error::VerdictError;

/// One still image sampled from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: String,
    timestamp: Duration,
}

impl Frame {
    /// MIME type of every frame payload.
    pub const MIME_TYPE: &'static str = "image/jpeg";

    /// Encode an RGB image as JPEG at `quality` and wrap it.
    ///
    /// # Errors
    ///
    /// [`VerdictError::ImageError`] if the encoder rejects the image.
    pub fn encode(image: &RgbImage, quality: u8, timestamp: Duration) -> Result<Self, VerdictError> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
        Ok(Self::from_jpeg(&buffer.into_inner(), timestamp))
    }

    /// Wrap already-encoded JPEG bytes.
    pub fn from_jpeg(bytes: &[u8], timestamp: Duration) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            timestamp,
        }
    }

    /// Wrap a base64 payload, dropping a `data:image/jpeg;base64,` prefix if
    /// present.
    pub fn from_base64(payload: &str, timestamp: Duration) -> Self {
        Self {
            data: strip_data_uri_prefix(payload).to_string(),
            timestamp,
        }
    }

    /// The raw base64 payload, without any data-URI prefix.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// When in the video this frame was captured.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Decode the payload back to JPEG bytes (for writing to disk).
    ///
    /// # Errors
    ///
    /// [`VerdictError::InvalidFramePayload`] if the payload is not base64.
    pub fn to_jpeg_bytes(&self) -> Result<Vec<u8>, VerdictError> {
        STANDARD
            .decode(&self.data)
            .map_err(|error| VerdictError::InvalidFramePayload(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frames_are_jpeg() {
        let image = RgbImage::from_pixel(32, 18, image::Rgb([200, 40, 90]));
        let frame = Frame::encode(&image, 90, Duration::from_millis(1_667)).unwrap();

        assert!(!frame.data().starts_with("data:"));
        let bytes = frame.to_jpeg_bytes().unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        assert_eq!(frame.timestamp(), Duration::from_millis(1_667));
    }

    #[test]
    fn data_uri_payloads_are_normalized() {
        let frame = Frame::from_base64("data:image/jpeg;base64,/9j/2w==", Duration::ZERO);
        assert_eq!(frame.data(), "/9j/2w==");
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        let frame = Frame::from_base64("not base64!!", Duration::ZERO);
        assert!(matches!(
            frame.to_jpeg_bytes(),
            Err(VerdictError::InvalidFramePayload(_))
        ));
    }
}
