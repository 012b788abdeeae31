//! In-memory stand-ins for the decoder and the remote model.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use vidverdict::{
    GenerateContentRequest, ModelTransport, SeekableVideo, TransportError, VerdictError,
    VideoMetadata, VideoOpener,
};

pub const AI_VERDICT: &str = r#"{
    "is_ai_generated": true,
    "confidence_score": 0.92,
    "reasoning": "Hands morph between frames and background text is illegible.",
    "artifacts_detected": ["morphing hands"]
}"#;

pub const AUTHENTIC_VERDICT: &str = r#"{
    "is_ai_generated": false,
    "confidence_score": 0.15,
    "reasoning": "Lighting and motion blur are consistent across frames.",
    "artifacts_detected": []
}"#;

/// A synthetic video that paints a solid color per seek.
pub struct MockVideo {
    metadata: VideoMetadata,
    pub seeks: Arc<Mutex<Vec<Duration>>>,
    pub dropped: Arc<AtomicBool>,
    fail_at: Option<usize>,
}

impl MockVideo {
    pub fn new(duration: Duration, width: u32, height: u32) -> Self {
        Self {
            metadata: VideoMetadata::new(duration, width, height),
            seeks: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicBool::new(false)),
            fail_at: None,
        }
    }

    pub fn ten_seconds() -> Self {
        Self::new(Duration::from_secs(10), 64, 36)
    }

    /// Fail the capture with this zero-based index.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl SeekableVideo for MockVideo {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn capture_at(
        &mut self,
        timestamp: Duration,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, VerdictError> {
        let mut seeks = self.seeks.lock().unwrap();
        let index = seeks.len();
        seeks.push(timestamp);

        if self.fail_at == Some(index) {
            return Err(VerdictError::VideoDecodeError {
                timestamp,
                reason: "synthetic decode failure".to_string(),
            });
        }

        let shade = (index as u8).wrapping_mul(40);
        Ok(RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade])))
    }
}

impl Drop for MockVideo {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Opens a fresh [`MockVideo`] of a fixed duration for any path.
#[derive(Clone)]
pub struct MockOpener {
    duration: Duration,
    pub opens: Arc<AtomicUsize>,
}

impl MockOpener {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl VideoOpener for MockOpener {
    type Video = MockVideo;

    fn open(&self, _path: &Path) -> Result<MockVideo, VerdictError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MockVideo::new(self.duration, 64, 36))
    }
}

/// Answers every request with a canned body and remembers what it was sent.
#[derive(Clone)]
pub struct RecordingTransport {
    reply: String,
    pub requests: Arc<Mutex<Vec<(String, GenerateContentRequest)>>>,
}

impl RecordingTransport {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> (String, GenerateContentRequest) {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl ModelTransport for RecordingTransport {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        Ok(self.reply.clone())
    }
}

/// Fails every request with an HTTP status.
pub struct FailingTransport;

#[async_trait]
impl ModelTransport for FailingTransport {
    async fn generate(
        &self,
        _model: &str,
        _request: &GenerateContentRequest,
    ) -> Result<String, TransportError> {
        Err(TransportError::UnexpectedStatus {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}

/// Never answers.
pub struct PendingTransport;

#[async_trait]
impl ModelTransport for PendingTransport {
    async fn generate(
        &self,
        _model: &str,
        _request: &GenerateContentRequest,
    ) -> Result<String, TransportError> {
        std::future::pending::<()>().await;
        Err(TransportError::EmptyResponse)
    }
}
