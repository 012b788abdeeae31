//! Remote analysis client.
//!
//! [`AnalysisClient`] builds one multimodal `generateContent` request from a
//! [`PromptSet`](crate::PromptSet) and a slice of [`Frame`]s, hands it to a
//! [`ModelTransport`], and parses the reply into an [`AnalysisResult`].
//!
//! Every failure on the remote side (transport, HTTP status, empty reply,
//! malformed JSON, schema mismatch) is logged and reported as the single
//! [`VerdictError::AnalysisFailed`]. Nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use vidverdict::{AnalysisClient, AnalysisOptions, ApiCredential, Frame};
//!
//! # async fn example(frames: Vec<Frame>) -> Result<(), vidverdict::VerdictError> {
//! let client = AnalysisClient::gemini(ApiCredential::from_env()?, AnalysisOptions::new())?;
//! let result = client.analyze(&frames).await?;
//! println!("{} ({})", result.title(), result.confidence_percent());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::configuration::{AnalysisOptions, ApiCredential};
use crate::error::VerdictError;
use crate::frame::Frame;
use crate::progress::CancellationToken;
use crate::result::AnalysisResult;

/// Body of a Gemini `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// All parts of all user contents, in order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.contents.iter().flat_map(|content| content.parts.iter())
    }
}

/// A role-tagged list of parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

/// One text or inline-image part. Serializes as `{"text": ..}` or
/// `{"inlineData": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    pub fn is_text(&self) -> bool {
        matches!(self, Part::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Part::InlineData(data) if data.mime_type.starts_with("image/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Why a transport could not produce a response text.
///
/// Never surfaces past [`AnalysisClient`]; it is logged and collapsed into
/// [`VerdictError::AnalysisFailed`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("response contained no text candidates")]
    EmptyResponse,
}

/// Sends a request to a model and returns the raw response text.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Run `request` against `model`.
    ///
    /// # Errors
    ///
    /// Any reason no response text could be obtained.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, TransportError>;
}

/// [`ModelTransport`] for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    http: reqwest::Client,
    base_url: String,
    credential: ApiCredential,
}

impl GeminiTransport {
    /// Build a transport using the base URL and timeout from `options`.
    ///
    /// # Errors
    ///
    /// [`VerdictError::HttpClientError`] if the TLS backend cannot be
    /// initialised.
    pub fn new(credential: ApiCredential, options: &AnalysisOptions) -> Result<Self, VerdictError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|error| VerdictError::HttpClientError(error.to_string()))?;

        Ok(Self {
            http,
            base_url: options.base_url.clone(),
            credential,
        })
    }
}

#[async_trait]
impl ModelTransport for GeminiTransport {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, TransportError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.credential.expose())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        response_text(response.json().await?)
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(body: GenerateContentResponse) -> Result<String, TransportError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TransportError::EmptyResponse);
    }
    Ok(text)
}

/// Packages frames into a request and parses the verdict.
#[derive(Debug, Clone)]
pub struct AnalysisClient<T> {
    transport: T,
    options: AnalysisOptions,
}

impl AnalysisClient<GeminiTransport> {
    /// A client talking to Gemini with `credential`.
    ///
    /// # Errors
    ///
    /// See [`GeminiTransport::new`].
    pub fn gemini(credential: ApiCredential, options: AnalysisOptions) -> Result<Self, VerdictError> {
        let transport = GeminiTransport::new(credential, &options)?;
        Ok(Self::new(transport, options))
    }
}

impl<T: ModelTransport> AnalysisClient<T> {
    pub fn new(transport: T, options: AnalysisOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for `frames`: system instruction, then one user
    /// content holding the task prompt followed by the frames in order.
    pub fn build_request(&self, frames: &[Frame]) -> GenerateContentRequest {
        let prompts = &self.options.prompts;

        let mut parts = Vec::with_capacity(frames.len() + 1);
        parts.push(Part::Text(prompts.task_prompt().to_string()));
        parts.extend(frames.iter().map(|frame| {
            Part::InlineData(InlineData {
                mime_type: Frame::MIME_TYPE.to_string(),
                data: frame.data().to_string(),
            })
        }));

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text(prompts.system_instruction().to_string())],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
                response_mime_type: "application/json".to_string(),
                response_schema: prompts.response_schema().clone(),
            },
        }
    }

    /// Ask the model for a verdict on `frames`.
    ///
    /// The caller is responsible for not passing an empty slice.
    ///
    /// # Errors
    ///
    /// [`VerdictError::AnalysisFailed`] on any remote failure.
    pub async fn analyze(&self, frames: &[Frame]) -> Result<AnalysisResult, VerdictError> {
        self.analyze_with_cancellation(frames, None).await
    }

    /// Like [`analyze`](AnalysisClient::analyze), but abandons the request
    /// as soon as `cancellation` fires.
    ///
    /// # Errors
    ///
    /// [`VerdictError::Cancelled`] if cancelled first, otherwise
    /// [`VerdictError::AnalysisFailed`] on any remote failure.
    pub async fn analyze_with_cancellation(
        &self,
        frames: &[Frame],
        cancellation: Option<&CancellationToken>,
    ) -> Result<AnalysisResult, VerdictError> {
        let request = self.build_request(frames);
        let model = self.options.model.as_str();

        log::debug!(
            "Requesting analysis of {} frame(s) from {model} (temperature {})",
            frames.len(),
            self.options.temperature,
        );

        let response = match cancellation {
            Some(token) => tokio::select! {
                response = self.transport.generate(model, &request) => response,
                _ = token.cancelled() => {
                    log::debug!("Remote analysis cancelled");
                    return Err(VerdictError::Cancelled);
                }
            },
            None => self.transport.generate(model, &request).await,
        };

        let text = response.map_err(|error| {
            log::error!("Remote analysis request failed: {error}");
            VerdictError::AnalysisFailed
        })?;

        let result = AnalysisResult::from_json(&text).map_err(|error| {
            log::error!("Model returned an invalid analysis body: {error}");
            VerdictError::AnalysisFailed
        })?;

        if !(0.0..=1.0).contains(&result.confidence_score) {
            log::warn!(
                "Model returned confidence {} outside [0, 1]",
                result.confidence_score
            );
        }

        log::info!(
            "Analysis complete: ai_generated={}, confidence={:.2}, {} artifact(s)",
            result.is_ai_generated,
            result.confidence_score,
            result.artifacts_detected.len(),
        );
        Ok(result)
    }
}
