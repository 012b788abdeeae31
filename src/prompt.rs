//! Prompt and response-schema configuration for the remote model.
//!
//! A [`PromptSet`] bundles the system instruction, the task prompt and the
//! JSON schema the model's answer must follow. It is plain data handed to
//! [`AnalysisClient`](crate::AnalysisClient), so prompts can be swapped or
//! tested independently of the transport.

use serde_json::{Value, json};

const FORENSIC_SYSTEM_INSTRUCTION: &str = "You are an expert digital forensics analyst specializing in the detection of AI-generated video content. Your task is to analyze a series of frames from a video and determine if the video is likely synthesized or manipulated by artificial intelligence. Provide your analysis in a structured JSON format.";

const FORENSIC_TASK_PROMPT: &str = "Analyze the following frames for any artifacts, inconsistencies, or tell-tale signs of AI generation. Consider elements like facial expressions, hand morphology, background consistency, physical interactions (e.g., shadows, reflections), and temporal flickering between frames. Based on your analysis, determine the likelihood that this video was created by an AI.";

/// The four fields every model answer must carry.
pub const REQUIRED_RESULT_FIELDS: [&str; 4] = [
    "is_ai_generated",
    "confidence_score",
    "reasoning",
    "artifacts_detected",
];

/// Instructions and output schema sent with every analysis request.
///
/// # Example
///
/// ```
/// use vidverdict::PromptSet;
///
/// let prompts = PromptSet::default()
///     .with_task_prompt("Look only at the hands. Are they anatomically plausible?");
/// assert!(prompts.system_instruction().contains("forensics"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    system_instruction: String,
    task_prompt: String,
    response_schema: Value,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system_instruction: FORENSIC_SYSTEM_INSTRUCTION.to_string(),
            task_prompt: FORENSIC_TASK_PROMPT.to_string(),
            response_schema: analysis_result_schema(),
        }
    }
}

impl PromptSet {
    /// Replace the system instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Replace the task prompt.
    #[must_use]
    pub fn with_task_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.task_prompt = prompt.into();
        self
    }

    /// Replace the response schema.
    #[must_use]
    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = schema;
        self
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn task_prompt(&self) -> &str {
        &self.task_prompt
    }

    pub fn response_schema(&self) -> &Value {
        &self.response_schema
    }
}

/// Gemini response schema (OpenAPI subset) mirroring
/// [`AnalysisResult`](crate::AnalysisResult).
pub fn analysis_result_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "is_ai_generated": {
                "type": "BOOLEAN",
                "description": "True if the video is likely AI-generated, false otherwise."
            },
            "confidence_score": {
                "type": "NUMBER",
                "description": "A score from 0.0 to 1.0 indicating the confidence in the assessment. 1.0 means 100% confident."
            },
            "reasoning": {
                "type": "STRING",
                "description": "A detailed explanation for the conclusion, highlighting specific visual evidence from the frames."
            },
            "artifacts_detected": {
                "type": "ARRAY",
                "description": "A list of specific AI-generated artifacts or inconsistencies observed in the frames (e.g., 'unnatural facial expressions', 'background warping', 'six-fingered hand').",
                "items": { "type": "STRING" }
            }
        },
        "required": REQUIRED_RESULT_FIELDS,
    })
}
