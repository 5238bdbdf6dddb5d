//! Structured extraction of OKRs and tasks from a strategy sketch.
//!
//! This is the crate's single network boundary: one image plus a fixed
//! instruction and output schema go out, one JSON object comes back.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use crate::intake::EncodedImage;
use crate::llm::{InlineImage, LlmError, StructuredRequest, VisionClient};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const SYSTEM_PROMPT: &str = r#"
You are an expert Agile Project Manager and Business Strategist.
Your goal is to digitize physical meeting notes, whiteboards, or strategy sketches into structured project data.

Analyze the provided image.
1. Identify the main high-level 'Objective' (Strategic Goal).
2. Identify 3 specific, measurable 'Key Results' (OKRs).
3. Extract actionable tasks. If tasks are not explicitly listed, infer necessary steps to achieve the objective.
4. For each task, provide a concise title, a brief description, and an ESTIMATED number of hours required (integer) based on complexity.

Return strictly JSON.
"#;

pub const USER_PROMPT: &str = "Analyze this strategy sketch. Convert it into a JSON object with an 'objective', 'keyResults' (array of 3 strings), and 'tasks' (array of objects with title, description, hours). Do not include markdown formatting.";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction service returned no content")]
    ExtractionFailed,

    #[error("Extraction service error: {0}")]
    ServiceError(String),
}

impl From<LlmError> for ExtractionError {
    fn from(err: LlmError) -> Self {
        ExtractionError::ServiceError(err.to_string())
    }
}

/// Output schema: `objective`, `keyResults`, and `tasks[{title, description, hours}]`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "objective": { "type": "STRING" },
            "keyResults": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "tasks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "hours": { "type": "NUMBER", "description": "Estimated hours to complete" }
                    },
                    "required": ["title", "description", "hours"]
                }
            }
        },
        "required": ["objective", "keyResults", "tasks"]
    })
}

/// Split `data:<mime>;base64,<payload>` into its mime type and payload.
///
/// Input without a data-URI header is returned unchanged with no mime.
pub fn split_data_uri(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, trimmed);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, trimmed),
    }
}

/// Unwrap a Markdown code fence (```json ... ```) if the model added one anyway.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the info string ("json") whether or not a newline follows it
    inner
        .trim_start()
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

/// Parse the model's text into a JSON object.
pub fn parse_extraction(text: &str) -> Result<Value, ExtractionError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ExtractionError::ExtractionFailed);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::ServiceError(format!("Invalid JSON from model: {}", e)))?;
    if !value.is_object() {
        return Err(ExtractionError::ServiceError(format!(
            "Expected a JSON object from model, got {}",
            value_kind(&value)
        )));
    }
    Ok(value)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sends encoded sketches to a vision client and returns the raw extraction.
#[derive(Clone)]
pub struct Extractor {
    client: Arc<dyn VisionClient>,
    model: String,
}

impl Extractor {
    pub fn new(client: Arc<dyn VisionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request for `image`.
    pub fn build_request(&self, image: &EncodedImage) -> StructuredRequest {
        let (uri_mime, payload) = split_data_uri(&image.data);
        StructuredRequest {
            model: self.model.clone(),
            system_instruction: SYSTEM_PROMPT.to_string(),
            prompt: USER_PROMPT.to_string(),
            image: InlineImage {
                mime_type: uri_mime.unwrap_or(&image.mime_type).to_string(),
                data: payload.to_string(),
            },
            response_schema: response_schema(),
            temperature: None,
        }
    }

    /// Run one extraction.
    ///
    /// # Errors
    /// - `ExtractionFailed` if the service produced no content
    /// - `ServiceError` for transport failures and unparsable output
    pub async fn extract(&self, image: &EncodedImage) -> Result<Value, ExtractionError> {
        let request = self.build_request(image);
        let response = self.client.generate_structured(&request).await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = response.model.as_deref().unwrap_or(&self.model),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Extraction usage"
            );
        }

        let Some(text) = response.text else {
            tracing::warn!(
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "Extraction returned no content"
            );
            return Err(ExtractionError::ExtractionFailed);
        };

        parse_extraction(&text)
    }
}
