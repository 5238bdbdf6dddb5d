//! Gemini (Generative Language API) client with optional retry for transient errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::error::{LlmError, RetryConfig};
use super::{InlineImage, StructuredRequest, StructuredResponse, TokenUsage, VisionClient};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl GeminiClient {
    /// Create a client with an explicit endpoint, request timeout and retry policy.
    pub fn with_options(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
        retry_config: RetryConfig,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::network_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_config,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Seconds form of Retry-After. The HTTP-date form is ignored.
    fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        let seconds = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
        seconds.trim().parse().ok().map(Duration::from_secs)
    }

    fn transport_error(e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::timeout(format!("No response within the configured timeout: {}", e))
        } else if e.is_connect() {
            LlmError::network_error(format!("Connection failed: {}", e))
        } else {
            LlmError::network_error(format!("Request failed: {}", e))
        }
    }

    /// One generateContent call.
    async fn send_once(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<StructuredResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        let retry_after = Self::retry_after(response.headers());
        let body = response.text().await.map_err(Self::transport_error)?;

        if !status.is_success() {
            return Err(LlmError::from_http(status.as_u16(), &body, retry_after));
        }
        parse_response(&body, model)
    }

    /// Call generateContent, repeating transient failures while the retry budget lasts.
    async fn send(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<StructuredResponse, LlmError> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            let error = match self.send_once(model, request).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(retries = attempt, elapsed = ?started.elapsed(), "Gemini call recovered");
                    }
                    return Ok(response);
                }
                Err(error) => error,
            };

            if !self.retry_config.should_retry(&error, attempt) {
                return Err(error);
            }

            let remaining = self
                .retry_config
                .max_retry_duration
                .saturating_sub(started.elapsed());
            let delay = error.suggested_delay(attempt).min(remaining);
            if delay.is_zero() {
                tracing::warn!("Retry window exhausted after {} attempts: {}", attempt + 1, error);
                return Err(error);
            }

            tracing::warn!(
                attempt = attempt + 1,
                ?delay,
                "Gemini call failed, retrying: {}",
                error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Result<StructuredResponse, LlmError> {
        let body = GeminiRequest::from_structured(request);
        tracing::debug!(
            "Sending request to Gemini: model={}, image={} ({} base64 chars)",
            request.model,
            request.image.mime_type,
            request.image.data.len()
        );
        self.send(&request.model, &body).await
    }
}

/// Parse a successful response body.
fn parse_response(body: &str, model: &str) -> Result<StructuredResponse, LlmError> {
    let parsed: GeminiResponse = serde_json::from_str(body).map_err(|e| {
        LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
    })?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        tracing::warn!("Gemini blocked the prompt: {}", reason);
    }

    let candidate = parsed.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let text = candidate.and_then(|c| c.content).and_then(|content| {
        let joined: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    });

    Ok(StructuredResponse {
        text,
        finish_reason,
        usage: parsed.usage_metadata.map(|u| {
            TokenUsage::new(
                u.prompt_token_count.unwrap_or(0),
                u.candidates_token_count.unwrap_or(0),
            )
        }),
        model: parsed.model_version.or_else(|| Some(model.to_string())),
    })
}

/// generateContent request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_structured(request: &StructuredRequest) -> Self {
        Self {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(&request.system_instruction)],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![
                    GeminiPart::inline(&request.image),
                    GeminiPart::text(&request.prompt),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.response_schema.clone(),
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineImage>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn inline(image: &InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(image.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// generateContent response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
}
