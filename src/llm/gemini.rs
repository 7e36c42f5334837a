// Google Gemini provider implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::retry::with_retry;
use super::types::{ProviderRequest, ProviderResponse, Role};
use super::LlmProvider;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Google Gemini provider.
///
/// Implements the LlmProvider trait over the Generative Language API's
/// `generateContent` and `streamGenerateContent` endpoints.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

// Wire format for the generateContent request.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// Wire format for responses, shared by the unary and streaming endpoints.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    model_version: Option<String>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create with custom default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.is_empty() {
            self.default_model = model;
        }
        self
    }

    /// Override the API base URL (tests point this at a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_for(&self, request: &ProviderRequest) -> String {
        if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        }
    }

    /// Convert a ProviderRequest to Gemini's wire format.
    ///
    /// Gemini calls the assistant role "model" and carries the system prompt
    /// in a dedicated field rather than as a turn.
    fn to_gemini_request(&self, request: &ProviderRequest) -> GeminiRequest {
        let contents = request
            .turns
            .iter()
            .map(|turn| GeminiContent {
                role: match turn.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![GeminiPart {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request.system.as_ref().map(|system| GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: system.clone(),
                }],
            }),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }

    /// Send a single message request (no retry).
    async fn send_message_once(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let model = self.model_for(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let body = self.to_gemini_request(request);

        tracing::debug!(model = %model, turns = request.turns.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        if let Some(error) = gemini_response.error {
            anyhow::bail!("Gemini API error: {}", error.message);
        }

        let candidate = gemini_response
            .candidates
            .and_then(|mut candidates| {
                if candidates.is_empty() {
                    None
                } else {
                    Some(candidates.remove(0))
                }
            })
            .context("Gemini response contained no candidates")?;

        let text = candidate
            .content
            .and_then(|content| content.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            model: gemini_response.model_version.unwrap_or(model),
            text,
            finish_reason: candidate.finish_reason,
            provider: "gemini".to_string(),
        })
    }

    /// Send a message with streaming response (no retry).
    async fn send_message_stream_once(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        let model = self.model_for(request);
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        );
        let body = self.to_gemini_request(request);

        tracing::debug!(model = %model, "Sending streaming request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send streaming request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini API streaming request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let (tx, rx) = mpsc::channel(100);

        // Parse the SSE stream line by line; each data line carries one
        // GeminiResponse chunk whose candidate parts are text deltas.
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = Vec::new();

            'outer: while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);

                        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                            let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                            let line = String::from_utf8_lossy(&line_bytes);

                            let Some(json_str) = line.strip_prefix("data: ") else {
                                continue;
                            };
                            let json_str = json_str.trim();

                            if json_str == "[DONE]" {
                                tracing::debug!("Gemini stream completed");
                                break 'outer;
                            }

                            let Ok(chunk) = serde_json::from_str::<GeminiResponse>(json_str)
                            else {
                                continue;
                            };

                            for candidate in chunk.candidates.unwrap_or_default() {
                                let parts = candidate
                                    .content
                                    .and_then(|content| content.parts)
                                    .unwrap_or_default();
                                for part in parts {
                                    if let Some(text) = part.text {
                                        if tx.send(Ok(text)).await.is_err() {
                                            // Receiver dropped, stop streaming
                                            break 'outer;
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        with_retry(|| self.send_message_once(request)).await
    }

    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        with_retry(|| self.send_message_stream_once(request)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatTurn;
    use mockito::Matcher;

    fn test_request() -> ProviderRequest {
        ProviderRequest::new(vec![ChatTurn::user("I have an interview tomorrow")])
            .with_system("You are a supportive companion.")
    }

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key".to_string());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_name_and_default_model() {
        let provider = GeminiProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), DEFAULT_MODEL);

        let provider = provider.with_model("gemini-1.5-pro");
        assert_eq!(provider.default_model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_assistant_turns_use_model_role() {
        let provider = GeminiProvider::new("test-key".to_string()).unwrap();
        let request = ProviderRequest::new(vec![
            ChatTurn::user("hello"),
            ChatTurn::assistant("hi, how are you feeling?"),
        ]);

        let wire = provider.to_gemini_request(&request);
        assert_eq!(wire.contents[0].role, "user");
        assert_eq!(wire.contents[1].role, "model");
        assert!(wire.system_instruction.is_none());
    }

    #[tokio::test]
    async fn test_send_message_parses_candidates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "systemInstruction": {
                    "parts": [{"text": "You are a supportive companion."}]
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "That sounds stressful. "}, {"text": "Want to talk it through?"}]},
                        "finishReason": "STOP"
                    }],
                    "modelVersion": "gemini-2.0-flash"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = GeminiProvider::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());

        let response = provider.send_message(&test_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "That sounds stressful. Want to talk it through?");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.provider, "gemini");
    }

    #[tokio::test]
    async fn test_send_message_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "bad-key".into()))
            .with_status(400)
            .with_body(r#"{"error": {"message": "API key not valid"}}"#)
            .create_async()
            .await;

        let provider = GeminiProvider::new("bad-key".to_string())
            .unwrap()
            .with_base_url(server.url());

        let error = provider.send_message(&test_request()).await.unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("400"), "status in error: {}", message);
        assert!(message.contains("API key not valid"), "body in error: {}", message);
    }

    #[tokio::test]
    async fn test_send_message_rejects_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let provider = GeminiProvider::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());

        let error = provider.send_message(&test_request()).await.unwrap_err();
        assert!(format!("{:#}", error).contains("no candidates"));
    }

    #[tokio::test]
    async fn test_streaming_delivers_text_deltas() {
        let sse_body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Take a \"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"slow breath.\"}]}}]}\n\n",
        );

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:streamGenerateContent")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("alt".into(), "sse".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body)
            .create_async()
            .await;

        let provider = GeminiProvider::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.url());

        let mut rx = provider.send_message_stream(&test_request()).await.unwrap();

        let mut collected = String::new();
        while let Some(chunk) = rx.recv().await {
            collected.push_str(&chunk.unwrap());
        }

        assert_eq!(collected, "Take a slow breath.");
    }
}
