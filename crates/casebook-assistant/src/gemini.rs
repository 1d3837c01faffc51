//! GeminiClient - direct REST implementation of the reasoning service.
//!
//! Posts generateContent requests to the Gemini API. The API key is read
//! from the process environment at every call rather than cached, so key
//! rotation takes effect on the next turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use casebook_core::config::AssistantConfig;
use casebook_core::types::{Grounding, GroundingRef, MessageRole};

use crate::error::AssistantError;
use crate::prompts::SYSTEM_INSTRUCTION;
use crate::service::{ReasoningReply, ReasoningRequest, ReasoningService};

/// Reasoning service backed by the Gemini HTTP API.
pub struct GeminiClient {
    http: Client,
    config: AssistantConfig,
}

impl GeminiClient {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AssistantError::Transport(format!("failed to build client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Pick the model variant for this turn: any PDF or image attachment
    /// requests the multimodal variant, otherwise the text-reasoning one.
    fn select_model(&self, request: &ReasoningRequest) -> &str {
        let has_documents = request
            .attachments
            .iter()
            .any(|a| a.is_visual_document());
        if has_documents {
            &self.config.multimodal_model
        } else {
            &self.config.reasoning_model
        }
    }

    /// Read the credential from the environment. Deliberately not cached:
    /// rotation takes effect on the next invocation.
    fn api_key(&self) -> Result<String, AssistantError> {
        std::env::var(&self.config.api_key_env)
            .map_err(|_| AssistantError::MissingCredential(self.config.api_key_env.clone()))
    }

    fn build_request(&self, request: &ReasoningRequest) -> GenerateContentRequest {
        let mut contents = Vec::new();

        // Prior turns, text only, best-effort context.
        for message in &request.history {
            if message.content.is_empty() {
                continue;
            }
            contents.push(Content {
                role: match message.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                }
                .to_string(),
                parts: vec![Part::Text {
                    text: message.content.clone(),
                }],
            });
        }

        // Current turn: text followed by inline attachment payloads.
        let mut parts = Vec::new();
        if !request.text.is_empty() {
            parts.push(Part::Text {
                text: request.text.clone(),
            });
        }
        for attachment in &request.attachments {
            parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: attachment.mime_type.clone(),
                    data: attachment.data.clone(),
                },
            });
        }
        contents.push(Content {
            role: "user".to_string(),
            parts,
        });

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part::Text {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        }
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, AssistantError> {
        let api_key = self.api_key()?;
        let model = self.select_model(request);
        let url = format!("{}/{}:generateContent", self.config.endpoint, model);
        let body = self.build_request(request);

        debug!(model, attachments = request.attachments.len(), "Invoking reasoning service");

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

        let text = extract_text(&parsed)?;
        let grounding = extract_grounding(&parsed);
        Ok(ReasoningReply { text, grounding })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    tools: Vec<Tool>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks")]
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<ChunkRef>,
    maps: Option<ChunkRef>,
}

#[derive(Deserialize)]
struct ChunkRef {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

// =============================================================================
// Response extraction
// =============================================================================

fn extract_text(response: &GenerateContentResponse) -> Result<String, AssistantError> {
    let text: String = response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.as_deref())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AssistantError::EmptyReply);
    }
    Ok(text)
}

/// Map grounding chunks into the closed metadata variant.
///
/// Web references win when both kinds appear; a maps-only response yields
/// `Location`. Chunks without a uri are dropped.
fn extract_grounding(response: &GenerateContentResponse) -> Option<Grounding> {
    let chunks = response
        .candidates
        .as_deref()?
        .first()?
        .grounding_metadata
        .as_ref()?
        .grounding_chunks
        .as_deref()?;

    let mut web = Vec::new();
    let mut location = Vec::new();
    for chunk in chunks {
        if let Some(r) = chunk.web.as_ref().and_then(chunk_to_ref) {
            web.push(r);
        } else if let Some(r) = chunk.maps.as_ref().and_then(chunk_to_ref) {
            location.push(r);
        }
    }

    if !web.is_empty() {
        Some(Grounding::Web(web))
    } else if !location.is_empty() {
        Some(Grounding::Location(location))
    } else {
        None
    }
}

fn chunk_to_ref(chunk: &ChunkRef) -> Option<GroundingRef> {
    let uri = chunk.uri.clone()?;
    let title = chunk.title.clone().unwrap_or_else(|| uri.clone());
    Some(GroundingRef { uri, title })
}

fn map_http_error(status: StatusCode, body: String) -> AssistantError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{}: {}", status_text, msg)
            }
        })
        .unwrap_or(body);

    AssistantError::Service {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebook_core::types::Attachment;

    fn client() -> GeminiClient {
        GeminiClient::new(AssistantConfig::default()).unwrap()
    }

    fn attachment(mime: &str) -> Attachment {
        Attachment {
            name: "upload".to_string(),
            mime_type: mime.to_string(),
            data: "AAAA".to_string(),
            size_bytes: 3,
        }
    }

    fn parse(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_model_selection_text_only() {
        let client = client();
        let request = ReasoningRequest {
            text: "how much concrete".to_string(),
            ..Default::default()
        };
        assert_eq!(client.select_model(&request), "gemini-3-pro-preview");
    }

    #[test]
    fn test_model_selection_with_pdf() {
        let client = client();
        let request = ReasoningRequest {
            text: "review this plan".to_string(),
            attachments: vec![attachment("application/pdf")],
            ..Default::default()
        };
        assert_eq!(client.select_model(&request), "gemini-3-flash-preview");
    }

    #[test]
    fn test_model_selection_with_image() {
        let client = client();
        let request = ReasoningRequest {
            attachments: vec![attachment("image/png")],
            ..Default::default()
        };
        assert_eq!(client.select_model(&request), "gemini-3-flash-preview");
    }

    #[test]
    fn test_model_selection_spreadsheet_stays_on_reasoning() {
        let client = client();
        let request = ReasoningRequest {
            attachments: vec![attachment("text/csv")],
            ..Default::default()
        };
        assert_eq!(client.select_model(&request), "gemini-3-pro-preview");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Total: " }, { "text": "42 bags" }] }
            }]
        }));
        assert_eq!(extract_text(&response).unwrap(), "Total: 42 bags");
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let response = parse(serde_json::json!({ "candidates": [] }));
        assert!(matches!(
            extract_text(&response),
            Err(AssistantError::EmptyReply)
        ));
    }

    #[test]
    fn test_extract_grounding_web() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "ok" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "web": { "uri": "https://b.example" } }
                    ]
                }
            }]
        }));
        let grounding = extract_grounding(&response).unwrap();
        match grounding {
            Grounding::Web(refs) => {
                assert_eq!(refs.len(), 2);
                assert_eq!(refs[0].title, "A");
                // Missing title falls back to the uri.
                assert_eq!(refs[1].title, "https://b.example");
            }
            other => panic!("expected web grounding, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_grounding_location_only() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps.example/x", "title": "Site" } }
                    ]
                }
            }]
        }));
        assert!(matches!(
            extract_grounding(&response),
            Some(Grounding::Location(_))
        ));
    }

    #[test]
    fn test_extract_grounding_web_wins_over_maps() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps.example/x", "title": "Site" } },
                        { "web": { "uri": "https://a.example", "title": "A" } }
                    ]
                }
            }]
        }));
        assert!(matches!(
            extract_grounding(&response),
            Some(Grounding::Web(_))
        ));
    }

    #[test]
    fn test_extract_grounding_absent() {
        let response = parse(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        }));
        assert!(extract_grounding(&response).is_none());
    }

    #[test]
    fn test_map_http_error_parses_service_body() {
        let body = r#"{ "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" } }"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string());
        match err {
            AssistantError::Service { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "RESOURCE_EXHAUSTED: quota exceeded");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_map_http_error_raw_body_fallback() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>gateway</html>".to_string());
        match err {
            AssistantError::Service { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "<html>gateway</html>");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_request_includes_history_and_attachments() {
        let client = client();
        let request = ReasoningRequest {
            text: "and the slab?".to_string(),
            attachments: vec![attachment("application/pdf")],
            history: vec![casebook_core::types::Message {
                id: 1,
                project_id: 1,
                session_id: 1,
                role: MessageRole::Assistant,
                content: "Foundation needs 12 bags.".to_string(),
                timestamp: 1,
                attachments: vec![],
                grounding: None,
            }],
        };

        let body = client.build_request(&request);
        assert_eq!(body.contents.len(), 2);
        assert_eq!(body.contents[0].role, "model");
        assert_eq!(body.contents[1].role, "user");
        // Current turn carries text plus one inline payload.
        assert_eq!(body.contents[1].parts.len(), 2);

        let json = serde_json::to_value(&body.contents[1].parts[1]).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "application/pdf");
    }
}
