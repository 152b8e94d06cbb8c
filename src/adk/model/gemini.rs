// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, ResearchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: Option<String>,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// A missing key is only reported on the first request.
    pub fn new(model_name: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Build the `generateContent` request body
pub fn build_request_body(history: &[Content], config: Option<&GenerationConfig>) -> Value {
    let contents: Vec<Value> = history
        .iter()
        .map(|c| {
            let parts: Vec<Value> = c.parts.iter().filter_map(part_to_gemini_json).collect();
            json!({ "role": gemini_role(&c.role), "parts": parts })
        })
        .collect();

    let mut body = json!({ "contents": contents });

    if let Some(cfg) = config {
        let mut generation = serde_json::Map::new();
        if let Some(t) = cfg.temperature {
            generation.insert("temperature".to_string(), json!(t));
        }
        if let Some(m) = cfg.max_output_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(m));
        }
        if let Some(p) = cfg.top_p {
            generation.insert("topP".to_string(), json!(p));
        }
        if let Some(k) = cfg.top_k {
            generation.insert("topK".to_string(), json!(k));
        }
        if !generation.is_empty() {
            body["generationConfig"] = Value::Object(generation);
        }
    }

    body
}

/// Gemini only knows "user" and "model"
fn gemini_role(role: &str) -> &str {
    match role {
        "model" | "ai" | "assistant" => "model",
        _ => "user",
    }
}

/// Parse the first candidate of a `generateContent` response
pub fn parse_response(resp_json: &Value) -> Result<Content> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| ModelError::InvalidResponse("No candidates in response".to_string()))?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if finish_reason == "SAFETY" || finish_reason == "PROHIBITED_CONTENT" {
            return Err(ModelError::Blocked {
                provider: "gemini".to_string(),
                reason: finish_reason.to_string(),
            }
            .into());
        }
    }

    let parts_json = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            log::error!("No parts in candidate. Full response: {}", resp_json);
            ModelError::InvalidResponse(format!("No content in Gemini response: {}", candidate))
        })?;

    let parts = parts_json.iter().flat_map(parse_gemini_part).collect();

    Ok(Content {
        role: "model".to_string(),
        parts,
    })
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::ApiKeyMissing("GOOGLE_API_KEY".to_string()))?;

        let url = format!("{}/{}:generateContent", API_BASE, self.model_name);
        let body = build_request_body(history, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ResearchError::api("gemini", format!("{}: {}", status, text)));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None,
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &Value) -> Vec<Part> {
    let mut parts = Vec::new();

    // Thinking models flag reasoning parts with `thought: true`
    if p.get("thought").and_then(|t| t.as_bool()) == Some(true) {
        if let Some(text) = p["text"].as_str() {
            parts.push(Part::Thinking(text.to_string()));
        }
        return parts;
    }

    if let Some(thought) = p.get("thought").and_then(|t| t.as_str()) {
        if !thought.is_empty() {
            parts.push(Part::Thinking(thought.to_string()));
        }
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_text_part() {
        let part = Part::Text("Hello world".to_string());
        let json = part_to_gemini_json(&part).unwrap();
        assert_eq!(json, json!({ "text": "Hello world" }));
    }

    #[test]
    fn test_serialize_thinking_part_returns_none() {
        let part = Part::Thinking("Internal reasoning".to_string());
        assert!(part_to_gemini_json(&part).is_none());
    }

    #[test]
    fn test_request_body_maps_roles() {
        let history = [Content::user("question"), Content::model("answer")];
        let body = build_request_body(&history, None);

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "question");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_body_generation_config() {
        let config = GenerationConfig {
            temperature: Some(0.5),
            max_output_tokens: Some(2048),
            ..Default::default()
        };
        let body = build_request_body(&[Content::user("q")], Some(&config));

        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("topK").is_none());
    }

    #[test]
    fn test_parse_thinking_flag_part() {
        let json = json!({ "text": "Let me think...", "thought": true });
        let parts = parse_gemini_part(&json);

        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Thinking(t) => assert_eq!(t, "Let me think..."),
            _ => panic!("Expected Thinking part"),
        }
    }

    #[test]
    fn test_parse_empty_thought_ignored() {
        let json = json!({ "thought": "", "text": "Hello" });
        let parts = parse_gemini_part(&json);

        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Text(t) => assert_eq!(t, "Hello"),
            _ => panic!("Expected Text part"),
        }
    }

    #[test]
    fn test_parse_response_text() {
        let resp = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "## Summary" }] },
                "finishReason": "STOP"
            }]
        });
        let content = parse_response(&resp).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.text(), "## Summary");
    }

    #[test]
    fn test_parse_response_safety_block() {
        let resp = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = parse_response(&resp).unwrap_err();
        assert!(matches!(
            err,
            ResearchError::Model(ModelError::Blocked { .. })
        ));
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let err = parse_response(&json!({})).unwrap_err();
        assert!(matches!(
            err,
            ResearchError::Model(ModelError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let model = GeminiModel::new(DEFAULT_MODEL, None);
        let err = model
            .generate_content(&[Content::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResearchError::Model(ModelError::ApiKeyMissing(_))
        ));
    }
}
