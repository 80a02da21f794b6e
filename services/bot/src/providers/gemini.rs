//! Reaction Generator over the Gemini `generateContent` REST API.

use super::{decode_error, ensure_success, http_client, transport_error};
use pixel_core::error::ServiceError;
use pixel_core::reaction::{ReactionGenerator, SafetySetting};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, or `None` when the prompt was blocked,
    /// no candidate came back, or the candidate carries no text.
    pub fn into_text(self) -> Option<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(%reason, "Prompt was blocked by the safety filter");
            return None;
        }
        let candidate = self.candidates.into_iter().next()?;
        if let Some(reason) = &candidate.finish_reason {
            debug!(%reason, "Candidate finished");
        }
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(None)?,
            api_key,
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

impl ReactionGenerator for GeminiClient {
    fn generate(
        &self,
        prompt: &str,
        safety: &[SafetySetting],
    ) -> Result<Option<String>, ServiceError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            safety_settings: safety,
        };
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .map_err(transport_error)?;
        let parsed: GenerateResponse = ensure_success(response)?.json().map_err(decode_error)?;
        Ok(parsed.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixel_core::reaction::SAFETY_SETTINGS;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: "hi" }],
            }],
            safety_settings: &SAFETY_SETTINGS[..1],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "safetySettings": [{
                    "category": "HARM_CATEGORY_HARASSMENT",
                    "threshold": "BLOCK_MEDIUM_AND_ABOVE"
                }]
            })
        );
    }

    #[test]
    fn test_text_from_first_candidate() {
        let response = parse(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Big "}, {"text": "yikes."}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }));
        assert_eq!(response.into_text().as_deref(), Some("Big yikes."));
    }

    #[test]
    fn test_no_candidates_is_none() {
        assert_eq!(parse(json!({})).into_text(), None);
        assert_eq!(parse(json!({"candidates": []})).into_text(), None);
    }

    #[test]
    fn test_blocked_prompt_is_none() {
        let response = parse(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        assert_eq!(response.into_text(), None);
    }

    #[test]
    fn test_candidate_without_text_is_none() {
        let response = parse(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        assert_eq!(response.into_text(), None);

        let blank = parse(json!({
            "candidates": [{"content": {"parts": [{"text": "  "}]}}]
        }));
        assert_eq!(blank.into_text(), None);
    }
}
