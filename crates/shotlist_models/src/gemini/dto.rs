//! Wire types for the `generateContent` endpoint.

use base64::Engine;
use serde::{Deserialize, Serialize};
use shotlist_interface::GenerateRequest;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GeminiRequest {
    pub(crate) fn from_request(req: &GenerateRequest, default_temperature: Option<f32>) -> Self {
        let mut parts = vec![GeminiPart {
            text: Some(req.prompt().clone()),
            inline_data: None,
        }];
        for media in req.media() {
            parts.push(GeminiPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: media.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&media.data),
                }),
            });
        }

        Self {
            system_instruction: req.system().as_ref().map(|system| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(system.clone()),
                    inline_data: None,
                }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: (*req.temperature()).or(default_temperature),
                response_mime_type: (*req.json_output())
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if any.
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    pub(crate) fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .or_else(|| {
                self.candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .filter(|reason| matches!(*reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotlist_interface::MediaPart;

    #[test]
    fn request_carries_system_media_and_json_mode() {
        let req = GenerateRequest::builder()
            .system("be brief")
            .prompt("describe")
            .media(vec![MediaPart {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3],
            }])
            .json_output(true)
            .build()
            .unwrap();

        let wire = serde_json::to_value(GeminiRequest::from_request(&req, Some(0.5))).unwrap();

        assert_eq!(wire["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(wire["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(wire["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
        assert_eq!(wire["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(wire["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some(r#"{"a":1}"#));
        assert!(response.block_reason().is_none());
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }
}
