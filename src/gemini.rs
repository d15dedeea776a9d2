//! Gemini (Google) client for the age-progression generation call.
//!
//! The endpoint hands the user's portrait and scenario to a multimodal
//! model; everything hard happens on the other side of this call. The
//! [`AgingModel`] trait is the seam that lets tests substitute a fake.

use crate::config::GeminiConfig;
use crate::error::{EnvisionError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// What the external model came back with: the first inline image found,
/// plus any text part kept as a fallback explanation.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    /// Base64-encoded image bytes, if the model produced an image.
    pub image: Option<String>,
    /// Plain-text part, retained as the refusal explanation when no image
    /// is present.
    pub text: Option<String>,
}

/// The external generative model, consumed as an opaque request/response
/// capability.
#[async_trait]
pub trait AgingModel: Send + Sync {
    /// Sends one image/instructions pair to the model. Exactly one outbound
    /// call; no retries.
    async fn generate(
        &self,
        image_b64: &str,
        mime_type: &str,
        instructions: &str,
    ) -> Result<ModelReply>;
}

/// Composes the fixed instruction template around the user's free-text
/// scenario. The scenario is embedded verbatim.
pub fn compose_instructions(scenario: &str) -> String {
    format!(
        "Instructions:\n\
         1. Analyze the attached image of the person.\n\
         2. Generate a new photorealistic image of this SAME person but aged to approximately 50 years old.\n\
         3. Place them in the following scenario: \"{}\".\n\
         4. Ensure the face maintains recognizable features of the original person but looks distinguished, successful, and mature.\n\
         5. The person should look \"premium\", healthy, and attractive. Do not make them look elderly or frail. Use cinematic lighting.\n\
         6. Do not generate a cartoon or caricature.",
        scenario
    )
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Builds a client from configuration. Fails when no API key is
    /// present; the caller decides how to surface that.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| EnvisionError::Config("API_KEY is not set".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AgingModel for GeminiClient {
    async fn generate(
        &self,
        image_b64: &str,
        mime_type: &str,
        instructions: &str,
    ) -> Result<ModelReply> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let body = GeminiRequest::new(image_b64, mime_type, instructions);

        log::info!("🎨 Invoking model: {}", self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnvisionError::Api {
                status: status.as_u16(),
                message: format!("model request failed ({}): {}", status.as_u16(), text),
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        Ok(gemini_response.into_reply())
    }
}

// Wire types (camelCase on the wire).

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn new(image_b64: &str, mime_type: &str, instructions: &str) -> Self {
        let mime_type = if mime_type.is_empty() {
            "image/jpeg"
        } else {
            mime_type
        };

        Self {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data: image_b64.to_string(),
                        },
                    },
                    GeminiRequestPart::Text {
                        text: instructions.to_string(),
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    #[serde(default)]
    inline_data: Option<GeminiInlineData>,
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Scans all parts of the first candidate: the first inline-image part
    /// wins, any text part is retained as the fallback explanation.
    fn into_reply(self) -> ModelReply {
        let mut reply = ModelReply::default();

        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(inline) = part.inline_data {
                if reply.image.is_none() && !inline.data.is_empty() {
                    reply.image = Some(inline.data);
                }
            } else if let Some(text) = part.text {
                reply.text = Some(text);
            }
        }

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_embed_scenario_verbatim() {
        let instructions = compose_instructions("retired on a beach in Portugal");
        assert!(instructions.contains("\"retired on a beach in Portugal\""));
        assert!(instructions.contains("aged to approximately 50 years old"));
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = GeminiClient::new(GeminiConfig::new()).unwrap_err();
        assert!(matches!(err, EnvisionError::Config(_)));
    }

    #[test]
    fn test_client_defaults_model() {
        let client = GeminiClient::new(GeminiConfig::new().with_api_key("k")).unwrap();
        assert_eq!(client.model(), "gemini-2.5-flash-image");
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GeminiRequest::new("AAAA", "image/jpeg", "do the thing");
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert_eq!(parts[1]["text"], "do the thing");
    }

    #[test]
    fn test_empty_mime_type_defaults_to_jpeg() {
        let request = GeminiRequest::new("AAAA", "", "prompt");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_reply_takes_first_image_and_keeps_text() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "Zmlyc3Q="}},
                        {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                    ]
                }
            }]
        }"#;
        let reply: ModelReply = serde_json::from_str::<GeminiResponse>(json)
            .unwrap()
            .into_reply();
        assert_eq!(reply.image.as_deref(), Some("Zmlyc3Q="));
        assert_eq!(reply.text.as_deref(), Some("Here you go"));
    }

    #[test]
    fn test_reply_text_only() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "I cannot do that"}]
                }
            }]
        }"#;
        let reply = serde_json::from_str::<GeminiResponse>(json)
            .unwrap()
            .into_reply();
        assert!(reply.image.is_none());
        assert_eq!(reply.text.as_deref(), Some("I cannot do that"));
    }

    #[test]
    fn test_reply_empty_response() {
        let reply = serde_json::from_str::<GeminiResponse>("{}").unwrap().into_reply();
        assert!(reply.image.is_none());
        assert!(reply.text.is_none());
    }
}
