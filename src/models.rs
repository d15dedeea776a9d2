//! Request/response bodies for the `/api/generate` boundary.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`. Fields are optional so that presence is
/// validated by the handler (400) rather than the JSON deserializer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// Base64-encoded image, no data-URI prefix.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Success body: the generated image as a data-URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// Error body shared by every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
