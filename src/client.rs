//! Generation client: the caller-side half of the `/api/generate`
//! boundary, with the 60-second cancellation timer and the content-type
//! guard against a host page standing in for the endpoint.

use crate::error::{EnvisionError, Result};
use crate::models::{ErrorBody, GenerateRequest, GenerateResponse};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ENDPOINT_NOT_FOUND: &str =
    "API endpoint not found. The generation service does not appear to be \
     running at this address; start the envision server and point the client at it.";

#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GenerationClient {
    /// Client against `{base_url}/api/generate` with the default 60 s timer.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the cancellation timer. Mostly useful in tests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submits one normalized image and prompt; resolves to the generated
    /// image URL or a descriptive failure. Exactly one outbound call per
    /// invocation; failures are reported verbatim for manual resubmission.
    pub async fn generate(
        &self,
        image_b64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        let round_trip = self.round_trip(image_b64, mime_type, prompt);

        // Expiry drops the in-flight request, cancelling it unilaterally;
        // the server-side model call may still complete unobserved.
        match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(EnvisionError::Timeout(self.timeout)),
        }
    }

    async fn round_trip(&self, image_b64: &str, mime_type: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = GenerateRequest {
            image: Some(image_b64.to_string()),
            mime_type: Some(mime_type.to_string()),
            prompt: Some(prompt.to_string()),
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();

        // A markup content type means we hit a generic host page, not the
        // endpoint; surface a configuration hint instead of a parse crash.
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if content_type.contains("text/html") {
            return Err(EnvisionError::EndpointNotFound(ENDPOINT_NOT_FOUND.into()));
        }

        if !status.is_success() {
            let error_body: ErrorBody = response.json().await.unwrap_or_default();
            let message = error_body
                .error
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            // 422 is the endpoint's deliberate "model declined" signal,
            // distinct from hard failures.
            if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
                return Err(EnvisionError::ModelRefusal(message));
            }
            return Err(EnvisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: GenerateResponse = response.json().await?;
        data.image_url.ok_or_else(|| {
            EnvisionError::Api {
                status: status.as_u16(),
                message: "No image URL received from server".into(),
            }
        })
    }
}
