use super::AppState;
use crate::error::EnvisionError;
use crate::gemini::compose_instructions;
use crate::logger::Timer;
use crate::models::GenerateRequest;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

const GENERIC_REFUSAL: &str =
    "The AI could not generate an image for this prompt. Please try a different description.";

/// Answers bare cross-origin preflight with no body; the CORS layer
/// attaches the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Answers non-POST methods with the same `{error}` body shape every other
/// failure carries.
pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// `POST /api/generate` — forwards the image and composed instructions to
/// the model and maps its reply onto the response table: 200 with a
/// data-URI, 400 on missing input, 422 on a model refusal, 500 on
/// misconfiguration or any other failure.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    let timer = Timer::new("generate");
    let response = handle_generate(&state, request, request_id).await;
    timer.stop();
    response
}

async fn handle_generate(state: &AppState, request: GenerateRequest, request_id: Uuid) -> Response {
    let image = request.image.as_deref().unwrap_or("");
    let prompt = request.prompt.as_deref().unwrap_or("");
    if image.is_empty() || prompt.is_empty() {
        let err = EnvisionError::InvalidInput("Missing image or prompt".into());
        log::warn!("[req:{}] {}", request_id, err);
        return rejection(&err);
    }

    let model = match &state.model {
        Some(model) => model,
        None => {
            // Operator problem, not a user problem. The key value itself
            // never appears in logs or responses.
            log::error!("[req:{}] API_KEY is not set in server environment", request_id);
            return rejection(&EnvisionError::Config("API_KEY missing".into()));
        }
    };

    let mime_type = request.mime_type.as_deref().unwrap_or("image/jpeg");
    let instructions = compose_instructions(prompt);

    log::info!(
        "[req:{}] Generation requested: prompt_len={}, mime={}",
        request_id,
        prompt.len(),
        mime_type
    );

    match model.generate(image, mime_type, &instructions).await {
        Ok(reply) => match reply.image {
            // Returned bytes are always labelled PNG regardless of the
            // model's stated encoding; accepted simplification.
            Some(data) => {
                log::info!("[req:{}] Image generated", request_id);
                (
                    StatusCode::OK,
                    Json(json!({ "imageUrl": format!("data:image/png;base64,{}", data) })),
                )
                    .into_response()
            }
            None => {
                let err = EnvisionError::ModelRefusal(
                    reply.text.unwrap_or_else(|| GENERIC_REFUSAL.to_string()),
                );
                log::warn!(
                    "[req:{}] Model output text instead of image: {}",
                    request_id,
                    err
                );
                rejection(&err)
            }
        },
        Err(e) => {
            log::error!("[req:{}] Model call failed: {}", request_id, e);
            rejection(&e)
        }
    }
}

/// Maps the error taxonomy onto the response table. Configuration detail
/// stays server-side; the client sees a fixed message.
fn rejection(err: &EnvisionError) -> Response {
    match err {
        EnvisionError::InvalidInput(message) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        EnvisionError::ModelRefusal(message) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        EnvisionError::Config(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error: API_KEY missing",
        ),
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
