//! End-to-end pipeline scenarios: session → normalizer → generation client
//! → endpoint (with a fake model) → back up the chain.

use async_trait::async_trait;
use envision::gemini::{AgingModel, ModelReply};
use envision::server::{router, AppState};
use envision::{Config, GenerationClient, Result, Session, SessionState};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

struct FakeModel(ModelReply);

#[async_trait]
impl AgingModel for FakeModel {
    async fn generate(&self, _: &str, _: &str, _: &str) -> Result<ModelReply> {
        Ok(self.0.clone())
    }
}

async fn spawn_server(model: Option<Arc<dyn AgingModel>>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(AppState::new(model))).await.unwrap();
    });
    format!("http://{}", addr)
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([180, 140, 100]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Jpeg(90)).unwrap();
    buf.into_inner()
}

/// Runs one full user flow: select, prompt, normalize, submit, complete.
async fn run_flow(base_url: String, prompt: &str) -> Session {
    let config = Config::new();
    let mut session = Session::new();
    session.select_image(jpeg_bytes(2000, 1000));
    session.set_prompt(prompt);
    assert!(session.begin_generation());

    let normalized = match session.state() {
        SessionState::Generating { image, .. } => {
            envision::normalize(image, &config.normalize).unwrap()
        }
        other => panic!("expected Generating, got {:?}", other),
    };
    assert!(normalized.width <= 1024 && normalized.height <= 512);
    assert_eq!(normalized.mime_type, "image/jpeg");

    let client = GenerationClient::new(base_url).with_timeout(Duration::from_secs(10));
    let outcome = client
        .generate(&normalized.data, normalized.mime_type, prompt)
        .await;
    session.complete(outcome);
    session
}

#[tokio::test]
async fn happy_path_reaches_result_with_literal_prompt() {
    let base = spawn_server(Some(Arc::new(FakeModel(ModelReply {
        image: Some("Z2VuZXJhdGVk".into()),
        text: None,
    }))))
    .await;

    let session = run_flow(base, "retired on a beach in Portugal").await;
    match session.state() {
        SessionState::Result { image_url, prompt } => {
            assert!(image_url.starts_with("data:image/png;base64,"));
            assert_eq!(prompt, "retired on a beach in Portugal");
        }
        other => panic!("expected Result, got {:?}", other),
    }
}

#[tokio::test]
async fn model_refusal_returns_to_preview_with_explanation() {
    let base = spawn_server(Some(Arc::new(FakeModel(ModelReply {
        image: None,
        text: Some("This prompt is not something I can visualize.".into()),
    }))))
    .await;

    let session = run_flow(base, "an impossible scenario").await;
    match session.state() {
        SessionState::Preview { error, prompt, image, .. } => {
            assert_eq!(
                error.as_deref(),
                Some("This prompt is not something I can visualize.")
            );
            assert_eq!(prompt, "an impossible scenario");
            assert!(!image.is_empty(), "retry must not require re-uploading");
        }
        other => panic!("expected Preview, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_server_key_surfaces_generic_error() {
    let base = spawn_server(None).await;

    let session = run_flow(base, "a vineyard in Tuscany").await;
    match session.state() {
        SessionState::Preview { error, .. } => {
            assert_eq!(
                error.as_deref(),
                Some("Server configuration error: API_KEY missing")
            );
        }
        other => panic!("expected Preview, got {:?}", other),
    }
}
