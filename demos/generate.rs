//! Drives the full pipeline against a running envision server:
//! normalize a photo, submit it with a prompt, save the returned data-URI.
//!
//! Usage: cargo run --example generate -- <photo> <prompt> [server-url]

use base64::Engine;
use envision::normalize::{self, read_source};
use envision::{Config, GenerationClient, Session, SessionState};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    envision::logger::init()?;

    let mut args = env::args().skip(1);
    let photo = args.next().ok_or("usage: generate <photo> <prompt> [server-url]")?;
    let prompt = args.next().ok_or("usage: generate <photo> <prompt> [server-url]")?;
    let server = args.next().unwrap_or_else(|| "http://127.0.0.1:8787".to_string());

    let config = Config::from_env();
    let mut session = Session::new();
    session.select_image(read_source(&photo)?);
    session.set_prompt(&prompt);

    if !session.can_generate() {
        log::error!("❌ Nothing to generate: prompt is empty");
        return Ok(());
    }
    session.begin_generation();

    let normalized = match session.state() {
        SessionState::Generating { image, .. } => {
            normalize::normalize(image, &config.normalize)?
        }
        _ => unreachable!("begin_generation succeeded"),
    };
    log::info!(
        "🖼️  Normalized to {}x{} ({} base64 bytes)",
        normalized.width,
        normalized.height,
        normalized.data.len()
    );

    let client = GenerationClient::new(&server);
    let outcome = client
        .generate(&normalized.data, normalized.mime_type, &prompt)
        .await;
    session.complete(outcome);

    match session.state() {
        SessionState::Result { image_url, prompt } => {
            log::info!("✅ Generation succeeded for \"{}\"", prompt);
            let encoded = image_url
                .strip_prefix("data:image/png;base64,")
                .unwrap_or(image_url);
            let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
            std::fs::write("my-vision.png", bytes)?;
            log::info!("💾 Saved to my-vision.png");
        }
        SessionState::Preview { error, .. } => {
            log::error!(
                "❌ Generation failed: {}",
                error.as_deref().unwrap_or("unknown error")
            );
        }
        other => log::warn!("⚠️  Unexpected session state: {:?}", other),
    }

    Ok(())
}
