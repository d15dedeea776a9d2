//! Envision — future-self portrait generation.
//!
//! A user supplies a portrait and a free-text description of an imagined
//! future lifestyle; an external multimodal model returns an aged portrait
//! composited into that scenario. This crate carries the whole request
//! lifecycle around that one external call:
//!
//! - [`normalize`]: downsample and re-encode the source image to fit the
//!   transport payload limit.
//! - [`client`]: submit the normalized image and prompt to the local API
//!   boundary, with a 60-second cancellation timer.
//! - [`server`]: the `POST /api/generate` endpoint that forwards to the
//!   external model and extracts an image or a refusal from its reply.
//! - [`session`]: the idle → preview → generating → result state machine a
//!   front-end drives.
//!
//! The hard part, photorealistic age progression, is entirely delegated to
//! the model behind [`gemini::AgingModel`].

pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod server;
pub mod session;

pub use client::GenerationClient;
pub use config::{Config, GeminiConfig, NormalizeConfig};
pub use error::{EnvisionError, Result};
pub use gemini::{compose_instructions, AgingModel, GeminiClient, ModelReply};
pub use models::{ErrorBody, GenerateRequest, GenerateResponse};
pub use normalize::{normalize, NormalizedImage};
pub use session::{Session, SessionState};
