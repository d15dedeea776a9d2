use std::env;

/// Transport body ceiling the normalized payload must stay under (4.5 MB,
/// matching common serverless request limits).
pub const MAX_PAYLOAD_BYTES: usize = 4_718_592;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Bounds for client-side image normalization before transport.
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub gemini: Option<GeminiConfig>,
    pub normalize: NormalizeConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `API_KEY` (falling back to `GEMINI_API_KEY`) and an optional
    /// `GEMINI_MODEL` override. The key value is never logged.
    pub fn from_env() -> Self {
        let api_key = env::var("API_KEY")
            .ok()
            .or_else(|| env::var("GEMINI_API_KEY").ok());
        let model = env::var("GEMINI_MODEL").ok();

        GeminiConfig { api_key, model }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            max_width: 1024,
            max_height: 1024,
            jpeg_quality: 80,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
        }
    }
}

impl NormalizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_quality(mut self, jpeg_quality: u8) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            gemini: None,
            normalize: NormalizeConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            gemini: Some(GeminiConfig::from_env()),
            normalize: NormalizeConfig::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = Some(config);
        self
    }

    pub fn with_normalize(mut self, config: NormalizeConfig) -> Self {
        self.normalize = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert!(config.port.is_none());
        assert!(config.gemini.is_none());
        assert_eq!(config.normalize.max_width, 1024);
        assert_eq!(config.normalize.max_height, 1024);
        assert_eq!(config.normalize.jpeg_quality, 80);
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_port(9000)
            .with_gemini(GeminiConfig::new().with_api_key("k").with_model("m"))
            .with_normalize(NormalizeConfig::new().with_bounds(512, 512).with_quality(70));

        assert_eq!(config.port, Some(9000));
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key.as_deref(), Some("k"));
        assert_eq!(gemini.model.as_deref(), Some("m"));
        assert_eq!(config.normalize.max_width, 512);
        assert_eq!(config.normalize.jpeg_quality, 70);
    }
}
