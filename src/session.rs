//! Single-session state machine driving the upload → preview → generating
//! → result flow. One session per user surface; transitions are pure and
//! guarded, never panicking on out-of-state calls.

use crate::error::EnvisionError;
use crate::normalize::sniff_mime;
use base64::Engine;

/// Tagged-union session state. There is no terminal error state: failures
/// return to `Preview` with the message attached so the user can retry
/// without re-uploading.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No image selected yet.
    Idle,
    /// Camera viewfinder active.
    Capturing,
    /// Image chosen, prompt being composed.
    Preview {
        image: Vec<u8>,
        preview: String,
        prompt: String,
        error: Option<String>,
    },
    /// Request in flight.
    Generating {
        image: Vec<u8>,
        preview: String,
        prompt: String,
    },
    /// Generation succeeded.
    Result { image_url: String, prompt: String },
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    /// Whether the capture surface currently holds the camera. Cleared on
    /// every path out of `Capturing` so the hardware indicator never stays
    /// lit.
    capture_active: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn capture_active(&self) -> bool {
        self.capture_active
    }

    /// Idle → Capturing. No-op elsewhere.
    pub fn begin_capture(&mut self) {
        if matches!(self.state, SessionState::Idle) {
            self.state = SessionState::Capturing;
            self.capture_active = true;
        }
    }

    /// Capturing → Idle, releasing the capture surface.
    pub fn cancel_capture(&mut self) {
        if matches!(self.state, SessionState::Capturing) {
            self.state = SessionState::Idle;
            self.capture_active = false;
        }
    }

    /// Idle/Capturing → Preview with the chosen image. Completing a capture
    /// releases the capture surface.
    pub fn select_image(&mut self, image: Vec<u8>) {
        if !matches!(
            self.state,
            SessionState::Idle | SessionState::Capturing
        ) {
            return;
        }

        let preview = format!(
            "data:{};base64,{}",
            sniff_mime(&image),
            base64::engine::general_purpose::STANDARD.encode(&image)
        );
        self.state = SessionState::Preview {
            image,
            preview,
            prompt: String::new(),
            error: None,
        };
        self.capture_active = false;
    }

    /// Updates the prompt text. Only meaningful in Preview.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        if let SessionState::Preview { prompt, .. } = &mut self.state {
            *prompt = text.into();
        }
    }

    /// Generation is only invokable with an image and a non-empty trimmed
    /// prompt. The UI disables the trigger on false; this is a guard, not a
    /// hard error.
    pub fn can_generate(&self) -> bool {
        matches!(
            &self.state,
            SessionState::Preview { prompt, .. } if !prompt.trim().is_empty()
        )
    }

    /// Preview → Generating, clearing any previous error. Returns false
    /// when the guard does not hold (nothing changes).
    pub fn begin_generation(&mut self) -> bool {
        if !self.can_generate() {
            return false;
        }
        if let SessionState::Preview {
            image,
            preview,
            prompt,
            ..
        } = std::mem::take(&mut self.state)
        {
            self.state = SessionState::Generating {
                image,
                preview,
                prompt,
            };
        }
        true
    }

    /// Generating → Result on success; Generating → Preview with the error
    /// message attached on failure. The image and prompt survive failures.
    pub fn complete(&mut self, outcome: Result<String, EnvisionError>) {
        if let SessionState::Generating {
            image,
            preview,
            prompt,
        } = std::mem::take(&mut self.state)
        {
            self.state = match outcome {
                Ok(image_url) => SessionState::Result { image_url, prompt },
                Err(e) => SessionState::Preview {
                    image,
                    preview,
                    prompt,
                    error: Some(e.to_string()),
                },
            };
        }
    }

    /// Any state → Idle, discarding all session data and releasing the
    /// capture surface.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.capture_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session_in_preview() -> Session {
        let mut session = Session::new();
        session.select_image(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        session
    }

    #[test]
    fn test_select_image_moves_to_preview() {
        let session = session_in_preview();
        match session.state() {
            SessionState::Preview { preview, error, .. } => {
                assert!(preview.starts_with("data:image/jpeg;base64,"));
                assert!(error.is_none());
            }
            other => panic!("expected Preview, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_flow_releases_camera() {
        let mut session = Session::new();
        session.begin_capture();
        assert!(session.capture_active());
        assert_eq!(session.state(), &SessionState::Capturing);

        session.cancel_capture();
        assert!(!session.capture_active());
        assert_eq!(session.state(), &SessionState::Idle);

        session.begin_capture();
        session.select_image(vec![1, 2, 3]);
        assert!(!session.capture_active());
        assert!(matches!(session.state(), SessionState::Preview { .. }));
    }

    #[test]
    fn test_guard_rejects_whitespace_prompts() {
        let mut session = session_in_preview();
        assert!(!session.can_generate());

        for prompt in ["", "   ", "\t", "\n\n", "\u{a0}\u{a0}", "  \r\n  "] {
            session.set_prompt(prompt);
            assert!(!session.can_generate(), "prompt {:?} passed guard", prompt);
            assert!(!session.begin_generation());
        }

        session.set_prompt("  retired on a beach  ");
        assert!(session.can_generate());
    }

    #[test]
    fn test_generation_success_reaches_result() {
        let mut session = session_in_preview();
        session.set_prompt("retired on a beach in Portugal");
        assert!(session.begin_generation());
        assert!(matches!(session.state(), SessionState::Generating { .. }));

        session.complete(Ok("data:image/png;base64,AA==".into()));
        match session.state() {
            SessionState::Result { image_url, prompt } => {
                assert_eq!(image_url, "data:image/png;base64,AA==");
                assert_eq!(prompt, "retired on a beach in Portugal");
            }
            other => panic!("expected Result, got {:?}", other),
        }
    }

    #[test]
    fn test_generation_failure_returns_to_preview_with_error() {
        let mut session = session_in_preview();
        session.set_prompt("a vineyard in Tuscany");
        session.begin_generation();
        session.complete(Err(EnvisionError::Timeout(Duration::from_secs(60))));

        match session.state() {
            SessionState::Preview {
                image,
                prompt,
                error,
                ..
            } => {
                assert!(!image.is_empty(), "image must survive a failure");
                assert_eq!(prompt, "a vineyard in Tuscany");
                assert_eq!(
                    error.as_deref(),
                    Some("Request timed out. The image generation took too long.")
                );
            }
            other => panic!("expected Preview, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_clears_previous_error() {
        let mut session = session_in_preview();
        session.set_prompt("a ski lodge");
        session.begin_generation();
        session.complete(Err(EnvisionError::Internal("boom".into())));
        assert!(matches!(
            session.state(),
            SessionState::Preview { error: Some(_), .. }
        ));

        assert!(session.begin_generation());
        assert!(matches!(session.state(), SessionState::Generating { .. }));
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut session = session_in_preview();
        session.set_prompt("anything");
        session.begin_generation();
        session.reset();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(!session.capture_active());
    }

    #[test]
    fn test_out_of_state_transitions_are_noops() {
        let mut session = Session::new();
        session.set_prompt("ignored");
        session.cancel_capture();
        session.complete(Ok("ignored".into()));
        assert_eq!(session.state(), &SessionState::Idle);

        let mut session = session_in_preview();
        session.begin_capture();
        assert!(matches!(session.state(), SessionState::Preview { .. }));
    }
}
