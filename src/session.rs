//! The outpainting session: one uploaded photo, one selected resolution,
//! one prompt, and at most one finished result.
//!
//! ```text
//!            load_image ok                 generate
//!   Idle ──────────────────► ImageLoaded ───────────► Generating
//!     │                        ▲    ▲                  │      │
//!     │ load_image err         │    │ dismiss_result   │ ok   │ err
//!     ▼                        │    │                  ▼      ▼
//!   Error ◄────────────────────┘    └──────────── ResultReady Error
//! ```
//!
//! Every transition is appended to [`Session::history`]. Failures also set the
//! error banner ([`Session::error`]), which stays up until the next successful
//! upload or generation.
//!
//! The source bitmap outlives resolution changes and failed uploads. The
//! composite surface does not: it is painted, encoded and dropped inside each
//! [`generate`](Session::generate) call.

use crate::config::{AppConfig, ConfigError, resolve_api_key};
use crate::generation::{GenerationRequest, ImageGenerator};
use crate::imaging::{
    BackendError, CompositeSurface, ExportFormat, ImageBackend, Payload, Rgb, SourceImage,
};
use crate::prompt::build_instruction;
use crate::types::{GeneratedResult, GenerationSettings, Resolution};
use thiserror::Error;

const GENERIC_FAILURE: &str = "Generation failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ImageLoaded,
    Generating,
    ResultReady,
    Error,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to load image.")]
    Input(#[source] BackendError),
    #[error("API Key is missing in environment variables.")]
    Configuration,
    #[error("Could not prepare image for generation.")]
    Preparation {
        #[source]
        source: Option<BackendError>,
    },
    #[error("{0}")]
    Remote(String),
    #[error("'{0}' is not one of the available resolutions")]
    UnknownResolution(String),
}

/// Everything a session needs from the outside world besides its collaborators.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub resolutions: Vec<Resolution>,
    pub initial_resolution: Resolution,
    pub background: Rgb,
    /// `None` when the credential is not configured.
    pub api_key: Option<String>,
}

impl SessionConfig {
    /// Build from a loaded [`AppConfig`], reading the API key from the environment.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            resolutions: config.resolutions.clone(),
            initial_resolution: config.default_resolution()?.clone(),
            background: config.background()?,
            api_key: resolve_api_key(&config.generation),
        })
    }
}

pub struct Session<B, G> {
    backend: B,
    generator: G,
    resolutions: Vec<Resolution>,
    background: Rgb,
    api_key: Option<String>,
    source: Option<SourceImage>,
    settings: GenerationSettings,
    result: Option<GeneratedResult>,
    error: Option<String>,
    history: Vec<Phase>,
}

impl<B: ImageBackend, G: ImageGenerator> Session<B, G> {
    pub fn new(backend: B, generator: G, config: SessionConfig) -> Self {
        Self {
            backend,
            generator,
            resolutions: config.resolutions,
            background: config.background,
            api_key: config.api_key,
            source: None,
            settings: GenerationSettings {
                resolution: config.initial_resolution,
                prompt: String::new(),
            },
            result: None,
            error: None,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.history.last().copied().unwrap_or(Phase::Idle)
    }

    /// Every phase entered so far, oldest first. Starts with [`Phase::Idle`].
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// The error banner, if one is showing.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&GeneratedResult> {
        self.result.as_ref()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Decode an upload and make it the current source.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        match self.backend.decode(bytes) {
            Ok(source) => {
                tracing::info!(
                    width = source.width(),
                    height = source.height(),
                    "image loaded"
                );
                self.source = Some(source);
                self.result = None;
                self.error = None;
                self.transition(Phase::ImageLoaded);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "image decode failed");
                Err(self.fail(SessionError::Input(e)))
            }
        }
    }

    /// Pick the target canvas. Only members of [`resolutions`](Self::resolutions) are accepted.
    pub fn select_resolution(&mut self, resolution: &Resolution) -> Result<(), SessionError> {
        if !self.resolutions.contains(resolution) {
            return Err(SessionError::UnknownResolution(resolution.label.clone()));
        }
        self.settings.resolution = resolution.clone();
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.settings.prompt = prompt.into();
    }

    /// Composite the current source at the selected resolution, without any network call.
    pub fn preview(&self) -> Result<CompositeSurface, SessionError> {
        let source = self
            .source
            .as_ref()
            .ok_or(SessionError::Preparation { source: None })?;
        self.backend
            .composite(source, &self.settings.resolution, self.background)
            .map_err(|e| SessionError::Preparation { source: Some(e) })
    }

    /// Run one outpainting round trip and store the result.
    pub fn generate(&mut self) -> Result<&GeneratedResult, SessionError> {
        let Some(api_key) = self.api_key.clone() else {
            tracing::warn!("generation requested without an API key");
            return Err(self.fail(SessionError::Configuration));
        };

        let payload = match self.prepare() {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e)),
        };

        self.error = None;
        self.transition(Phase::Generating);

        let image_base64 = payload.to_base64();
        let instruction = build_instruction(&self.settings.prompt);
        let request = GenerationRequest {
            image_base64: &image_base64,
            mime_type: payload.mime_type(),
            instruction: &instruction,
        };

        match self.generator.generate(&api_key, &request) {
            Ok(image) => {
                self.error = None;
                self.transition(Phase::ResultReady);
                Ok(self.result.insert(GeneratedResult {
                    image_url: image.to_data_url(),
                    prompt: self.settings.prompt.clone(),
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                }))
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message
                };
                Err(self.fail(SessionError::Remote(message)))
            }
        }
    }

    /// Close the result view.
    pub fn dismiss_result(&mut self) {
        if self.result.take().is_some() {
            self.transition(Phase::ImageLoaded);
        }
    }

    fn prepare(&self) -> Result<Payload, SessionError> {
        let surface = self.preview()?;
        self.backend
            .encode(&surface, ExportFormat::Png)
            .map_err(|e| SessionError::Preparation { source: Some(e) })
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        self.error = Some(error.to_string());
        self.transition(Phase::Error);
        error
    }

    fn transition(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase(), to = ?phase, "session transition");
        self.history.push(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{MockGenerator, encode_png, patterned_image, resolution};
    use crate::types::preset_resolutions;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    fn config(api_key: Option<&str>) -> SessionConfig {
        let resolutions = preset_resolutions();
        SessionConfig {
            initial_resolution: resolutions[0].clone(),
            resolutions,
            background: Rgb::SLATE,
            api_key: api_key.map(str::to_string),
        }
    }

    fn session(
        backend: MockBackend,
        generator: MockGenerator,
        api_key: Option<&str>,
    ) -> Session<MockBackend, MockGenerator> {
        Session::new(backend, generator, config(api_key))
    }

    // =========================================================================
    // Upload tests
    // =========================================================================

    #[test]
    fn new_session_is_idle() {
        let s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.history(), &[Phase::Idle]);
        assert!(s.source().is_none());
        assert_eq!(s.settings().resolution.label, "1280 x 720");
        assert_eq!(s.settings().prompt, "");
    }

    #[test]
    fn load_image_moves_to_image_loaded() {
        let mut s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        s.load_image(&[1, 2, 3]).unwrap();
        assert_eq!(s.phase(), Phase::ImageLoaded);
        assert_eq!(s.source().unwrap().width(), 40);
        assert_eq!(s.backend().get_operations(), vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn load_failure_sets_banner() {
        let mut s = session(MockBackend::failing_decode(), MockGenerator::new(), Some("k"));
        let err = s.load_image(b"not an image").unwrap_err();
        assert!(matches!(err, SessionError::Input(_)));
        assert_eq!(s.phase(), Phase::Error);
        assert_eq!(s.error(), Some("Failed to load image."));
    }

    #[test]
    fn failed_upload_keeps_previous_image() {
        let mut s = Session::new(RustBackend::new(), MockGenerator::new(), config(Some("k")));
        s.load_image(&encode_png(&patterned_image(9, 5))).unwrap();
        assert!(s.load_image(b"garbage").is_err());
        assert_eq!(s.phase(), Phase::Error);
        assert_eq!(s.source().unwrap().width(), 9);
    }

    // =========================================================================
    // Settings tests
    // =========================================================================

    #[test]
    fn select_resolution_accepts_listed() {
        let mut s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        let vertical = preset_resolutions()[2].clone();
        s.select_resolution(&vertical).unwrap();
        assert_eq!(s.settings().resolution, vertical);
    }

    #[test]
    fn select_resolution_rejects_unlisted() {
        let mut s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        let err = s.select_resolution(&resolution(640, 480)).unwrap_err();
        assert!(matches!(err, SessionError::UnknownResolution(_)));
        assert_eq!(s.settings().resolution.label, "1280 x 720");
        assert_eq!(s.history(), &[Phase::Idle]);
    }

    #[test]
    fn resolution_change_keeps_source() {
        let mut s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        s.load_image(&[0]).unwrap();
        s.select_resolution(&preset_resolutions()[3]).unwrap();
        assert!(s.source().is_some());
        assert_eq!(s.phase(), Phase::ImageLoaded);
    }

    #[test]
    fn preview_composites_at_selected_resolution() {
        let mut s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        s.load_image(&[0]).unwrap();
        s.select_resolution(&preset_resolutions()[2]).unwrap();
        let surface = s.preview().unwrap();
        assert_eq!((surface.width(), surface.height()), (1080, 1920));
        assert_eq!(s.generator().call_count(), 0);
    }

    #[test]
    fn preview_without_image_fails() {
        let s = session(MockBackend::new(), MockGenerator::new(), Some("k"));
        assert!(matches!(
            s.preview(),
            Err(SessionError::Preparation { source: None })
        ));
    }

    // =========================================================================
    // Generation tests
    // =========================================================================

    #[test]
    fn generate_success_stores_result() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), Some("secret"));
        s.load_image(&[0]).unwrap();
        s.set_prompt("A snowy mountain range, pine trees");

        let result = s.generate().unwrap().clone();
        assert_eq!(result.image_url, "data:image/png;base64,QUJD");
        assert_eq!(result.prompt, "A snowy mountain range, pine trees");
        assert!(result.timestamp_ms > 0);

        assert_eq!(s.phase(), Phase::ResultReady);
        assert_eq!(
            s.history(),
            &[Phase::Idle, Phase::ImageLoaded, Phase::Generating, Phase::ResultReady]
        );
        assert_eq!(s.error(), None);

        let calls = s.generator().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "secret");
        assert_eq!(calls[0].mime_type, "image/png");
        assert!(
            calls[0]
                .instruction
                .ends_with("4. Additional Context: A snowy mountain range, pine trees")
        );
        assert_eq!(
            s.backend().get_operations(),
            vec![
                RecordedOp::Decode(1),
                RecordedOp::Composite { width: 1280, height: 720 },
                RecordedOp::Encode(ExportFormat::Png),
            ]
        );
    }

    #[test]
    fn empty_prompt_uses_default_guidance() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap();
        let calls = s.generator().calls();
        assert!(calls[0].instruction.ends_with("natural wide-angle shot."));
    }

    #[test]
    fn missing_api_key_never_generates() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), None);
        s.load_image(&[0]).unwrap();

        let err = s.generate().unwrap_err();
        assert!(matches!(err, SessionError::Configuration));
        assert_eq!(s.error(), Some("API Key is missing in environment variables."));
        assert_eq!(s.phase(), Phase::Error);
        assert!(!s.history().contains(&Phase::Generating));
        assert_eq!(s.generator().call_count(), 0);
        // No composite was painted either.
        assert_eq!(s.backend().get_operations(), vec![RecordedOp::Decode(1)]);
    }

    #[test]
    fn generate_without_image_is_preparation_error() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), Some("k"));
        let err = s.generate().unwrap_err();
        assert!(matches!(err, SessionError::Preparation { .. }));
        assert_eq!(s.error(), Some("Could not prepare image for generation."));
        assert_eq!(s.generator().call_count(), 0);
    }

    #[test]
    fn encode_failure_is_preparation_error() {
        let generator = MockGenerator::returning("QUJD");
        let mut s = session(MockBackend::failing_encode(), generator, Some("k"));
        s.load_image(&[0]).unwrap();
        assert!(matches!(
            s.generate(),
            Err(SessionError::Preparation { source: Some(_) })
        ));
        assert_eq!(s.generator().call_count(), 0);
        assert!(!s.history().contains(&Phase::Generating));
    }

    #[test]
    fn remote_failure_keeps_previous_result() {
        let generator = MockGenerator::returning("Rklyc3Q=").then_err(GenerationError::Api {
            status: 429,
            message: "Resource has been exhausted.".into(),
        });
        let mut s = session(MockBackend::new(), generator, Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap();
        let first = s.result().cloned();

        let err = s.generate().unwrap_err();
        assert!(matches!(err, SessionError::Remote(ref m) if m == "Resource has been exhausted."));
        assert_eq!(s.phase(), Phase::Error);
        assert_eq!(s.error(), Some("Resource has been exhausted."));
        assert_eq!(s.result().cloned(), first);
        assert_eq!(s.generator().call_count(), 2);
    }

    #[test]
    fn empty_remote_message_falls_back_to_generic() {
        let generator = MockGenerator::failing(GenerationError::Api {
            status: 500,
            message: String::new(),
        });
        let mut s = session(MockBackend::new(), generator, Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap_err();
        assert_eq!(s.error(), Some("Generation failed. Please try again."));
    }

    #[test]
    fn no_image_response_surfaces_message() {
        let mut s = session(
            MockBackend::new(),
            MockGenerator::failing(GenerationError::NoImageData),
            Some("k"),
        );
        s.load_image(&[0]).unwrap();
        s.generate().unwrap_err();
        assert_eq!(s.error(), Some("Response did not contain image data."));
    }

    #[test]
    fn banner_persists_until_success() {
        let generator = MockGenerator::failing(GenerationError::NoImage).then_ok("QUJD");
        let mut s = session(MockBackend::new(), generator, Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap_err();

        s.set_prompt("sunset");
        s.select_resolution(&preset_resolutions()[1]).unwrap();
        assert_eq!(s.error(), Some("No image generated."));

        s.generate().unwrap();
        assert_eq!(s.error(), None);
    }

    #[test]
    fn new_upload_clears_banner_and_result() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap();
        s.load_image(&[0, 0]).unwrap();
        assert!(s.result().is_none());
        assert_eq!(s.phase(), Phase::ImageLoaded);
    }

    #[test]
    fn dismiss_result_returns_to_image_loaded() {
        let mut s = session(MockBackend::new(), MockGenerator::returning("QUJD"), Some("k"));
        s.load_image(&[0]).unwrap();
        s.generate().unwrap();
        s.dismiss_result();
        assert_eq!(s.phase(), Phase::ImageLoaded);
        assert!(s.result().is_none());
        assert!(s.source().is_some());
    }

    #[test]
    fn real_backend_sends_canvas_sized_png() {
        let mut s = Session::new(
            RustBackend::new(),
            MockGenerator::returning("QUJD"),
            config(Some("k")),
        );
        s.load_image(&encode_png(&patterned_image(40, 30))).unwrap();
        s.select_resolution(&preset_resolutions()[3]).unwrap();
        s.generate().unwrap();

        let sent = STANDARD.decode(&s.generator().calls()[0].image_base64).unwrap();
        let decoded = image::load_from_memory(&sent).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1080, 1080));
    }
}
