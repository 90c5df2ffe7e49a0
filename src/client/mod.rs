//! Clients for the external collaborators and a small native driver that runs a
//! session's narration fetches against them.

pub mod anthropic;
pub mod elevenlabs;

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::errors::{LessonError, Result};
use crate::models::media::MediaClip;
use crate::session::{Effect, LessonSession};

pub use anthropic::AnthropicClient;
pub use elevenlabs::ElevenLabsClient;

/// Default timeout for collaborator requests on native targets.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A text-to-speech backend.
pub trait SpeechSynthesizer {
    /// Synthesizes `text` into a playable clip.
    fn synthesize(&self, text: &str) -> impl Future<Output = Result<MediaClip>>;

    /// One-time availability check. Any failure counts as unavailable.
    fn probe(&self) -> impl Future<Output = bool>;
}

/// Builds the shared HTTP client. The timeout only applies where reqwest supports it.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.timeout(REQUEST_TIMEOUT);
    Ok(builder.build()?)
}

/// Generic `{"error": {"message": ...}}` / `{"detail": ...}` error bodies.
#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

/// Turns a non-success response into `LessonError::ApiError`.
pub(crate) async fn error_from_response(response: reqwest::Response) -> LessonError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return LessonError::Network(e),
    };
    let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
        Ok(ApiErrorResponse {
            error: Some(detail),
            ..
        }) => detail.message,
        Ok(ApiErrorResponse {
            detail: Some(detail),
            ..
        }) => detail.to_string(),
        _ => format!("API request failed with status {status}: {text}"),
    };
    LessonError::ApiError { status, message }
}

/// Performs every `FetchAudio` effect in `effects` with `synth`, feeding results
/// back into the session until no fetch is left. Returns the remaining effects
/// in order for the host to perform.
pub async fn perform_fetches<S: SpeechSynthesizer>(
    session: &mut LessonSession,
    synth: &S,
    effects: Vec<Effect>,
) -> Vec<Effect> {
    let mut queue: VecDeque<Effect> = effects.into();
    let mut remaining = Vec::new();
    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::FetchAudio(request) => {
                debug!(
                    "Fetching narration for slide {} (ticket {})",
                    request.slide, request.ticket
                );
                let result = synth.synthesize(&request.text).await;
                queue.extend(session.audio_fetched(request.ticket, result));
            }
            other => remaining.push(other),
        }
    }
    remaining
}

/// Probes `synth` once and pre-fetches the first slides if it is available.
pub async fn probe_narration<S: SpeechSynthesizer>(
    session: &mut LessonSession,
    synth: &S,
) -> Vec<Effect> {
    let available = synth.probe().await;
    let effects = session.probe_finished(available);
    perform_fetches(session, synth, effects).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::models::lesson::Lesson;
    use crate::session::{Collaborators, RemoteState};
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// In-memory synthesizer that records what it was asked to say.
    struct FakeSynth {
        available: bool,
        spoken: RefCell<Vec<String>>,
    }

    impl FakeSynth {
        fn new(available: bool) -> Self {
            Self {
                available,
                spoken: RefCell::new(Vec::new()),
            }
        }
    }

    impl SpeechSynthesizer for FakeSynth {
        async fn synthesize(&self, text: &str) -> Result<MediaClip> {
            self.spoken.borrow_mut().push(text.to_string());
            if self.available {
                Ok(MediaClip {
                    mime: "audio/mpeg".into(),
                    bytes: text.as_bytes().to_vec(),
                })
            } else {
                Err(LessonError::CollaboratorUnavailable("offline".into()))
            }
        }

        async fn probe(&self) -> bool {
            self.available
        }
    }

    fn session() -> LessonSession {
        let lesson = Lesson::load(
            None,
            &json!([
                { "t": "One", "narration": "First." },
                { "t": "Two", "narration": "Second." },
                { "t": "Three", "narration": "Third." },
                { "t": "Four", "narration": "Fourth." },
                { "t": "Five", "narration": "Fifth." }
            ]),
            &Value::Null,
        )
        .unwrap();
        LessonSession::with_rng(
            lesson,
            SessionSettings::default(),
            Collaborators {
                narration: true,
                ai_edit: false,
            },
            StdRng::seed_from_u64(1),
        )
    }

    #[tokio::test]
    async fn first_fetch_plays_and_prefetches_lookahead() {
        let mut s = session();
        let synth = FakeSynth::new(true);
        let effects = s.start(true);
        let rest = perform_fetches(&mut s, &synth, effects).await;

        assert!(rest
            .iter()
            .any(|e| matches!(e, Effect::PlayAudio { slide: 0, .. })));
        assert_eq!(s.narration().remote_state(), RemoteState::Available);
        for slide in 0..=3 {
            assert!(s.narration().is_cached(slide), "slide {slide}");
        }
        assert!(!s.narration().is_cached(4));
        assert_eq!(synth.spoken.borrow()[0], "First.");
    }

    #[tokio::test]
    async fn failing_backend_falls_back_to_local_speech() {
        let mut s = session();
        let synth = FakeSynth::new(false);
        let effects = s.start(true);
        let rest = perform_fetches(&mut s, &synth, effects).await;

        assert!(rest.iter().any(|e| matches!(e, Effect::SpeakLocal { .. })));
        assert_eq!(s.narration().remote_state(), RemoteState::Unavailable);

        // Later slides go straight to local speech without another fetch.
        let effects = s.next();
        assert!(!effects.iter().any(|e| matches!(e, Effect::FetchAudio(_))));
        assert_eq!(synth.spoken.borrow().len(), 1);
    }

    #[tokio::test]
    async fn probe_prefetches_opening_slides() {
        let mut s = session();
        let synth = FakeSynth::new(true);
        probe_narration(&mut s, &synth).await;
        assert_eq!(s.narration().remote_state(), RemoteState::Available);
        assert!(s.narration().is_cached(0));
        assert!(s.narration().is_cached(2));
        assert!(!s.narration().is_cached(3));
    }
}
