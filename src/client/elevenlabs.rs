// src/client/elevenlabs.rs
//! ElevenLabs text-to-speech client.

use log::{debug, warn};
use serde::Serialize;

use super::{error_from_response, http_client, SpeechSynthesizer};
use crate::config::RuntimeConfig;
use crate::errors::{LessonError, Result};
use crate::models::media::MediaClip;

pub const API_BASE: &str = "https://api.elevenlabs.io/v1";
const API_KEY_HEADER: &str = "xi-api-key";
const AUDIO_MIME: &str = "audio/mpeg";

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            use_speaker_boost: true,
        }
    }
}

#[derive(Serialize, Debug)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    voice_id: String,
    model: String,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model: model.into(),
            voice_settings: VoiceSettings::default(),
        })
    }

    /// # Errors
    ///
    /// `CollaboratorUnavailable` if `ELEVENLABS_API_KEY` is not configured.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let key = config.elevenlabs_api_key.as_deref().ok_or_else(|| {
            LessonError::CollaboratorUnavailable("ELEVENLABS_API_KEY is not set".into())
        })?;
        Self::new(
            key,
            config.elevenlabs_voice_id.as_str(),
            config.elevenlabs_model.as_str(),
        )
    }

    pub fn stream_url(&self) -> String {
        format!("{API_BASE}/text-to-speech/{}/stream", self.voice_id)
    }
}

impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<MediaClip> {
        let body = SpeechRequest {
            text,
            model_id: &self.model,
            voice_settings: self.voice_settings,
        };
        let response = self
            .http
            .post(self.stream_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let bytes = response.bytes().await?;
        debug!("Synthesized {} bytes of audio", bytes.len());
        Ok(MediaClip {
            mime: AUDIO_MIME.to_string(),
            bytes: bytes.to_vec(),
        })
    }

    async fn probe(&self) -> bool {
        let result = self
            .http
            .get(format!("{API_BASE}/user"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Narration probe rejected: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Narration probe failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn speech_request_carries_voice_settings() {
        let body = SpeechRequest {
            text: "Hello.",
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings::default(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "text": "Hello.",
                "model_id": "eleven_multilingual_v2",
                "voice_settings": { "stability": 0.5, "similarity_boost": 0.75, "use_speaker_boost": true }
            })
        );
    }

    #[test]
    fn stream_url_uses_voice() {
        let config = RuntimeConfig::from_lookup(|key| {
            Ok((key == crate::config::ELEVENLABS_API_KEY).then(|| "k".to_string()))
        })
        .unwrap();
        let client = ElevenLabsClient::from_config(&config).unwrap();
        assert_eq!(
            client.stream_url(),
            "https://api.elevenlabs.io/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM/stream"
        );
    }
}
