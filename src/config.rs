// src/config.rs

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LessonError, Result};

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
pub const ELEVENLABS_VOICE_ID: &str = "ELEVENLABS_VOICE_ID";
pub const ELEVENLABS_MODEL: &str = "ELEVENLABS_MODEL";

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

/// Credentials and model choices for the external collaborators.
///
/// A missing key means the collaborator is unconfigured, which is not an error at
/// load time. Calls that need it fail with `CollaboratorUnavailable`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model: String,
}

impl RuntimeConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// `EnvVar` if a variable is set but not valid unicode.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(LessonError::EnvVar(e)),
        })
    }

    /// Builds the config from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        let mut get = |key: &str| -> Result<Option<String>> {
            Ok(lookup(key)?.filter(|v| !v.trim().is_empty()))
        };
        Ok(RuntimeConfig {
            anthropic_api_key: get(ANTHROPIC_API_KEY)?,
            anthropic_model: get(ANTHROPIC_MODEL)?
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            elevenlabs_api_key: get(ELEVENLABS_API_KEY)?,
            elevenlabs_voice_id: get(ELEVENLABS_VOICE_ID)?
                .unwrap_or_else(|| DEFAULT_ELEVENLABS_VOICE_ID.to_string()),
            elevenlabs_model: get(ELEVENLABS_MODEL)?
                .unwrap_or_else(|| DEFAULT_ELEVENLABS_MODEL.to_string()),
        })
    }

    pub fn has_narration_credentials(&self) -> bool {
        self.elevenlabs_api_key.is_some()
    }

    pub fn has_editor_credentials(&self) -> bool {
        self.anthropic_api_key.is_some()
    }
}

/// Runtime constants for one lesson session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// XP awarded once per interactive slide.
    pub reward_points: u32,
    /// Undo history capacity; the oldest snapshot is evicted first.
    pub undo_capacity: usize,
    /// How many upcoming slides get narration pre-fetched.
    pub prefetch_ahead: usize,
    pub auto_advance_delay_ms: u64,
    pub match_flash_ms: u64,
    /// Texts shorter than this are spoken locally as one chunk.
    pub speech_single_chunk_below: usize,
    pub speech_chunk_max: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            reward_points: 20,
            undo_capacity: 30,
            prefetch_ahead: 3,
            auto_advance_delay_ms: 800,
            match_flash_ms: 600,
            speech_single_chunk_below: 200,
            speech_chunk_max: 180,
        }
    }
}

impl SessionSettings {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn match_flash(&self) -> Duration {
        Duration::from_millis(self.match_flash_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(
        vars: &'a HashMap<&'static str, &'static str>,
    ) -> impl FnMut(&str) -> Result<Option<String>> + 'a {
        move |key: &str| Ok(vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn missing_keys_mean_unconfigured() {
        let vars = HashMap::new();
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(!config.has_narration_credentials());
        assert!(!config.has_editor_credentials());
        assert_eq!(config.elevenlabs_model, DEFAULT_ELEVENLABS_MODEL);
        assert_eq!(config.anthropic_model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let vars = HashMap::from([
            (ELEVENLABS_API_KEY, "  "),
            (ANTHROPIC_API_KEY, "sk-test"),
            (ELEVENLABS_VOICE_ID, "voice-1"),
        ]);
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(!config.has_narration_credentials());
        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.elevenlabs_voice_id, "voice-1");
    }

    #[test]
    fn lookup_errors_propagate() {
        let err = RuntimeConfig::from_lookup(|_| Err(LessonError::EnvVar(env::VarError::NotPresent)))
            .unwrap_err();
        assert!(matches!(err, LessonError::EnvVar(_)));
    }

    #[test]
    fn settings_defaults_and_partial_json() {
        let defaults = SessionSettings::default();
        assert_eq!(defaults.auto_advance_delay(), Duration::from_millis(800));
        assert_eq!(defaults.match_flash(), Duration::from_millis(600));

        let settings: SessionSettings =
            serde_json::from_str(r#"{ "reward_points": 50 }"#).unwrap();
        assert_eq!(settings.reward_points, 50);
        assert_eq!(settings.undo_capacity, 30);
    }
}
