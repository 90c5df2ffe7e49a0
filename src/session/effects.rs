//! Effects the session asks its host to perform.

use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::converters::html::Direction;
use crate::models::media::{MediaClip, MediaIndex};

/// Correlates an async request with the result the host feeds back.
pub type Ticket = u64;

/// A narration audio fetch for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioRequest {
    pub ticket: Ticket,
    pub slide: usize,
    pub text: String,
    /// True for look-ahead fetches; nobody is waiting on these.
    pub prefetch: bool,
}

/// Timers carry the generation or activation they were issued under.
/// A timer whose tag no longer matches is ignored when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(tag = "timer", rename_all = "snake_case")]
pub enum Timer {
    AutoAdvance { generation: u64 },
    ClearMatchFlash { activation: u64 },
}

/// What the listen toggle should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenStatus {
    #[default]
    Off,
    Loading,
    Playing,
    SpeakingLocally,
    Idle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Show slide `index`, animating in from `direction`.
    Render { index: usize, direction: Direction },
    /// Re-render the current slide in place (widget state or chrome changed).
    Refresh { index: usize },
    StopAudio,
    /// Pause and rewind every video element.
    StopVideos,
    FetchAudio(AudioRequest),
    PlayAudio {
        ticket: Ticket,
        slide: usize,
        #[serde(skip)]
        clip: Rc<MediaClip>,
    },
    /// On-device speech fallback. Report `playback_ended(ticket)` after the last chunk.
    SpeakLocal { ticket: Ticket, chunks: Vec<String> },
    /// Autoplay the slide's video, muted first then unmuted.
    PlayVideo { ticket: Ticket, media_index: MediaIndex },
    Schedule {
        timer: Timer,
        #[serde(with = "millis")]
        after: Duration,
    },
    Celebrate,
    WrongFlash,
    Shake,
    RewardAwarded { points: u32, total: u32 },
    Status { status: ListenStatus },
    /// Ask the learner to confirm deleting slide `index`.
    ConfirmDelete { index: usize },
    /// A visible, recoverable message.
    Notice { message: String },
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn effects_serialize_for_the_host() {
        let effect = Effect::Schedule {
            timer: Timer::AutoAdvance { generation: 4 },
            after: Duration::from_millis(800),
        };
        assert_eq!(
            serde_json::to_value(&effect).unwrap(),
            json!({
                "effect": "schedule",
                "timer": { "timer": "auto_advance", "generation": 4 },
                "after": 800
            })
        );

        let play = Effect::PlayAudio {
            ticket: 9,
            slide: 2,
            clip: Rc::new(MediaClip {
                mime: "audio/mpeg".into(),
                bytes: vec![1, 2, 3],
            }),
        };
        assert_eq!(
            serde_json::to_value(&play).unwrap(),
            json!({ "effect": "play_audio", "ticket": 9, "slide": 2 })
        );
        assert_eq!(
            serde_json::to_value(Effect::Status {
                status: ListenStatus::SpeakingLocally
            })
            .unwrap(),
            json!({ "effect": "status", "status": "speaking_locally" })
        );
    }
}
