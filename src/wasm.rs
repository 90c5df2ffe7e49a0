//! Browser bindings.
//!
//! [`LessonRuntime`] wraps one [`LessonSession`]. Every call returns the effects to
//! perform as a JSON array; the page script performs them and reports results back.
//! Audio clips do not cross as JSON: fetch them with [`LessonRuntime::take_audio`].

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::config::SessionSettings;
use crate::converters::html::Direction;
#[cfg(feature = "diff")]
use crate::edit::ai::AiEditOutcome;
use crate::edit::ai::AiEditTicket;
use crate::edit::SlideForm;
use crate::errors::LessonError;
use crate::models::lesson::Lesson;
use crate::models::media::MediaClip;
use crate::models::slide::SlideKind;
use crate::session::{Collaborators, Effect, LessonSession, Ticket, Timer};
use crate::widgets::WidgetAction;

#[wasm_bindgen]
pub struct LessonRuntime {
    session: LessonSession,
    audio: HashMap<Ticket, Rc<MediaClip>>,
}

impl LessonRuntime {
    /// Serializes effects, keeping audio clips aside for `take_audio`.
    ///
    /// A `stop_audio` effect ends every clip handed out so far, so their unclaimed
    /// bytes are dropped.
    fn emit(&mut self, effects: Vec<Effect>) -> String {
        for effect in &effects {
            match effect {
                Effect::StopAudio => self.audio.clear(),
                Effect::PlayAudio { ticket, clip, .. } => {
                    self.audio.insert(*ticket, Rc::clone(clip));
                }
                _ => {}
            }
        }
        match serde_json::to_string(&effects) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize effects: {e}");
                "[]".to_string()
            }
        }
    }
}

#[cfg(feature = "diff")]
fn with_review(mut json: Value, outcome: &AiEditOutcome) -> Value {
    match outcome.review() {
        Ok(Some(review)) => json["review"] = Value::String(review),
        Ok(None) => {}
        Err(e) => log::warn!("Failed to summarize rewrite: {e}"),
    }
    json
}

fn parse_direction(direction: &str) -> Direction {
    match direction {
        "backward" => Direction::Backward,
        _ => Direction::Forward,
    }
}

#[wasm_bindgen]
impl LessonRuntime {
    /// Loads a lesson from its slides and media JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        slides_json: &str,
        media_json: &str,
        title: Option<String>,
        narration: bool,
        ai_edit: bool,
    ) -> Result<LessonRuntime, JsError> {
        let slides: Value = serde_json::from_str(slides_json)?;
        let media: Value = if media_json.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(media_json)?
        };
        let lesson = Lesson::load(title, &slides, &media)?;
        Ok(LessonRuntime {
            session: LessonSession::new(
                lesson,
                SessionSettings::default(),
                Collaborators { narration, ai_edit },
            ),
            audio: HashMap::new(),
        })
    }

    // --- Navigation ---

    pub fn start(&mut self, listen: bool) -> String {
        let effects = self.session.start(listen);
        self.emit(effects)
    }

    pub fn goto(&mut self, index: i32) -> String {
        let effects = self.session.goto(i64::from(index));
        self.emit(effects)
    }

    pub fn next(&mut self) -> String {
        let effects = self.session.next();
        self.emit(effects)
    }

    pub fn previous(&mut self) -> String {
        let effects = self.session.previous();
        self.emit(effects)
    }

    #[wasm_bindgen(getter)]
    pub fn current(&self) -> usize {
        self.session.current_index()
    }

    #[wasm_bindgen(getter)]
    pub fn xp(&self) -> u32 {
        self.session.xp()
    }

    /// `{"action": "select_option", "index": 2}` and friends.
    pub fn act(&mut self, action_json: &str) -> Result<String, JsError> {
        let action: WidgetAction = serde_json::from_str(action_json)?;
        let effects = self.session.act(action);
        Ok(self.emit(effects))
    }

    /// Reports a fired timer, as received in a `schedule` effect.
    pub fn fire(&mut self, timer_json: &str) -> Result<String, JsError> {
        let timer: Timer = serde_json::from_str(timer_json)?;
        let effects = self.session.fire(timer);
        Ok(self.emit(effects))
    }

    // --- Narration ---

    pub fn toggle_listening(&mut self) -> String {
        let effects = self.session.toggle_listening();
        self.emit(effects)
    }

    pub fn probe_finished(&mut self, available: bool) -> String {
        let effects = self.session.probe_finished(available);
        self.emit(effects)
    }

    pub fn audio_fetched(&mut self, ticket: Ticket, mime: String, bytes: Vec<u8>) -> String {
        let effects = self
            .session
            .audio_fetched(ticket, Ok(MediaClip { mime, bytes }));
        self.emit(effects)
    }

    pub fn audio_failed(&mut self, ticket: Ticket, message: String) -> String {
        let effects = self
            .session
            .audio_fetched(ticket, Err(LessonError::CollaboratorUnavailable(message)));
        self.emit(effects)
    }

    /// Bytes of the clip named by a `play_audio` effect. Each clip is handed out once.
    pub fn take_audio(&mut self, ticket: Ticket) -> Option<Vec<u8>> {
        self.audio.remove(&ticket).map(|clip| clip.bytes.clone())
    }

    pub fn playback_ended(&mut self, ticket: Ticket) -> String {
        self.audio.remove(&ticket);
        let effects = self.session.playback_ended(ticket);
        self.emit(effects)
    }

    pub fn video_ended(&mut self, ticket: Ticket) -> String {
        let effects = self.session.video_ended(ticket);
        self.emit(effects)
    }

    // --- Rendering ---

    pub fn render_current(&mut self, direction: &str) -> Result<String, JsError> {
        Ok(self
            .session
            .render_current(parse_direction(direction))?
            .into_string())
    }

    pub fn render_chrome(&self) -> Result<String, JsError> {
        Ok(self.session.render_chrome()?.into_string())
    }

    pub fn render_welcome(&self) -> Result<String, JsError> {
        Ok(self.session.render_welcome()?.into_string())
    }

    // --- Editing ---

    /// Opens the editor and returns the form as JSON.
    pub fn begin_edit(&mut self, index: usize) -> Result<String, JsError> {
        let form = self.session.begin_edit(index)?;
        Ok(serde_json::to_string(form)?)
    }

    /// Replaces the open form with the page's current field values.
    pub fn update_form(&mut self, form_json: &str) -> Result<(), JsError> {
        let form: SlideForm = serde_json::from_str(form_json)?;
        let slot = self
            .session
            .editor_form_mut()
            .ok_or_else(|| LessonError::InvalidOperation("no slide is being edited".into()))?;
        *slot = form;
        Ok(())
    }

    pub fn save_edit(&mut self) -> Result<String, JsError> {
        let effects = self.session.save_edit()?;
        Ok(self.emit(effects))
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel_edit();
    }

    pub fn move_slide(&mut self, delta: i32) -> Result<String, JsError> {
        let effects = self.session.move_slide(i64::from(delta))?;
        Ok(self.emit(effects))
    }

    pub fn duplicate_slide(&mut self) -> Result<String, JsError> {
        let effects = self.session.duplicate_slide()?;
        Ok(self.emit(effects))
    }

    pub fn add_slide_after(&mut self, kind: &str) -> Result<String, JsError> {
        let kind = SlideKind::from_tag(kind)
            .ok_or_else(|| LessonError::InvalidInput(format!("unknown slide kind {kind}")))?;
        let effects = self.session.add_slide_after(kind)?;
        Ok(self.emit(effects))
    }

    pub fn request_delete(&mut self) -> Result<String, JsError> {
        let effects = self.session.request_delete()?;
        Ok(self.emit(effects))
    }

    pub fn delete_slide(&mut self) -> Result<String, JsError> {
        let effects = self.session.delete_slide()?;
        Ok(self.emit(effects))
    }

    pub fn undo(&mut self) -> String {
        let effects = self.session.undo();
        self.emit(effects)
    }

    pub fn replace_block_media(
        &mut self,
        slide: usize,
        block: usize,
        uri: String,
    ) -> Result<usize, JsError> {
        Ok(self.session.replace_block_media(slide, block, uri)?)
    }

    pub fn add_image_block(&mut self, slide: usize, uri: String, alt: String) -> Result<usize, JsError> {
        Ok(self.session.add_image_block(slide, uri, alt)?)
    }

    pub fn delete_block_media(&mut self, slide: usize, block: usize) -> Result<(), JsError> {
        Ok(self.session.delete_block_media(slide, block)?)
    }

    /// Request JSON for the rewrite collaborator.
    pub fn request_ai_edit(&mut self, instruction: &str) -> Result<String, JsError> {
        let request = self.session.request_ai_edit(instruction)?;
        Ok(serde_json::to_string(&request)?)
    }

    /// Feeds back a rewrite reply (or `error` when the call failed). Returns the
    /// outcome as JSON; an applied rewrite also carries a readable `review` of
    /// what changed.
    pub fn apply_ai_edit(
        &mut self,
        ticket_json: &str,
        reply_json: Option<String>,
        error: Option<String>,
    ) -> Result<String, JsError> {
        let ticket: AiEditTicket = serde_json::from_str(ticket_json)?;
        let reply = match (reply_json, error) {
            (Some(json), None) => crate::generation::parse_slide_record(&json),
            (_, Some(message)) => Err(LessonError::CollaboratorUnavailable(message)),
            (None, None) => Err(LessonError::MalformedInput("empty rewrite reply".into())),
        };
        let outcome = self.session.apply_ai_edit(ticket, reply);
        let json = serde_json::to_value(&outcome)?;
        #[cfg(feature = "diff")]
        let json = with_review(json, &outcome);
        Ok(json.to_string())
    }

    /// Read-only standalone document of the current lesson.
    pub fn serialize(&self) -> Result<String, JsError> {
        Ok(self.session.serialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> LessonRuntime {
        LessonRuntime::new(
            r#"[{"t": "One"}, {"t": "Q", "type": "quiz", "body": {"options": ["a", "b"], "correct": 1}}]"#,
            "",
            None,
            false,
            false,
        )
        .unwrap_or_else(|_| panic!("lesson should load"))
    }

    #[test]
    fn effects_cross_as_json() {
        let mut rt = runtime();
        let effects: Value = serde_json::from_str(&rt.start(false)).unwrap();
        assert_eq!(effects[0]["effect"], "stop_audio");
        assert!(effects
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["effect"] == "render" && e["index"] == 0));

        rt.next();
        let effects: Value = serde_json::from_str(
            &rt.act(r#"{"action": "select_option", "index": 1}"#)
                .unwrap_or_else(|_| panic!("valid action")),
        )
        .unwrap();
        assert!(effects
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["effect"] == "reward_awarded" && e["total"] == 20));
        assert_eq!(rt.xp(), 20);
    }

    #[test]
    fn audio_is_handed_out_by_ticket() {
        let mut rt = runtime();
        let clip = Rc::new(MediaClip {
            mime: "audio/mpeg".into(),
            bytes: vec![7, 8],
        });
        rt.emit(vec![Effect::PlayAudio {
            ticket: 9,
            slide: 0,
            clip,
        }]);
        assert_eq!(rt.take_audio(9), Some(vec![7, 8]));
        assert_eq!(rt.take_audio(9), None);
    }

    #[test]
    fn stopping_audio_drops_unclaimed_clips() {
        let mut rt = runtime();
        let clip = Rc::new(MediaClip {
            mime: "audio/mpeg".into(),
            bytes: vec![1],
        });
        rt.emit(vec![Effect::PlayAudio {
            ticket: 4,
            slide: 0,
            clip: Rc::clone(&clip),
        }]);
        rt.emit(vec![
            Effect::StopAudio,
            Effect::PlayAudio {
                ticket: 5,
                slide: 1,
                clip,
            },
        ]);
        assert_eq!(rt.audio.len(), 1);
        assert_eq!(rt.take_audio(4), None);
        assert_eq!(rt.take_audio(5), Some(vec![1]));

        // Navigation stops narration.
        rt.emit(vec![Effect::PlayAudio {
            ticket: 6,
            slide: 0,
            clip: Rc::new(MediaClip {
                mime: "audio/mpeg".into(),
                bytes: vec![2],
            }),
        }]);
        rt.start(false);
        assert!(rt.audio.is_empty());
    }

    #[cfg(feature = "diff")]
    #[test]
    fn applied_rewrite_is_returned_with_its_review() {
        let mut rt = LessonRuntime::new(r#"[{"t": "Check"}]"#, "", None, false, true)
            .unwrap_or_else(|_| panic!("lesson should load"));
        rt.begin_edit(0)
            .unwrap_or_else(|_| panic!("editor should open"));
        let request: Value = serde_json::from_str(
            &rt.request_ai_edit("shorter")
                .unwrap_or_else(|_| panic!("rewrite should be requested")),
        )
        .unwrap();
        let outcome: Value = serde_json::from_str(
            &rt.apply_ai_edit(
                &request["ticket"].to_string(),
                Some(r#"{"t": "Quick check"}"#.into()),
                None,
            )
            .unwrap_or_else(|_| panic!("reply should apply")),
        )
        .unwrap();
        assert_eq!(outcome["outcome"], "applied");
        assert!(outcome["review"]
            .as_str()
            .unwrap()
            .contains("Changed Title from 'Check' to 'Quick check'"));
    }
}
