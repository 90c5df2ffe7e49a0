//! AI-assisted rewriting of the open editor form.
//!
//! The session hands out an [`AiEditRequest`]; the host runs it against the
//! rewrite collaborator and feeds the reply back through
//! [`LessonSession::apply_ai_edit`]. Replies for an editor that has since been
//! closed or reopened are dropped.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form::SlideForm;
use crate::errors::{LessonError, Result};
use crate::models::slide::Slide;
use crate::session::{LessonSession, SlideId};

/// Top-level aliases the collaborator may use, mapped to canonical keys.
const KEY_ALIASES: [(&str, &str); 5] = [
    ("category", "cat"),
    ("title", "t"),
    ("subtitle", "s"),
    ("narr", "narration"),
    ("kind", "type"),
];

/// Identifies the editor opening a rewrite was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiEditTicket {
    pub slide_id: SlideId,
    pub generation: u64,
}

/// Everything the rewrite collaborator needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiEditRequest {
    pub ticket: AiEditTicket,
    /// Wire record of the in-progress form.
    pub snapshot: Value,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AiEditOutcome {
    /// The editor moved on; nothing changed.
    Discarded,
    /// The rewrite failed. The message is also set as the editor notice.
    Failed { message: String },
    /// The form now holds `after`. `before` is the form as it was.
    Applied { before: Slide, after: Slide },
}

impl LessonSession {
    /// Prepares a rewrite of the open form.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` without an open editor, `InvalidInput` for a blank
    /// instruction, `CollaboratorUnavailable` when no rewrite backend is
    /// configured. The last one also sets the editor notice; the form is kept.
    pub fn request_ai_edit(&mut self, instruction: &str) -> Result<AiEditRequest> {
        let configured = self.collaborators.ai_edit;
        let editor = self
            .editor
            .as_mut()
            .ok_or_else(|| LessonError::InvalidOperation("no slide is being edited".into()))?;
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(LessonError::InvalidInput(
                "describe the change you want".into(),
            ));
        }
        if !configured {
            let message = "Set ANTHROPIC_API_KEY to use AI editing".to_string();
            editor.notice = Some(message.clone());
            return Err(LessonError::CollaboratorUnavailable(message));
        }
        editor.notice = None;
        Ok(AiEditRequest {
            ticket: AiEditTicket {
                slide_id: editor.slide_id,
                generation: editor.generation,
            },
            snapshot: editor.form.to_slide_lenient().to_wire(),
            instruction: instruction.to_string(),
        })
    }

    /// Merges a rewrite reply into the open form.
    pub fn apply_ai_edit(&mut self, ticket: AiEditTicket, reply: Result<Value>) -> AiEditOutcome {
        let Some(editor) = self.editor.as_mut() else {
            debug!("Dropping AI edit reply: editor closed");
            return AiEditOutcome::Discarded;
        };
        if editor.slide_id != ticket.slide_id || editor.generation != ticket.generation {
            debug!("Dropping AI edit reply for generation {}", ticket.generation);
            return AiEditOutcome::Discarded;
        }

        let before = editor.form.to_slide_lenient();
        let merged = match reply {
            Ok(value) => merge_slide_record(before.to_wire(), value),
            Err(err) => Err(err),
        };
        match merged.and_then(|value| Ok(Slide::from_wire(&value)?)) {
            Ok(after) => {
                editor.form = SlideForm::from_slide(&after);
                editor.notice = None;
                AiEditOutcome::Applied { before, after }
            }
            Err(err) => {
                warn!("AI edit failed: {err}");
                let message = format!("AI edit failed: {err}");
                editor.notice = Some(message.clone());
                AiEditOutcome::Failed { message }
            }
        }
    }
}

/// Shallow merge of a reply record onto the current one.
///
/// Top-level fields in the reply win; fields it leaves out are kept. Bodies merge
/// key by key when the kind is unchanged and are replaced when it changes.
pub fn merge_slide_record(current: Value, reply: Value) -> Result<Value> {
    let Value::Object(mut base) = current else {
        return Err(LessonError::MalformedInput(
            "current slide record is not an object".into(),
        ));
    };
    let Value::Object(reply) = reply else {
        return Err(LessonError::MalformedInput(
            "rewrite reply is not a JSON object".into(),
        ));
    };
    let reply = canonical_keys(reply);
    let kind_changed = match (base.get("type"), reply.get("type")) {
        (Some(old), Some(new)) => old != new,
        _ => false,
    };

    for (key, value) in reply {
        match value {
            Value::Object(new) if key == "body" && !kind_changed => {
                if let Some(Value::Object(old)) = base.get_mut("body") {
                    old.extend(new);
                } else {
                    base.insert(key, Value::Object(new));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
    Ok(Value::Object(base))
}

fn canonical_keys(record: Map<String, Value>) -> Map<String, Value> {
    record
        .into_iter()
        .map(|(key, value)| {
            let key = KEY_ALIASES
                .iter()
                .find(|(alias, _)| *alias == key)
                .map_or(key, |(_, canonical)| canonical.to_string());
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionSettings;
    use crate::edit::form::BodyForm;
    use crate::models::lesson::Lesson;
    use crate::session::Collaborators;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn session(ai_edit: bool) -> LessonSession {
        let lesson = Lesson::load(
            None,
            &json!([
                { "cat": "Basics", "t": "Check", "type": "quiz", "narration": "Pick one.",
                  "body": { "question": "Which?", "options": ["a", "b"], "correct": 1 } },
                { "t": "Next" }
            ]),
            &Value::Null,
        )
        .unwrap();
        LessonSession::with_rng(
            lesson,
            SessionSettings::default(),
            Collaborators {
                narration: false,
                ai_edit,
            },
            StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn missing_credentials_set_a_notice_and_keep_the_form() {
        let mut s = session(false);
        s.begin_edit(0).unwrap();
        s.editor_form_mut().unwrap().title = "Unsaved".into();

        let err = s.request_ai_edit("make it shorter").unwrap_err();
        assert!(matches!(err, LessonError::CollaboratorUnavailable(_)));
        let editor = s.editor().unwrap();
        assert!(editor.notice.as_deref().unwrap().contains("ANTHROPIC_API_KEY"));
        assert_eq!(editor.form.title, "Unsaved");
    }

    #[test]
    fn reply_merges_without_dropping_unmentioned_fields() {
        let mut s = session(true);
        s.begin_edit(0).unwrap();
        let request = s.request_ai_edit("reword the question").unwrap();
        assert_eq!(request.snapshot["t"], "Check");

        let outcome = s.apply_ai_edit(
            request.ticket,
            Ok(json!({ "title": "Quick check", "body": { "question": "Which one?" } })),
        );
        let AiEditOutcome::Applied { before, after } = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(before.title, "Check");
        assert_eq!(after.title, "Quick check");
        assert_eq!(after.category, "Basics");
        assert_eq!(after.narration.as_deref(), Some("Pick one."));

        let form = &s.editor().unwrap().form;
        assert_eq!(form.title, "Quick check");
        match &form.body {
            BodyForm::Quiz {
                question,
                options,
                correct_index,
                ..
            } => {
                assert_eq!(question, "Which one?");
                assert_eq!(options, "a\nb");
                assert_eq!(*correct_index, 1);
            }
            other => panic!("unexpected body {other:?}"),
        }
        // Nothing is committed until save.
        assert_eq!(s.lesson().get(0).unwrap().title, "Check");
    }

    #[test]
    fn replies_for_a_reopened_editor_are_discarded() {
        let mut s = session(true);
        s.begin_edit(0).unwrap();
        let request = s.request_ai_edit("shorter").unwrap();
        s.cancel_edit();
        assert_eq!(
            s.apply_ai_edit(request.ticket, Ok(json!({ "t": "Late" }))),
            AiEditOutcome::Discarded
        );
        s.begin_edit(0).unwrap();
        assert_eq!(
            s.apply_ai_edit(request.ticket, Ok(json!({ "t": "Late" }))),
            AiEditOutcome::Discarded
        );
        assert_eq!(s.editor().unwrap().form.title, "Check");
    }

    #[test]
    fn failed_reply_keeps_form_and_sets_notice() {
        let mut s = session(true);
        s.begin_edit(0).unwrap();
        let request = s.request_ai_edit("shorter").unwrap();
        let outcome = s.apply_ai_edit(
            request.ticket,
            Err(LessonError::MalformedInput("not json".into())),
        );
        assert!(matches!(outcome, AiEditOutcome::Failed { .. }));
        let editor = s.editor().unwrap();
        assert!(editor.notice.is_some());
        assert_eq!(editor.form.title, "Check");
    }

    #[test]
    fn kind_change_replaces_the_body() {
        let current = json!({ "t": "A", "type": "quiz", "body": { "question": "Q", "options": ["x"] } });
        let merged = merge_slide_record(
            current,
            json!({ "kind": "milestone", "body": { "emoji": "🎉" } }),
        )
        .unwrap();
        assert_eq!(merged["type"], "milestone");
        assert_eq!(merged["body"], json!({ "emoji": "🎉" }));
        assert_eq!(merged["t"], "A");
    }
}
