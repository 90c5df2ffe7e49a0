// src/models/slide.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::models::block::Block;
use crate::models::media::{MediaIndex, MediaTable};
use crate::models::raw::{self, RawSlide};

/// The slide kind. Determines which renderer or widget engine handles the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    #[default]
    Content,
    Quiz,
    Matching,
    Ordering,
    PromptBuilder,
    Milestone,
    Completion,
}

impl SlideKind {
    pub const ALL: [SlideKind; 7] = [
        SlideKind::Content,
        SlideKind::Quiz,
        SlideKind::Matching,
        SlideKind::Ordering,
        SlideKind::PromptBuilder,
        SlideKind::Milestone,
        SlideKind::Completion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlideKind::Content => "content",
            SlideKind::Quiz => "quiz",
            SlideKind::Matching => "matching",
            SlideKind::Ordering => "ordering",
            SlideKind::PromptBuilder => "prompt_builder",
            SlideKind::Milestone => "milestone",
            SlideKind::Completion => "completion",
        }
    }

    /// Parses a wire tag. Unknown tags yield `None`; callers fall back to `Content`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    /// Slides that host a widget engine and wait for the learner.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            SlideKind::Quiz | SlideKind::Matching | SlideKind::Ordering | SlideKind::PromptBuilder
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Explanations {
    pub correct: String,
    pub wrong: String,
}

impl Explanations {
    /// Text shown after answering: both halves, separated by a space.
    pub fn combined(&self) -> String {
        match (self.correct.is_empty(), self.wrong.is_empty()) {
            (false, false) => format!("{} {}", self.correct, self.wrong),
            (false, true) => self.correct.clone(),
            (true, _) => self.wrong.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizBody {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanations: Explanations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchingBody {
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingBody {
    pub instructions: String,
    /// Steps in their correct order.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipGroup {
    pub label: String,
    pub chips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptBuilderBody {
    /// One selection slot per group. Generated lessons normally carry exactly one.
    pub groups: Vec<ChipGroup>,
    pub placeholder: String,
}

impl PromptBuilderBody {
    pub fn instructions(&self) -> &str {
        self.groups.first().map(|g| g.label.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneBody {
    pub emoji: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionBody {
    pub emoji: String,
    pub message: String,
    pub takeaways: Vec<String>,
    pub cta: String,
}

/// Kind-specific slide payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBody {
    Content { blocks: Vec<Block> },
    Quiz(QuizBody),
    Matching(MatchingBody),
    Ordering(OrderingBody),
    PromptBuilder(PromptBuilderBody),
    Milestone(MilestoneBody),
    Completion(CompletionBody),
}

impl SlideBody {
    pub fn kind(&self) -> SlideKind {
        match self {
            SlideBody::Content { .. } => SlideKind::Content,
            SlideBody::Quiz(_) => SlideKind::Quiz,
            SlideBody::Matching(_) => SlideKind::Matching,
            SlideBody::Ordering(_) => SlideKind::Ordering,
            SlideBody::PromptBuilder(_) => SlideKind::PromptBuilder,
            SlideBody::Milestone(_) => SlideKind::Milestone,
            SlideBody::Completion(_) => SlideKind::Completion,
        }
    }

    /// The empty body of `kind`, filled from the default table.
    pub fn empty(kind: SlideKind) -> Self {
        raw::decode_body(kind, &Value::Null, &serde_json::Map::new(), "")
    }

    pub fn to_wire(&self) -> Value {
        match self {
            SlideBody::Content { blocks } => {
                let blocks: Vec<Value> = blocks.iter().map(Block::to_wire).collect();
                json!({ "blocks": blocks })
            }
            SlideBody::Quiz(q) => json!({
                "question": q.question,
                "options": q.options,
                "correct": q.correct_index,
                "explanations": { "correct": q.explanations.correct, "wrong": q.explanations.wrong },
            }),
            SlideBody::Matching(m) => {
                let pairs: Vec<Value> = m
                    .pairs
                    .iter()
                    .map(|p| json!({ "left": p.left, "right": p.right }))
                    .collect();
                json!({ "pairs": pairs })
            }
            SlideBody::Ordering(o) => json!({
                "instructions": o.instructions,
                "correct_order": o.items,
            }),
            SlideBody::PromptBuilder(p) => match p.groups.as_slice() {
                [only] => json!({
                    "instructions": only.label,
                    "chips": only.chips,
                    "placeholder": p.placeholder,
                }),
                groups => {
                    let parts: Vec<Value> = groups
                        .iter()
                        .map(|g| json!({ "label": g.label, "options": g.chips }))
                        .collect();
                    json!({ "parts": parts, "placeholder": p.placeholder })
                }
            },
            SlideBody::Milestone(m) => json!({ "emoji": m.emoji, "message": m.message }),
            SlideBody::Completion(c) => json!({
                "emoji": c.emoji,
                "message": c.message,
                "takeaways": c.takeaways,
                "cta": c.cta,
            }),
        }
    }
}

/// Sentence appended to narration when a slide hands off to a video.
pub const VIDEO_CUE: &str = "Let's watch the video below.";

/// One addressable unit of lesson content.
///
/// (De)serializes through the permissive wire record in [`crate::models::raw`]:
/// missing fields are defaulted, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub category: String,
    pub title: String,
    pub subtitle: String,
    /// Explicit narration. `None` means "derive from title and subtitle".
    pub narration: Option<String>,
    pub body: SlideBody,
}

impl Slide {
    /// A fresh slide of `kind` with default copy, used by "add slide".
    pub fn blank(kind: SlideKind) -> Self {
        Slide {
            category: raw::defaults::CATEGORY.to_string(),
            title: raw::defaults::NEW_SLIDE_TITLE.to_string(),
            subtitle: String::new(),
            narration: None,
            body: SlideBody::empty(kind),
        }
    }

    pub fn kind(&self) -> SlideKind {
        self.body.kind()
    }

    pub fn blocks(&self) -> &[Block] {
        match &self.body {
            SlideBody::Content { blocks } => blocks,
            _ => &[],
        }
    }

    /// Explicit narration, else `title + ". " + subtitle`.
    pub fn base_narration(&self) -> String {
        match &self.narration {
            Some(n) if !n.trim().is_empty() => n.clone(),
            _ => format!("{}. {}", self.title, self.subtitle),
        }
    }

    /// First image block whose media is a video.
    pub fn video_media_index(&self, media: &MediaTable) -> Option<MediaIndex> {
        self.blocks()
            .iter()
            .find(|b| b.is_video(media))
            .and_then(Block::media_index)
    }

    pub fn has_video(&self, media: &MediaTable) -> bool {
        self.video_media_index(media).is_some()
    }

    /// Text to speak for this slide. Slides with a video get a cue sentence unless
    /// the narration already mentions watching or the video.
    pub fn narration_text(&self, media: &MediaTable) -> String {
        let text = self.base_narration();
        if !self.has_video(media) {
            return text;
        }
        let lower = text.to_lowercase();
        if lower.contains("watch") || lower.contains("video") {
            return text;
        }
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            VIDEO_CUE.to_string()
        } else if trimmed.ends_with(&['.', '!', '?'][..]) {
            format!("{trimmed} {VIDEO_CUE}")
        } else {
            format!("{trimmed}. {VIDEO_CUE}")
        }
    }

    /// Canonical wire record.
    pub fn to_wire(&self) -> Value {
        let mut value = json!({
            "cat": self.category,
            "t": self.title,
            "s": self.subtitle,
        });
        if let Some(narration) = &self.narration {
            value["narration"] = json!(narration);
        }
        value["type"] = json!(self.kind().as_str());
        value["body"] = self.body.to_wire();
        value
    }

    /// Permissive decode of one wire record.
    pub fn from_wire(value: &Value) -> serde_json::Result<Self> {
        let raw: RawSlide = serde_json::from_value(value.clone())?;
        Ok(raw.into())
    }
}

impl Serialize for Slide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Slide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawSlide::deserialize(deserializer).map(Slide::from)
    }
}
