// src/models/raw.rs
//
// Permissive wire records. The generation step is not guaranteed to produce
// well-formed slides, so every field is optional here and resolved through the
// default table below instead of being rejected.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::block::{Block, IconItem, TipStyle};
use crate::models::slide::{
    ChipGroup, CompletionBody, Explanations, MatchPair, MatchingBody, MilestoneBody, OrderingBody,
    PromptBuilderBody, QuizBody, Slide, SlideBody, SlideKind,
};

/// Values used when the payload omits a field.
pub mod defaults {
    pub const CATEGORY: &str = "Lesson";
    pub const NEW_SLIDE_TITLE: &str = "New Slide";
    pub const QUIZ_CORRECT_INDEX: usize = 0;
    pub const ORDERING_INSTRUCTIONS: &str = "Put these in the correct order";
    pub const PROMPT_INSTRUCTIONS: &str = "Build your response";
    pub const PROMPT_PLACEHOLDER: &str = "";
    pub const MILESTONE_EMOJI: &str = "\u{1F389}";
    pub const MILESTONE_MESSAGE: &str = "Great progress! Keep going.";
    pub const COMPLETION_EMOJI: &str = "\u{1F393}";
    pub const COMPLETION_MESSAGE: &str = "You have completed the lesson. Well done!";
    pub const COMPARE_GOOD_LABEL: &str = "Do This";
    pub const COMPARE_BAD_LABEL: &str = "Not This";
}

/// A slide record as it appears on the wire, with every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSlide {
    #[serde(default, alias = "category")]
    cat: Option<String>,
    #[serde(default, alias = "title")]
    t: Option<String>,
    #[serde(default, alias = "subtitle")]
    s: Option<String>,
    #[serde(default, alias = "narr")]
    narration: Option<String>,
    #[serde(default, rename = "type", alias = "kind")]
    kind: Option<String>,
    #[serde(default)]
    body: Value,
    /// Body fields occasionally emitted at the top level of the record.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawSlide> for Slide {
    fn from(raw: RawSlide) -> Self {
        let kind = raw
            .kind
            .as_deref()
            .and_then(SlideKind::from_tag)
            .unwrap_or_default();
        let title = raw.t.unwrap_or_default();
        let body = decode_body(kind, &raw.body, &raw.extra, &title);
        Slide {
            category: raw
                .cat
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| defaults::CATEGORY.to_string()),
            title,
            subtitle: raw.s.unwrap_or_default(),
            narration: raw.narration,
            body,
        }
    }
}

// --- Field lookup helpers ---

/// Finds the first of `names` in the body object, then on the record itself.
fn field<'a>(body: &'a Value, extra: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|n| body.get(*n).filter(|v| !v.is_null()))
        .or_else(|| names.iter().find_map(|n| extra.get(*n).filter(|v| !v.is_null())))
}

/// Renders scalars as text; objects/arrays yield `None`.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_of(value: Option<&Value>) -> String {
    value.and_then(as_text).unwrap_or_default()
}

/// First textual field among `names` on an object value.
fn obj_text(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| value.get(*n).and_then(as_text))
}

fn string_list(value: Option<&Value>, item_keys: &[&str]) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| as_text(item).or_else(|| obj_text(item, item_keys)))
            .collect(),
        _ => Vec::new(),
    }
}

fn index_of(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// --- Body decoding ---

/// Decodes the body of `kind`, filling gaps from [`defaults`].
pub(crate) fn decode_body(
    kind: SlideKind,
    body: &Value,
    extra: &Map<String, Value>,
    title: &str,
) -> SlideBody {
    match kind {
        SlideKind::Content => SlideBody::Content {
            blocks: decode_blocks(body),
        },
        SlideKind::Quiz => SlideBody::Quiz(QuizBody {
            question: field(body, extra, &["question"])
                .and_then(as_text)
                .unwrap_or_else(|| title.to_string()),
            options: string_list(field(body, extra, &["options"]), &["text", "label"]),
            correct_index: index_of(field(
                body,
                extra,
                &["correct", "correctIndex", "correct_index"],
            ))
            .unwrap_or(defaults::QUIZ_CORRECT_INDEX),
            explanations: decode_explanations(body, extra),
        }),
        SlideKind::Matching => SlideBody::Matching(MatchingBody {
            pairs: decode_pairs(field(body, extra, &["pairs"])),
        }),
        SlideKind::Ordering => SlideBody::Ordering(OrderingBody {
            instructions: field(body, extra, &["instructions"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::ORDERING_INSTRUCTIONS.to_string()),
            items: string_list(
                field(body, extra, &["correct_order", "items"]),
                &["text", "label"],
            ),
        }),
        SlideKind::PromptBuilder => SlideBody::PromptBuilder(decode_prompt_builder(body, extra)),
        SlideKind::Milestone => SlideBody::Milestone(MilestoneBody {
            emoji: field(body, extra, &["emoji"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::MILESTONE_EMOJI.to_string()),
            message: field(body, extra, &["message"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::MILESTONE_MESSAGE.to_string()),
        }),
        SlideKind::Completion => SlideBody::Completion(CompletionBody {
            emoji: field(body, extra, &["emoji"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::COMPLETION_EMOJI.to_string()),
            message: field(body, extra, &["message"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::COMPLETION_MESSAGE.to_string()),
            takeaways: string_list(field(body, extra, &["takeaways"]), &["text"]),
            cta: text_of(field(body, extra, &["cta"])),
        }),
    }
}

fn decode_explanations(body: &Value, extra: &Map<String, Value>) -> Explanations {
    match field(body, extra, &["explanations", "explanation"]) {
        Some(Value::Object(obj)) => Explanations {
            correct: text_of(obj.get("correct")),
            wrong: text_of(obj.get("wrong")),
        },
        Some(other) => Explanations {
            correct: as_text(other).unwrap_or_default(),
            wrong: String::new(),
        },
        None => Explanations::default(),
    }
}

fn decode_pairs(value: Option<&Value>) -> Vec<MatchPair> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::Array(pair) => MatchPair {
                left: text_of(pair.first()),
                right: text_of(pair.get(1)),
            },
            other => MatchPair {
                left: obj_text(other, &["left", "term"]).unwrap_or_default(),
                right: obj_text(other, &["right", "def"]).unwrap_or_default(),
            },
        })
        .collect()
}

fn decode_prompt_builder(body: &Value, extra: &Map<String, Value>) -> PromptBuilderBody {
    let placeholder = field(body, extra, &["placeholder"])
        .and_then(as_text)
        .unwrap_or_else(|| defaults::PROMPT_PLACEHOLDER.to_string());
    let chips = field(body, extra, &["chips"]);
    let parts = field(body, extra, &["parts"]);

    let groups = match (chips, parts) {
        (None, Some(Value::Array(parts))) => parts
            .iter()
            .map(|p| ChipGroup {
                label: obj_text(p, &["label", "l"])
                    .unwrap_or_else(|| defaults::PROMPT_INSTRUCTIONS.to_string()),
                chips: string_list(p.get("options").or_else(|| p.get("o")), &["text"]),
            })
            .collect(),
        _ => vec![ChipGroup {
            label: field(body, extra, &["instructions"])
                .and_then(as_text)
                .unwrap_or_else(|| defaults::PROMPT_INSTRUCTIONS.to_string()),
            chips: string_list(chips, &["text"]),
        }],
    };
    PromptBuilderBody {
        groups,
        placeholder,
    }
}

// --- Block decoding ---

/// Accepts `{blocks: [...]}`, a bare array of blocks, or an object whose array
/// values hold blocks.
pub(crate) fn decode_blocks(body: &Value) -> Vec<Block> {
    match body {
        Value::Array(items) => items.iter().filter_map(decode_block).collect(),
        Value::Object(obj) => match obj.get("blocks") {
            Some(Value::Array(items)) => items.iter().filter_map(decode_block).collect(),
            _ => obj
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(decode_block)
                .collect(),
        },
        _ => Vec::new(),
    }
}

/// Decodes one block. Returns `None` only for nulls.
pub(crate) fn decode_block(value: &Value) -> Option<Block> {
    let obj = match value {
        Value::Null => return None,
        Value::String(s) => return Some(Block::Text { html: s.clone() }),
        Value::Object(obj) => obj,
        other => return Some(Block::Other(other.clone())),
    };
    let kind = obj_text(value, &["kind", "type"]).unwrap_or_default();
    let text = |names: &[&str]| obj_text(value, names).unwrap_or_default();

    let block = match kind.as_str() {
        "text" => Block::Text {
            html: text(&["html", "text", "content"]),
        },
        "bullets" => Block::Bullets {
            items: string_list(obj.get("items"), &["text", "label"]),
        },
        "icons" => Block::Icons {
            items: match obj.get("items") {
                Some(Value::Array(items)) => items.iter().map(decode_icon).collect(),
                _ => Vec::new(),
            },
        },
        "steps" => Block::Steps {
            items: string_list(obj.get("items"), &["text", "label"]),
        },
        "tip" | "info" => Block::Tip {
            label: obj_text(value, &["label"]),
            text: text(&["text", "content"]),
            style: TipStyle::from_tag(&text(&["style"])),
            icon: obj_text(value, &["icon", "emoji"]),
        },
        "table" => Block::Table {
            headers: string_list(obj.get("headers"), &["text"]),
            rows: match obj.get("rows") {
                Some(Value::Array(rows)) => rows
                    .iter()
                    .map(|row| string_list(Some(row), &["text"]))
                    .collect(),
                _ => Vec::new(),
            },
        },
        "code" => Block::Code {
            text: text(&["code", "text", "content"]),
        },
        "compare" => decode_compare(value),
        "image" => Block::Image {
            media_index: index_of(
                ["image_idx", "mediaIndex", "media_index"]
                    .iter()
                    .find_map(|k| obj.get(*k)),
            ),
            alt: text(&["alt", "caption"]),
        },
        "heading" => Block::Heading {
            text: text(&["text", "content"]),
        },
        "divider" => Block::Divider,
        _ => match obj_text(value, &["text", "content"]) {
            Some(html) => Block::Text { html },
            None => Block::Other(value.clone()),
        },
    };
    Some(block)
}

fn decode_icon(item: &Value) -> IconItem {
    match as_text(item) {
        Some(label) => IconItem {
            icon: String::new(),
            label,
            desc: String::new(),
        },
        None => IconItem {
            icon: obj_text(item, &["icon", "emoji"]).unwrap_or_default(),
            label: obj_text(item, &["label", "text"]).unwrap_or_default(),
            desc: obj_text(item, &["desc", "description"]).unwrap_or_default(),
        },
    }
}

fn decode_compare(value: &Value) -> Block {
    let good_label = obj_text(value, &["good_label"]);
    let bad_label = obj_text(value, &["bad_label"]);
    if value.get("good").is_some() || value.get("bad").is_some() {
        return Block::Compare {
            good_label: good_label.unwrap_or_else(|| defaults::COMPARE_GOOD_LABEL.to_string()),
            good: obj_text(value, &["good"]).unwrap_or_default(),
            bad_label: bad_label.unwrap_or_else(|| defaults::COMPARE_BAD_LABEL.to_string()),
            bad: obj_text(value, &["bad"]).unwrap_or_default(),
        };
    }

    // Item form: pick the first green side and the first other side.
    let items = value
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let side = |green: bool| {
        items.iter().find(|item| {
            (obj_text(item, &["color"]).as_deref() == Some("green")) == green
        })
    };
    let label_and_text = |item: Option<&Value>, default_label: &str| {
        let label = item
            .and_then(|i| obj_text(i, &["label"]))
            .unwrap_or_else(|| default_label.to_string());
        let text = item
            .and_then(|i| obj_text(i, &["text", "content"]))
            .unwrap_or_default();
        (label, text)
    };
    let (good_label, good) = label_and_text(side(true), defaults::COMPARE_GOOD_LABEL);
    let (bad_label, bad) = label_and_text(side(false), defaults::COMPARE_BAD_LABEL);
    Block::Compare {
        good_label,
        good,
        bad_label,
        bad,
    }
}
