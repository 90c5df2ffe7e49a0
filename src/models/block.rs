// src/models/block.rs

use serde_json::{json, Value};

use crate::models::media::{MediaIndex, MediaTable};

/// Visual tone of a tip/info block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TipStyle {
    #[default]
    Blue,
    Green,
    Yellow,
}

impl TipStyle {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "green" => TipStyle::Green,
            "yellow" => TipStyle::Yellow,
            _ => TipStyle::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TipStyle::Blue => "blue",
            TipStyle::Green => "green",
            TipStyle::Yellow => "yellow",
        }
    }
}

/// One row of an `icons` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconItem {
    pub icon: String,
    pub label: String,
    pub desc: String,
}

/// One visual content unit inside a content slide.
///
/// Text-bearing fields hold inline HTML as produced by the generation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text {
        html: String,
    },
    Bullets {
        items: Vec<String>,
    },
    Icons {
        items: Vec<IconItem>,
    },
    Steps {
        items: Vec<String>,
    },
    Tip {
        label: Option<String>,
        text: String,
        style: TipStyle,
        icon: Option<String>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Code {
        text: String,
    },
    Compare {
        good_label: String,
        good: String,
        bad_label: String,
        bad: String,
    },
    Image {
        media_index: Option<MediaIndex>,
        alt: String,
    },
    Heading {
        text: String,
    },
    Divider,
    /// A block of a kind this runtime does not know. Kept verbatim so it survives
    /// a load/serialize cycle; renders as nothing.
    Other(Value),
}

/// The tag of a [`Block`], used by editors to pick a field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Bullets,
    Icons,
    Steps,
    Tip,
    Table,
    Code,
    Compare,
    Image,
    Heading,
    Divider,
    Other,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Text { .. } => BlockKind::Text,
            Block::Bullets { .. } => BlockKind::Bullets,
            Block::Icons { .. } => BlockKind::Icons,
            Block::Steps { .. } => BlockKind::Steps,
            Block::Tip { .. } => BlockKind::Tip,
            Block::Table { .. } => BlockKind::Table,
            Block::Code { .. } => BlockKind::Code,
            Block::Compare { .. } => BlockKind::Compare,
            Block::Image { .. } => BlockKind::Image,
            Block::Heading { .. } => BlockKind::Heading,
            Block::Divider => BlockKind::Divider,
            Block::Other(_) => BlockKind::Other,
        }
    }

    /// Media index of an image block, if it has one.
    pub fn media_index(&self) -> Option<MediaIndex> {
        match self {
            Block::Image { media_index, .. } => *media_index,
            _ => None,
        }
    }

    /// True for image blocks whose media resolves to a `video/` entry.
    pub fn is_video(&self, media: &MediaTable) -> bool {
        self.media_index().is_some_and(|i| media.is_video(i))
    }

    /// Canonical wire representation (`{"kind": ..., ...}`).
    pub fn to_wire(&self) -> Value {
        match self {
            Block::Text { html } => json!({ "kind": "text", "html": html }),
            Block::Bullets { items } => json!({ "kind": "bullets", "items": items }),
            Block::Icons { items } => {
                let items: Vec<Value> = items
                    .iter()
                    .map(|i| json!({ "icon": i.icon, "label": i.label, "desc": i.desc }))
                    .collect();
                json!({ "kind": "icons", "items": items })
            }
            Block::Steps { items } => {
                let items: Vec<Value> = items.iter().map(|t| json!({ "text": t })).collect();
                json!({ "kind": "steps", "items": items })
            }
            Block::Tip {
                label,
                text,
                style,
                icon,
            } => {
                let mut value = json!({ "kind": "tip", "text": text });
                if let Some(label) = label {
                    value["label"] = json!(label);
                }
                if *style != TipStyle::Blue {
                    value["style"] = json!(style.as_str());
                }
                if let Some(icon) = icon {
                    value["icon"] = json!(icon);
                }
                value
            }
            Block::Table { headers, rows } => {
                json!({ "kind": "table", "headers": headers, "rows": rows })
            }
            Block::Code { text } => json!({ "kind": "code", "text": text }),
            Block::Compare {
                good_label,
                good,
                bad_label,
                bad,
            } => json!({
                "kind": "compare",
                "good_label": good_label,
                "good": good,
                "bad_label": bad_label,
                "bad": bad,
            }),
            Block::Image { media_index, alt } => {
                let mut value = json!({ "kind": "image", "alt": alt });
                if let Some(index) = media_index {
                    value["image_idx"] = json!(index);
                }
                value
            }
            Block::Heading { text } => json!({ "kind": "heading", "text": text }),
            Block::Divider => json!({ "kind": "divider" }),
            Block::Other(raw) => raw.clone(),
        }
    }

    /// Plain text carried by the block, for outlines and narration hints.
    pub fn plain_text(&self) -> Vec<String> {
        match self {
            Block::Text { html } => vec![html.clone()],
            Block::Bullets { items } | Block::Steps { items } => items.clone(),
            Block::Icons { items } => items
                .iter()
                .map(|i| {
                    if i.desc.is_empty() {
                        i.label.clone()
                    } else {
                        format!("{}: {}", i.label, i.desc)
                    }
                })
                .collect(),
            Block::Tip { text, .. } | Block::Code { text } | Block::Heading { text } => {
                vec![text.clone()]
            }
            Block::Table { headers, rows } => std::iter::once(headers)
                .chain(rows.iter())
                .filter(|r| !r.is_empty())
                .map(|r| r.join(" | "))
                .collect(),
            Block::Compare {
                good_label,
                good,
                bad_label,
                bad,
            } => vec![format!("{good_label}: {good}"), format!("{bad_label}: {bad}")],
            Block::Image { alt, .. } if !alt.is_empty() => vec![alt.clone()],
            Block::Image { .. } | Block::Divider | Block::Other(_) => Vec::new(),
        }
    }
}
