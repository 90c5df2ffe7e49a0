//! Structured editor forms.
//!
//! Every slide field maps to a plain text field and back:
//! * lists (bullets, steps, options, ordering items, takeaways, chips): one entry per line
//! * icon items: `icon|label|desc` per line
//! * matching pairs: `left|right` per line
//! * table headers: `a | b | c`; table rows: one `|`-separated row per line
//!
//! Inside an entry, `\n` stands for a line break, `\|` for a literal bar and `\\`
//! for a backslash; any other backslash is kept as typed. Blank lines separate
//! nothing and are dropped, so an entry that is empty after trimming does not
//! survive an edit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LessonError, Result};
use crate::models::block::{Block, IconItem, TipStyle};
use crate::models::media::MediaIndex;
use crate::models::slide::{
    ChipGroup, CompletionBody, Explanations, MatchPair, MatchingBody, MilestoneBody, OrderingBody,
    PromptBuilderBody, QuizBody, Slide, SlideBody, SlideKind,
};

// --- Field Codecs ---

/// Escapes one entry for a line field. Bars are escaped only in `|`-separated fields.
fn escape_entry(text: &str, bars: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' if bars => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Splits a line on unescaped `|` into at most `limit` trimmed, unescaped parts.
fn split_entry(line: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('n') => {
                    chars.next();
                    current.push('\n');
                }
                Some(&escaped @ ('\\' | '|')) => {
                    chars.next();
                    current.push(escaped);
                }
                _ => current.push('\\'),
            },
            '|' if parts.len() + 1 < limit => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}

/// Non-blank lines, trimmed, still escaped.
fn raw_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

pub fn lines_to_text(items: &[String]) -> String {
    join_lines(items.iter().map(|i| escape_entry(i, false)))
}

/// Non-blank lines, trimmed and unescaped.
pub fn text_to_lines(text: &str) -> Vec<String> {
    raw_lines(text)
        .filter_map(|line| split_entry(line, 1).pop())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn split_cells(line: &str) -> Vec<String> {
    split_entry(line, usize::MAX)
}

pub fn icons_to_text(items: &[IconItem]) -> String {
    join_lines(items.iter().map(|i| {
        format!(
            "{}|{}|{}",
            escape_entry(&i.icon, true),
            escape_entry(&i.label, true),
            escape_entry(&i.desc, true)
        )
    }))
}

pub fn text_to_icons(text: &str) -> Vec<IconItem> {
    raw_lines(text)
        .map(|line| {
            let mut parts = split_entry(line, 3).into_iter();
            IconItem {
                icon: parts.next().unwrap_or_default(),
                label: parts.next().unwrap_or_default(),
                desc: parts.next().unwrap_or_default(),
            }
        })
        .collect()
}

pub fn pairs_to_text(pairs: &[MatchPair]) -> String {
    join_lines(pairs.iter().map(|p| {
        format!(
            "{}|{}",
            escape_entry(&p.left, true),
            escape_entry(&p.right, true)
        )
    }))
}

/// Parses `left|right` lines. In strict mode a line without `|` is an error;
/// otherwise its right side is left empty.
pub fn text_to_pairs(text: &str, strict: bool) -> Result<Vec<MatchPair>> {
    raw_lines(text)
        .enumerate()
        .map(|(n, line)| {
            let mut parts = split_entry(line, 2).into_iter();
            let left = parts.next().unwrap_or_default();
            match parts.next() {
                Some(right) => Ok(MatchPair { left, right }),
                None if strict => Err(LessonError::InvalidInput(format!(
                    "pair {} must be written as left|right",
                    n + 1
                ))),
                None => Ok(MatchPair {
                    left,
                    right: String::new(),
                }),
            }
        })
        .collect()
}

pub fn row_to_text(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| escape_entry(c, true))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn rows_to_text(rows: &[Vec<String>]) -> String {
    join_lines(rows.iter().map(|r| row_to_text(r)))
}

pub fn text_to_row(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        split_cells(text.trim())
    }
}

pub fn text_to_rows(text: &str) -> Vec<Vec<String>> {
    raw_lines(text).map(split_cells).collect()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- Form Types ---

/// Editable fields of one content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockForm {
    Text { html: String },
    Bullets { items: String },
    Icons { items: String },
    Steps { items: String },
    Tip { label: String, text: String, style: String, icon: String },
    Table { headers: String, rows: String },
    Code { text: String },
    Compare { good_label: String, good: String, bad_label: String, bad: String },
    Image { media_index: Option<MediaIndex>, alt: String },
    Heading { text: String },
    Divider,
    /// Blocks of unknown kinds pass through untouched.
    Other { raw: Value },
}

impl BlockForm {
    pub fn from_block(block: &Block) -> Self {
        match block {
            Block::Text { html } => BlockForm::Text { html: html.clone() },
            Block::Bullets { items } => BlockForm::Bullets {
                items: lines_to_text(items),
            },
            Block::Icons { items } => BlockForm::Icons {
                items: icons_to_text(items),
            },
            Block::Steps { items } => BlockForm::Steps {
                items: lines_to_text(items),
            },
            Block::Tip {
                label,
                text,
                style,
                icon,
            } => BlockForm::Tip {
                label: label.clone().unwrap_or_default(),
                text: text.clone(),
                style: style.as_str().to_string(),
                icon: icon.clone().unwrap_or_default(),
            },
            Block::Table { headers, rows } => BlockForm::Table {
                headers: row_to_text(headers),
                rows: rows_to_text(rows),
            },
            Block::Code { text } => BlockForm::Code { text: text.clone() },
            Block::Compare {
                good_label,
                good,
                bad_label,
                bad,
            } => BlockForm::Compare {
                good_label: good_label.clone(),
                good: good.clone(),
                bad_label: bad_label.clone(),
                bad: bad.clone(),
            },
            Block::Image { media_index, alt } => BlockForm::Image {
                media_index: *media_index,
                alt: alt.clone(),
            },
            Block::Heading { text } => BlockForm::Heading { text: text.clone() },
            Block::Divider => BlockForm::Divider,
            Block::Other(raw) => BlockForm::Other { raw: raw.clone() },
        }
    }

    pub fn to_block(&self) -> Block {
        match self {
            BlockForm::Text { html } => Block::Text { html: html.clone() },
            BlockForm::Bullets { items } => Block::Bullets {
                items: text_to_lines(items),
            },
            BlockForm::Icons { items } => Block::Icons {
                items: text_to_icons(items),
            },
            BlockForm::Steps { items } => Block::Steps {
                items: text_to_lines(items),
            },
            BlockForm::Tip {
                label,
                text,
                style,
                icon,
            } => Block::Tip {
                label: non_empty(label),
                text: text.clone(),
                style: TipStyle::from_tag(style.trim()),
                icon: non_empty(icon),
            },
            BlockForm::Table { headers, rows } => Block::Table {
                headers: text_to_row(headers),
                rows: text_to_rows(rows),
            },
            BlockForm::Code { text } => Block::Code { text: text.clone() },
            BlockForm::Compare {
                good_label,
                good,
                bad_label,
                bad,
            } => Block::Compare {
                good_label: good_label.clone(),
                good: good.clone(),
                bad_label: bad_label.clone(),
                bad: bad.clone(),
            },
            BlockForm::Image { media_index, alt } => Block::Image {
                media_index: *media_index,
                alt: alt.clone(),
            },
            BlockForm::Heading { text } => Block::Heading { text: text.clone() },
            BlockForm::Divider => Block::Divider,
            BlockForm::Other { raw } => Block::Other(raw.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipGroupForm {
    pub label: String,
    pub chips: String,
}

/// Kind-specific editor fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyForm {
    Content {
        blocks: Vec<BlockForm>,
    },
    Quiz {
        question: String,
        options: String,
        correct_index: usize,
        explanation_correct: String,
        explanation_wrong: String,
    },
    Matching {
        pairs: String,
    },
    Ordering {
        instructions: String,
        items: String,
    },
    PromptBuilder {
        groups: Vec<ChipGroupForm>,
        placeholder: String,
    },
    Milestone {
        emoji: String,
        message: String,
    },
    Completion {
        emoji: String,
        message: String,
        takeaways: String,
        cta: String,
    },
}

impl BodyForm {
    pub fn from_body(body: &SlideBody) -> Self {
        match body {
            SlideBody::Content { blocks } => BodyForm::Content {
                blocks: blocks.iter().map(BlockForm::from_block).collect(),
            },
            SlideBody::Quiz(q) => BodyForm::Quiz {
                question: q.question.clone(),
                options: lines_to_text(&q.options),
                correct_index: q.correct_index,
                explanation_correct: q.explanations.correct.clone(),
                explanation_wrong: q.explanations.wrong.clone(),
            },
            SlideBody::Matching(m) => BodyForm::Matching {
                pairs: pairs_to_text(&m.pairs),
            },
            SlideBody::Ordering(o) => BodyForm::Ordering {
                instructions: o.instructions.clone(),
                items: lines_to_text(&o.items),
            },
            SlideBody::PromptBuilder(p) => BodyForm::PromptBuilder {
                groups: p
                    .groups
                    .iter()
                    .map(|g| ChipGroupForm {
                        label: g.label.clone(),
                        chips: lines_to_text(&g.chips),
                    })
                    .collect(),
                placeholder: p.placeholder.clone(),
            },
            SlideBody::Milestone(m) => BodyForm::Milestone {
                emoji: m.emoji.clone(),
                message: m.message.clone(),
            },
            SlideBody::Completion(c) => BodyForm::Completion {
                emoji: c.emoji.clone(),
                message: c.message.clone(),
                takeaways: lines_to_text(&c.takeaways),
                cta: c.cta.clone(),
            },
        }
    }

    pub fn kind(&self) -> SlideKind {
        match self {
            BodyForm::Content { .. } => SlideKind::Content,
            BodyForm::Quiz { .. } => SlideKind::Quiz,
            BodyForm::Matching { .. } => SlideKind::Matching,
            BodyForm::Ordering { .. } => SlideKind::Ordering,
            BodyForm::PromptBuilder { .. } => SlideKind::PromptBuilder,
            BodyForm::Milestone { .. } => SlideKind::Milestone,
            BodyForm::Completion { .. } => SlideKind::Completion,
        }
    }

    fn to_body(&self, strict: bool) -> Result<SlideBody> {
        Ok(match self {
            BodyForm::Content { blocks } => SlideBody::Content {
                blocks: blocks.iter().map(BlockForm::to_block).collect(),
            },
            BodyForm::Quiz {
                question,
                options,
                correct_index,
                explanation_correct,
                explanation_wrong,
            } => {
                let options = text_to_lines(options);
                if strict && !options.is_empty() && *correct_index >= options.len() {
                    return Err(LessonError::InvalidInput(format!(
                        "correct answer {} is out of range for {} options",
                        correct_index + 1,
                        options.len()
                    )));
                }
                SlideBody::Quiz(QuizBody {
                    question: question.clone(),
                    options,
                    correct_index: *correct_index,
                    explanations: Explanations {
                        correct: explanation_correct.clone(),
                        wrong: explanation_wrong.clone(),
                    },
                })
            }
            BodyForm::Matching { pairs } => SlideBody::Matching(MatchingBody {
                pairs: text_to_pairs(pairs, strict)?,
            }),
            BodyForm::Ordering {
                instructions,
                items,
            } => SlideBody::Ordering(OrderingBody {
                instructions: instructions.clone(),
                items: text_to_lines(items),
            }),
            BodyForm::PromptBuilder {
                groups,
                placeholder,
            } => SlideBody::PromptBuilder(PromptBuilderBody {
                groups: groups
                    .iter()
                    .map(|g| ChipGroup {
                        label: g.label.clone(),
                        chips: text_to_lines(&g.chips),
                    })
                    .collect(),
                placeholder: placeholder.clone(),
            }),
            BodyForm::Milestone { emoji, message } => SlideBody::Milestone(MilestoneBody {
                emoji: emoji.clone(),
                message: message.clone(),
            }),
            BodyForm::Completion {
                emoji,
                message,
                takeaways,
                cta,
            } => SlideBody::Completion(CompletionBody {
                emoji: emoji.clone(),
                message: message.clone(),
                takeaways: text_to_lines(takeaways),
                cta: cta.clone(),
            }),
        })
    }
}

/// The whole editor form for one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideForm {
    pub category: String,
    pub title: String,
    pub subtitle: String,
    /// Blank means the narration is derived from title and subtitle.
    pub narration: String,
    pub body: BodyForm,
}

impl SlideForm {
    pub fn from_slide(slide: &Slide) -> Self {
        SlideForm {
            category: slide.category.clone(),
            title: slide.title.clone(),
            subtitle: slide.subtitle.clone(),
            narration: slide.narration.clone().unwrap_or_default(),
            body: BodyForm::from_body(&slide.body),
        }
    }

    pub fn kind(&self) -> SlideKind {
        self.body.kind()
    }

    /// Switches the body to an empty body of `kind`. Common fields are kept.
    pub fn change_kind(&mut self, kind: SlideKind) {
        if kind != self.kind() {
            self.body = BodyForm::from_body(&SlideBody::empty(kind));
        }
    }

    /// Commits the form.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a field cannot be converted. The form itself is untouched.
    pub fn to_slide(&self) -> Result<Slide> {
        self.build(true)
    }

    /// Best-effort conversion that never fails, for snapshots of in-progress edits.
    pub fn to_slide_lenient(&self) -> Slide {
        match self.build(false) {
            Ok(slide) => slide,
            Err(_) => Slide {
                category: self.category.clone(),
                title: self.title.clone(),
                subtitle: self.subtitle.clone(),
                narration: non_empty(&self.narration),
                body: SlideBody::empty(self.kind()),
            },
        }
    }

    fn build(&self, strict: bool) -> Result<Slide> {
        Ok(Slide {
            category: self.category.trim().to_string(),
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            narration: non_empty(&self.narration),
            body: self.body.to_body(strict)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slide(value: Value) -> Slide {
        Slide::from_wire(&value).unwrap()
    }

    #[test]
    fn content_fields_round_trip() {
        let original = slide(json!({
            "cat": "Tools", "t": "Kit", "s": "What to use", "narration": "Say this.",
            "body": { "blocks": [
                { "kind": "bullets", "items": ["one", "two"] },
                { "kind": "icons", "items": [{ "icon": "*", "label": "Star", "desc": "Shiny" }] },
                { "kind": "table", "headers": ["a", "b"], "rows": [["1", "2"], ["3", "4"]] },
                { "kind": "tip", "text": "Careful", "style": "yellow" },
                { "kind": "image", "image_idx": 2, "alt": "pic" },
                { "kind": "poll", "question": "?" }
            ] }
        }));
        let form = SlideForm::from_slide(&original);
        let BodyForm::Content { blocks } = &form.body else {
            panic!("expected content form");
        };
        assert_eq!(blocks[0], BlockForm::Bullets { items: "one\ntwo".into() });
        assert_eq!(blocks[1], BlockForm::Icons { items: "*|Star|Shiny".into() });
        assert_eq!(
            blocks[2],
            BlockForm::Table {
                headers: "a | b".into(),
                rows: "1 | 2\n3 | 4".into()
            }
        );
        assert_eq!(form.to_slide().unwrap(), original);
    }

    #[test]
    fn delimiters_inside_entries_survive_the_form() {
        let original = slide(json!({
            "t": "Shell",
            "body": { "blocks": [
                { "kind": "bullets", "items": ["cat a | grep b", "line one\nline two", r"C:\temp"] },
                { "kind": "icons", "items": [{ "icon": "|", "label": "Pipe", "desc": "a|b" }] },
                { "kind": "table", "headers": ["x|y", "z"], "rows": [["1\n2", r"\|"]] }
            ] }
        }));
        let form = SlideForm::from_slide(&original);
        let BodyForm::Content { blocks } = &form.body else {
            panic!("expected content form");
        };
        assert_eq!(
            blocks[0],
            BlockForm::Bullets {
                items: r"cat a | grep b
line one\nline two
C:\\temp".into()
            }
        );
        assert_eq!(blocks[1], BlockForm::Icons { items: r"\||Pipe|a\|b".into() });
        assert_eq!(form.to_slide().unwrap(), original);

        let matching = slide(json!({
            "type": "matching", "body": { "pairs": [["a|b", "c\nd"]] }
        }));
        assert_eq!(SlideForm::from_slide(&matching).to_slide().unwrap(), matching);
    }

    #[test]
    fn typed_backslashes_are_kept_and_blank_entries_dropped() {
        assert_eq!(text_to_lines(r"C:\path"), vec![r"C:\path".to_string()]);
        assert_eq!(text_to_lines("a\n\n  \nb"), vec!["a", "b"]);
        assert_eq!(lines_to_text(&["a".into(), String::new(), "b".into()]), "a\n\nb");
        assert_eq!(text_to_row(r"a \| b | c"), vec!["a | b", "c"]);
    }

    #[test]
    fn every_kind_round_trips_through_its_form() {
        for kind in SlideKind::ALL {
            let original = Slide::blank(kind);
            assert_eq!(SlideForm::from_slide(&original).to_slide().unwrap(), original);
        }
        let quiz = slide(json!({
            "type": "quiz", "t": "Q",
            "body": { "question": "Which?", "options": ["a", "b", "c", "d"], "correct": 3,
                      "explanations": { "correct": "yes", "wrong": "no" } }
        }));
        assert_eq!(SlideForm::from_slide(&quiz).to_slide().unwrap(), quiz);
        let matching = slide(json!({
            "type": "matching",
            "body": { "pairs": [["cat", "meow"], { "term": "dog", "def": "woof" }] }
        }));
        assert_eq!(SlideForm::from_slide(&matching).to_slide().unwrap(), matching);
    }

    #[test]
    fn invalid_fields_fail_strictly_but_not_leniently() {
        let mut form = SlideForm::from_slide(&Slide::blank(SlideKind::Matching));
        form.body = BodyForm::Matching {
            pairs: "cat|meow\ndog".into(),
        };
        let before = form.clone();
        assert!(matches!(form.to_slide(), Err(LessonError::InvalidInput(_))));
        assert_eq!(form, before);

        let lenient = form.to_slide_lenient();
        let SlideBody::Matching(body) = lenient.body else {
            panic!("expected matching body");
        };
        assert_eq!(body.pairs[1].left, "dog");
        assert_eq!(body.pairs[1].right, "");

        let mut quiz = SlideForm::from_slide(&Slide::blank(SlideKind::Quiz));
        quiz.body = BodyForm::Quiz {
            question: "Q".into(),
            options: "a\nb".into(),
            correct_index: 2,
            explanation_correct: String::new(),
            explanation_wrong: String::new(),
        };
        assert!(matches!(quiz.to_slide(), Err(LessonError::InvalidInput(_))));
    }

    #[test]
    fn changing_kind_keeps_common_fields() {
        let mut form = SlideForm::from_slide(&Slide::blank(SlideKind::Content));
        form.title = "Kept".into();
        form.change_kind(SlideKind::Ordering);
        assert_eq!(form.kind(), SlideKind::Ordering);
        assert_eq!(form.to_slide().unwrap().title, "Kept");
    }

    #[test]
    fn blank_narration_means_derived() {
        let mut form = SlideForm::from_slide(&Slide::blank(SlideKind::Content));
        form.narration = "   ".into();
        assert_eq!(form.to_slide().unwrap().narration, None);
    }
}
