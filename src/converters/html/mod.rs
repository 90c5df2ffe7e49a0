//! Converts lesson state into HTML fragments.
//!
//! Rendering is a pure function of the lesson, the media table and the current
//! widget engine state. Applying a fragment to a display surface is the host's job.
//!
//! # Current Features & Limitations:
//! *   Content blocks, including images and inline video players (videos last).
//! *   Quiz, matching, ordering and prompt-builder widgets with `data-action` hooks.
//! *   Milestone and completion screens; completion shows the XP total.
//! *   Lesson chrome (header, progress, drawer, footer) and the welcome screen.
//! *   No styling; class names only.

mod blocks;
mod chrome;
pub mod utils;
mod widgets;

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

pub use blocks::{render_block, render_blocks};
pub use chrome::ChromeState;

use crate::errors::Result;
use crate::models::lesson::Lesson;
use crate::models::media::MediaTable;
use crate::models::slide::{Slide, SlideBody};
use crate::widgets::{MatchingEngine, OrderingEngine, PromptBuilderEngine, QuizEngine, Widget};
use utils::{escape_html_text, escape_multiline};

/// A rendered piece of HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Fragment(html.into())
    }

    pub fn empty() -> Self {
        Fragment(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry animation direction for a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Per-render inputs beyond the slide itself.
#[derive(Debug, Clone, Copy)]
pub struct SlideContext<'a> {
    pub media: &'a MediaTable,
    /// Live engine for interactive slides. Without one, widgets render in their
    /// initial, unshuffled state.
    pub widget: Option<&'a Widget>,
    /// Session XP total, shown on the completion screen.
    pub xp: u32,
}

/// Renders one slide: the title block followed by the kind-specific body.
pub fn render_slide(
    slide: &Slide,
    index: usize,
    direction: Direction,
    ctx: SlideContext<'_>,
) -> Result<Fragment> {
    let body = render_slide_body(slide, ctx)?;
    wrap_slide(slide, index, direction, &body)
}

/// Wraps an already rendered body in the slide section and title block.
pub fn wrap_slide(
    slide: &Slide,
    index: usize,
    direction: Direction,
    body: &Fragment,
) -> Result<Fragment> {
    let mut out = String::new();
    write!(
        out,
        r#"<section class="slide slide-{}" data-slide="{index}" data-direction="{}">"#,
        slide.kind().as_str(),
        direction.as_str()
    )?;
    write_slide_heading(&mut out, slide)?;
    out.push_str(body.as_str());
    out.push_str("</section>");
    Ok(Fragment(out))
}

/// Renders only the kind-specific body of `slide`.
pub fn render_slide_body(slide: &Slide, ctx: SlideContext<'_>) -> Result<Fragment> {
    let mut out = String::new();
    match (&slide.body, ctx.widget) {
        (SlideBody::Content { blocks }, _) => {
            out.push_str(r#"<div class="slide-body">"#);
            out.push_str(render_blocks(blocks, ctx.media).as_str());
            out.push_str("</div>");
        }
        (SlideBody::Quiz(body), Some(Widget::Quiz(engine))) => {
            widgets::write_quiz(&mut out, body, engine)?
        }
        (SlideBody::Quiz(body), _) => widgets::write_quiz(
            &mut out,
            body,
            &QuizEngine::new(body.options.len(), body.correct_index, 0),
        )?,
        (SlideBody::Matching(body), Some(Widget::Matching(engine))) => {
            widgets::write_matching(&mut out, body, engine)?
        }
        (SlideBody::Matching(body), _) => widgets::write_matching(
            &mut out,
            body,
            &MatchingEngine::with_right_order((0..body.pairs.len()).collect(), 0),
        )?,
        (SlideBody::Ordering(body), Some(Widget::Ordering(engine))) => {
            widgets::write_ordering(&mut out, body, engine)?
        }
        (SlideBody::Ordering(body), _) => widgets::write_ordering(
            &mut out,
            body,
            &OrderingEngine::with_order((0..body.items.len()).collect(), 0),
        )?,
        (SlideBody::PromptBuilder(body), Some(Widget::PromptBuilder(engine))) => {
            widgets::write_prompt_builder(&mut out, body, engine)?
        }
        (SlideBody::PromptBuilder(body), _) => widgets::write_prompt_builder(
            &mut out,
            body,
            &PromptBuilderEngine::new(body.groups.iter().map(|g| g.chips.len()).collect()),
        )?,
        (SlideBody::Milestone(body), _) => write!(
            out,
            r#"<div class="milestone"><div class="milestone-emoji">{}</div><p class="milestone-message">{}</p></div>"#,
            escape_html_text(&body.emoji),
            escape_multiline(&body.message)
        )?,
        (SlideBody::Completion(body), _) => {
            write!(
                out,
                r#"<div class="completion"><div class="completion-emoji">{}</div><p class="completion-message">{}</p><p class="xp-total">{} XP earned</p>"#,
                escape_html_text(&body.emoji),
                escape_multiline(&body.message),
                ctx.xp
            )?;
            if !body.takeaways.is_empty() {
                out.push_str(r#"<ul class="takeaways">"#);
                for takeaway in &body.takeaways {
                    write!(out, "<li>{}</li>", escape_html_text(takeaway))?;
                }
                out.push_str("</ul>");
            }
            if !body.cta.is_empty() {
                write!(
                    out,
                    r#"<p class="completion-cta">{}</p>"#,
                    escape_html_text(&body.cta)
                )?;
            }
            out.push_str("</div>");
        }
    }
    Ok(Fragment(out))
}

fn write_slide_heading(out: &mut String, slide: &Slide) -> fmt::Result {
    write!(
        out,
        r#"<div class="slide-heading"><span class="slide-category">{}</span><h2 class="slide-title">{}</h2>"#,
        escape_html_text(&slide.category),
        escape_html_text(&slide.title)
    )?;
    if !slide.subtitle.is_empty() {
        write!(
            out,
            r#"<p class="slide-subtitle">{}</p>"#,
            escape_html_text(&slide.subtitle)
        )?;
    }
    out.push_str("</div>");
    Ok(())
}

/// Header, progress bar, drawer and footer for the current position.
pub fn render_chrome(lesson: &Lesson, state: ChromeState) -> Result<Fragment> {
    let mut out = String::new();
    chrome::write_header(&mut out, lesson, state)?;
    chrome::write_progress(&mut out, lesson, state.current)?;
    chrome::write_drawer(&mut out, lesson, state.current)?;
    chrome::write_footer(&mut out, lesson, state.current)?;
    Ok(Fragment(out))
}

/// The welcome screen shown before the first slide.
pub fn render_welcome(lesson: &Lesson) -> Result<Fragment> {
    let mut out = String::new();
    chrome::write_welcome(&mut out, lesson)?;
    Ok(Fragment(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn lesson() -> Lesson {
        Lesson::load(
            None,
            &json!([
                { "cat": "Basics", "t": "Intro", "s": "Start here", "type": "content",
                  "body": { "blocks": [ { "kind": "text", "html": "<p>Hello</p>" } ] } },
                { "cat": "Basics", "t": "Check", "type": "quiz",
                  "body": { "question": "Q", "options": ["A", "B", "C", "D"], "correct": 2 } },
                { "cat": "Wrap", "t": "Done", "type": "completion",
                  "body": { "takeaways": ["one"], "cta": "Go build" } }
            ]),
            &Value::Null,
        )
        .unwrap()
    }

    fn ctx<'a>(media: &'a MediaTable, xp: u32) -> SlideContext<'a> {
        SlideContext {
            media,
            widget: None,
            xp,
        }
    }

    #[test]
    fn slide_section_carries_kind_and_direction() {
        let lesson = lesson();
        let html = render_slide(
            lesson.get(0).unwrap(),
            0,
            Direction::Backward,
            ctx(&lesson.media, 0),
        )
        .unwrap();
        assert!(html
            .as_str()
            .starts_with(r#"<section class="slide slide-content" data-slide="0" data-direction="backward">"#));
        assert!(html.as_str().contains("<p>Hello</p>"));
        assert!(html.as_str().contains("Start here"));
    }

    #[test]
    fn completion_shows_xp_total() {
        let lesson = lesson();
        let html = render_slide_body(lesson.get(2).unwrap(), ctx(&lesson.media, 40)).unwrap();
        assert!(html.as_str().contains("40 XP earned"));
        assert!(html.as_str().contains("<li>one</li>"));
    }

    #[test]
    fn chrome_disables_boundary_buttons() {
        let lesson = lesson();
        let first = render_chrome(
            &lesson,
            ChromeState {
                current: 0,
                xp: 0,
                listening: false,
            },
        )
        .unwrap();
        assert!(first.as_str().contains(r#"data-action="previous" disabled"#));
        assert!(!first.as_str().contains(r#"data-action="next" disabled"#));
        assert!(first.as_str().contains("1/3"));

        let last = render_chrome(
            &lesson,
            ChromeState {
                current: 2,
                xp: 20,
                listening: true,
            },
        )
        .unwrap();
        assert!(last.as_str().contains(r#"data-action="next" disabled"#));
        assert!(last.as_str().contains("20 XP"));
        assert!(last.as_str().contains("listen-toggle active"));
        assert_eq!(last.as_str().matches("drawer-group").count(), 2);
    }

    #[test]
    fn welcome_uses_derived_title() {
        let html = render_welcome(&lesson()).unwrap();
        assert!(html.as_str().contains(r#"<h1 class="welcome-title">Intro</h1>"#));
        assert!(html.as_str().contains("3 slides"));
    }
}
