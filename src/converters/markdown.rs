//! Exports a lesson as a Markdown outline for review: titles, narration and the
//! text carried by each slide body.

use crate::models::{
    block::Block,
    lesson::Lesson,
    slide::{Slide, SlideBody},
};
use std::fmt::Write;

use crate::errors::Result;

// --- Body Text Extraction ---

/// Markdown lines for one content block. Dividers and media-only blocks give none.
fn extract_text_from_block(block: &Block) -> Vec<String> {
    match block {
        Block::Heading { text } => vec![format!("#### {text}")],
        Block::Bullets { items } => items.iter().map(|i| format!("- {i}")).collect(),
        Block::Steps { items } => items
            .iter()
            .enumerate()
            .map(|(n, i)| format!("{}. {i}", n + 1))
            .collect(),
        Block::Code { text } => vec![format!("```\n{text}\n```")],
        Block::Image { alt, .. } if !alt.is_empty() => vec![format!("_[media: {alt}]_")],
        Block::Image { .. } | Block::Divider | Block::Other(_) => Vec::new(),
        other => other.plain_text(),
    }
}

/// Extracts the body text of a slide as Markdown lines.
fn extract_text_from_body(slide: &Slide) -> Vec<String> {
    match &slide.body {
        SlideBody::Content { blocks } => blocks.iter().flat_map(extract_text_from_block).collect(),
        SlideBody::Quiz(q) => {
            let mut lines = vec![format!("**Q:** {}", q.question)];
            for (i, option) in q.options.iter().enumerate() {
                let mark = if i == q.correct_index { "x" } else { " " };
                lines.push(format!("- [{mark}] {option}"));
            }
            let explanation = q.explanations.combined();
            if !explanation.is_empty() {
                lines.push(format!("> {explanation}"));
            }
            lines
        }
        SlideBody::Matching(m) => m
            .pairs
            .iter()
            .map(|p| format!("- {} => {}", p.left, p.right))
            .collect(),
        SlideBody::Ordering(o) => std::iter::once(o.instructions.clone())
            .chain(o.items.iter().enumerate().map(|(n, i)| format!("{}. {i}", n + 1)))
            .collect(),
        SlideBody::PromptBuilder(p) => p
            .groups
            .iter()
            .map(|g| format!("{}: {}", g.label, g.chips.join(" / ")))
            .collect(),
        SlideBody::Milestone(m) => vec![format!("{} {}", m.emoji, m.message)],
        SlideBody::Completion(c) => std::iter::once(c.message.clone())
            .chain(c.takeaways.iter().map(|t| format!("- {t}")))
            .chain((!c.cta.is_empty()).then(|| format!("**{}**", c.cta)))
            .collect(),
    }
}

// --- Public Interface ---

/// Renders the whole lesson as a Markdown outline.
///
/// # Errors
///
/// Only fails if formatting into the output buffer fails.
pub fn lesson_to_markdown(lesson: &Lesson) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# {}\n", lesson.title)?;

    for (index, slide) in lesson.slides().iter().enumerate() {
        if index > 0 {
            writeln!(out, "\n---\n")?;
        }
        writeln!(
            out,
            "## {}. {} ({}, {})\n",
            index + 1,
            slide.title,
            slide.kind().as_str(),
            slide.category
        )?;
        if !slide.subtitle.is_empty() {
            writeln!(out, "_{}_\n", slide.subtitle)?;
        }
        writeln!(out, "> Narration: {}\n", slide.narration_text(&lesson.media))?;

        let lines = extract_text_from_body(slide);
        if !lines.is_empty() {
            writeln!(out, "{}", lines.join("\n"))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn outline_lists_slides_and_marks_correct_option() {
        let lesson = Lesson::load(
            Some("Deck".into()),
            &json!([
                { "t": "Intro", "s": "Why", "body": [
                    { "kind": "bullets", "items": ["one", "two"] },
                    { "kind": "divider" }
                ] },
                { "t": "Check", "type": "quiz",
                  "body": { "question": "Pick", "options": ["a", "b"], "correct": 1 } }
            ]),
            &Value::Null,
        )
        .unwrap();

        let md = lesson_to_markdown(&lesson).unwrap();
        assert!(md.starts_with("# Deck\n"));
        assert!(md.contains("## 1. Intro (content, Lesson)"));
        assert!(md.contains("> Narration: Intro. Why"));
        assert!(md.contains("- one\n- two"));
        assert!(md.contains("- [ ] a\n- [x] b"));
        assert_eq!(md.matches("\n---\n").count(), 1);
    }
}
