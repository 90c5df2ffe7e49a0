//! Renders interactive slide bodies from their engine state.
//!
//! Every clickable element carries `data-action` and `data-index` (plus
//! `data-group` for chips). The host turns a click into a
//! [`WidgetAction`](crate::widgets::WidgetAction) and hands it to the session.

use std::fmt::{self, Write};

use super::utils::{escape_html_attr, escape_html_text};
use crate::models::slide::{MatchingBody, OrderingBody, PromptBuilderBody, QuizBody};
use crate::widgets::{MatchingEngine, OrderingEngine, PromptBuilderEngine, QuizEngine, QuizState};

// --- Quiz ---

pub(super) fn write_quiz(out: &mut String, body: &QuizBody, engine: &QuizEngine) -> fmt::Result {
    write!(
        out,
        r#"<div class="quiz" data-widget="quiz"><p class="quiz-question">{}</p><div class="quiz-options">"#,
        escape_html_text(&body.question)
    )?;
    let state = engine.state();
    for (i, option) in body.options.iter().enumerate() {
        let class = match state {
            QuizState::Unanswered => "",
            QuizState::Answered { .. } if i == engine.correct_index() => " correct",
            QuizState::Answered { selected, .. } if i == selected => " wrong",
            QuizState::Answered { .. } => " dimmed",
        };
        let disabled = if engine.is_answered() { " disabled" } else { "" };
        write!(
            out,
            r#"<button class="quiz-option{class}" data-action="select_option" data-index="{i}"{disabled}><span class="option-letter">{}</span>{}</button>"#,
            option_letter(i),
            escape_html_text(option)
        )?;
    }
    out.push_str("</div>");
    if let QuizState::Answered { correct, .. } = state {
        let verdict = if correct { "correct" } else { "wrong" };
        write!(
            out,
            r#"<div class="quiz-explanation {verdict}">{}</div>"#,
            escape_html_text(&body.explanations.combined())
        )?;
    }
    out.push_str("</div>");
    Ok(())
}

fn option_letter(i: usize) -> char {
    u8::try_from(i)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .filter(u8::is_ascii_uppercase)
        .map(char::from)
        .unwrap_or('?')
}

// --- Matching ---

pub(super) fn write_matching(
    out: &mut String,
    body: &MatchingBody,
    engine: &MatchingEngine,
) -> fmt::Result {
    let flash = engine.flash();
    out.push_str(r#"<div class="matching" data-widget="matching"><div class="match-column left">"#);
    for (i, pair) in body.pairs.iter().enumerate() {
        let class = if engine.is_left_matched(i) {
            " matched"
        } else if flash.is_some_and(|f| f.left == i) {
            " wrong"
        } else if engine.selected_left() == Some(i) {
            " selected"
        } else {
            ""
        };
        write!(
            out,
            r#"<button class="match-item{class}" data-action="select_left" data-index="{i}">{}</button>"#,
            escape_html_text(&pair.left)
        )?;
    }
    out.push_str(r#"</div><div class="match-column right">"#);
    for (position, pair_index) in engine.right_order().iter().enumerate() {
        let Some(pair) = body.pairs.get(*pair_index) else {
            continue;
        };
        let class = if engine.is_right_matched(position) {
            " matched"
        } else if flash.is_some_and(|f| f.right_position == position) {
            " wrong"
        } else {
            ""
        };
        write!(
            out,
            r#"<button class="match-item{class}" data-action="select_right" data-index="{position}">{}</button>"#,
            escape_html_text(&pair.right)
        )?;
    }
    out.push_str("</div>");
    if engine.is_complete() {
        out.push_str(r#"<div class="widget-done">All pairs matched!</div>"#);
    }
    out.push_str("</div>");
    Ok(())
}

// --- Ordering ---

pub(super) fn write_ordering(
    out: &mut String,
    body: &OrderingBody,
    engine: &OrderingEngine,
) -> fmt::Result {
    write!(
        out,
        r#"<div class="ordering" data-widget="ordering"><p class="ordering-instructions">{}</p><ol class="ordering-list">"#,
        escape_html_text(&body.instructions)
    )?;
    for (position, item_index) in engine.current().iter().enumerate() {
        let Some(item) = body.items.get(*item_index) else {
            continue;
        };
        let class = if engine.is_solved() {
            " solved"
        } else if engine.selected() == Some(position) {
            " selected"
        } else {
            ""
        };
        write!(
            out,
            r#"<li><button class="ordering-item{class}" data-action="select_position" data-index="{position}">{}</button></li>"#,
            escape_html_text(item)
        )?;
    }
    out.push_str("</ol>");
    if engine.is_solved() {
        out.push_str(r#"<div class="widget-done">Correct order!</div>"#);
    } else {
        out.push_str(r#"<button class="ordering-check" data-action="check_order">Check order</button>"#);
    }
    out.push_str("</div>");
    Ok(())
}

// --- Prompt Builder ---

pub(super) fn write_prompt_builder(
    out: &mut String,
    body: &PromptBuilderBody,
    engine: &PromptBuilderEngine,
) -> fmt::Result {
    out.push_str(r#"<div class="prompt-builder" data-widget="prompt_builder">"#);
    for (g, group) in body.groups.iter().enumerate() {
        write!(
            out,
            r#"<div class="prompt-group"><p class="prompt-label">{}</p><div class="chips">"#,
            escape_html_text(&group.label)
        )?;
        for (c, chip) in group.chips.iter().enumerate() {
            let class = if engine.is_chosen(g, c) { " chosen" } else { "" };
            write!(
                out,
                r#"<button class="chip{class}" data-action="choose_chip" data-group="{g}" data-index="{c}" title="{}">{}</button>"#,
                escape_html_attr(chip),
                escape_html_text(chip)
            )?;
        }
        out.push_str("</div></div>");
    }
    match engine.preview(body) {
        Some(preview) => write!(
            out,
            r#"<div class="prompt-preview">{}</div>"#,
            escape_html_text(&preview)
        )?,
        None => write!(
            out,
            r#"<div class="prompt-preview placeholder">{}</div>"#,
            escape_html_text(&body.placeholder)
        )?,
    }
    out.push_str("</div>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::{ChipGroup, Explanations, MatchPair};

    fn quiz_body() -> QuizBody {
        QuizBody {
            question: "Pick C".into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: 2,
            explanations: Explanations {
                correct: "C is right.".into(),
                wrong: "Others are not.".into(),
            },
        }
    }

    #[test]
    fn quiz_marks_answer_and_disables_options() {
        let body = quiz_body();
        let mut engine = QuizEngine::new(4, 2, 20);
        let mut before = String::new();
        write_quiz(&mut before, &body, &engine).unwrap();
        assert_eq!(before.matches(r#"data-action="select_option""#).count(), 4);
        assert!(!before.contains("disabled"));
        assert!(!before.contains("quiz-explanation"));

        engine.select(1);
        let mut after = String::new();
        write_quiz(&mut after, &body, &engine).unwrap();
        assert!(after.contains(r#"quiz-option wrong" data-action="select_option" data-index="1""#));
        assert!(after.contains(r#"quiz-option correct" data-action="select_option" data-index="2""#));
        assert_eq!(after.matches(" disabled>").count(), 4);
        assert!(after.contains("C is right. Others are not."));
    }

    #[test]
    fn matching_shows_right_items_in_engine_order() {
        let body = MatchingBody {
            pairs: vec![
                MatchPair {
                    left: "L0".into(),
                    right: "R0".into(),
                },
                MatchPair {
                    left: "L1".into(),
                    right: "R1".into(),
                },
            ],
        };
        let mut engine = MatchingEngine::with_right_order(vec![1, 0], 20);
        engine.select_left(0);
        let mut html = String::new();
        write_matching(&mut html, &body, &engine).unwrap();
        assert!(html.find("R1").unwrap() < html.find("R0").unwrap());
        assert!(html.contains(r#"match-item selected" data-action="select_left" data-index="0""#));
    }

    #[test]
    fn ordering_hides_check_once_solved() {
        let body = OrderingBody {
            instructions: "Sort".into(),
            items: vec!["first".into(), "second".into()],
        };
        let mut engine = OrderingEngine::with_order(vec![1, 0], 20);
        let mut html = String::new();
        write_ordering(&mut html, &body, &engine).unwrap();
        assert!(html.find("second").unwrap() < html.find("first").unwrap());
        assert!(html.contains(r#"data-action="check_order""#));

        engine.select(0);
        engine.select(1);
        engine.check();
        let mut html = String::new();
        write_ordering(&mut html, &body, &engine).unwrap();
        assert!(!html.contains("check_order"));
        assert!(html.contains("widget-done"));
    }

    #[test]
    fn prompt_builder_shows_placeholder_until_filled() {
        let body = PromptBuilderBody {
            groups: vec![ChipGroup {
                label: "Tone".into(),
                chips: vec!["friendly".into(), "formal".into()],
            }],
            placeholder: "Choose a tone".into(),
        };
        let mut engine = PromptBuilderEngine::new(vec![2]);
        let mut html = String::new();
        write_prompt_builder(&mut html, &body, &engine).unwrap();
        assert!(html.contains(r#"prompt-preview placeholder">Choose a tone"#));

        engine.choose(0, 1);
        let mut html = String::new();
        write_prompt_builder(&mut html, &body, &engine).unwrap();
        assert!(html.contains(r#"<div class="prompt-preview">formal</div>"#));
        assert!(html.contains(r#"chip chosen" data-action="choose_chip" data-group="0" data-index="1""#));
    }
}
