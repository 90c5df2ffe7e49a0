//! Lesson chrome: header, progress bar, navigation drawer, footer and the
//! welcome screen.

use std::fmt::{self, Write};

use super::utils::{escape_html_attr, escape_html_text};
use crate::models::lesson::Lesson;

/// Everything the chrome needs besides the lesson itself.
#[derive(Debug, Clone, Copy)]
pub struct ChromeState {
    pub current: usize,
    pub xp: u32,
    pub listening: bool,
}

pub(super) fn write_header(out: &mut String, lesson: &Lesson, state: ChromeState) -> fmt::Result {
    let category = lesson
        .get(state.current)
        .map(|s| s.category.as_str())
        .unwrap_or_default();
    let listen_class = if state.listening { " active" } else { "" };
    write!(
        out,
        concat!(
            r#"<header class="lesson-header">"#,
            r#"<button class="drawer-toggle" data-action="toggle_drawer">&#9776;</button>"#,
            r#"<span class="header-category">{}</span>"#,
            r#"<button class="listen-toggle{}" data-action="toggle_listen">{}</button>"#,
            r#"<span class="xp-badge">{} XP</span>"#,
            r#"<span class="slide-counter">{}/{}</span>"#,
            "</header>"
        ),
        escape_html_text(category),
        listen_class,
        if state.listening { "Listening" } else { "Listen" },
        state.xp,
        state.current + 1,
        lesson.count()
    )
}

pub(super) fn write_progress(out: &mut String, lesson: &Lesson, current: usize) -> fmt::Result {
    let percent = (current + 1) as f64 / lesson.count().max(1) as f64 * 100.0;
    write!(
        out,
        r#"<div class="progress"><div class="progress-fill" style="width:{percent:.1}%"></div></div>"#
    )
}

/// Drawer entries grouped under their category, in first-appearance order.
pub(super) fn write_drawer(out: &mut String, lesson: &Lesson, current: usize) -> fmt::Result {
    out.push_str(r#"<nav class="drawer">"#);
    for category in lesson.categories() {
        write!(
            out,
            r#"<div class="drawer-group"><p class="drawer-category">{}</p>"#,
            escape_html_text(category)
        )?;
        for (i, slide) in lesson.slides().iter().enumerate() {
            if slide.category != category {
                continue;
            }
            let active = if i == current { " active" } else { "" };
            write!(
                out,
                r#"<button class="drawer-item{active}" data-action="goto" data-index="{i}">{}</button>"#,
                escape_html_text(&slide.title)
            )?;
        }
        out.push_str("</div>");
    }
    out.push_str("</nav>");
    Ok(())
}

/// Back/next are disabled at the boundaries.
pub(super) fn write_footer(out: &mut String, lesson: &Lesson, current: usize) -> fmt::Result {
    let back_disabled = if current == 0 { " disabled" } else { "" };
    let next_disabled = if current >= lesson.last_index() {
        " disabled"
    } else {
        ""
    };
    write!(
        out,
        r#"<footer class="lesson-footer"><button class="nav-back" data-action="previous"{back_disabled}>Back</button><div class="dots">"#
    )?;
    for (i, slide) in lesson.slides().iter().enumerate() {
        let active = if i == current { " active" } else { "" };
        write!(
            out,
            r#"<button class="dot{active}" data-action="goto" data-index="{i}" title="{}"></button>"#,
            escape_html_attr(&slide.title)
        )?;
    }
    write!(
        out,
        r#"</div><button class="nav-next" data-action="next"{next_disabled}>Next</button></footer>"#
    )
}

pub(super) fn write_welcome(out: &mut String, lesson: &Lesson) -> fmt::Result {
    write!(
        out,
        concat!(
            r#"<section class="welcome">"#,
            r#"<h1 class="welcome-title">{}</h1>"#,
            r#"<p class="welcome-subtitle">{}</p>"#,
            r#"<p class="welcome-count">{} slides</p>"#,
            r#"<div class="welcome-actions">"#,
            r#"<button class="start-listen" data-action="start" data-listen="true">Listen &amp; learn</button>"#,
            r#"<button class="start-read" data-action="start" data-listen="false">Read at my pace</button>"#,
            "</div></section>"
        ),
        escape_html_text(&lesson.title),
        escape_html_text(lesson.welcome_subtitle()),
        lesson.count()
    )
}
