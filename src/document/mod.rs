// src/document/mod.rs
//! Standalone lesson documents.
//!
//! A document is a single HTML file that carries the lesson as JSON between fixed
//! boundary markers. Tools can find and replace the embedded data with plain string
//! search, without parsing the surrounding markup.
//!
//! Every document also carries a static rendition of all slides and a host script.
//! When the document is built with a [`RuntimeBundle`] (the `wasm-bindgen
//! --target no-modules` output of this crate), the host script boots
//! [`crate::LessonRuntime`] from the embedded module and the lesson plays fully
//! offline. Without a bundle the host script shows the static slides.

use std::fmt::Write;
use std::ops::Range;

use base64::Engine;
use log::debug;
use serde_json::Value;

use crate::converters::html::{render_slide, render_welcome, utils::escape_html_text};
use crate::converters::html::{Direction, SlideContext};
use crate::errors::{LessonError, Result};
use crate::models::lesson::Lesson;
use crate::session::LessonSession;

pub const TITLE_BEGIN: &str = "/*@@TITLE_BEGIN@@*/";
pub const TITLE_END: &str = "/*@@TITLE_END@@*/";
pub const SLIDES_BEGIN: &str = "/*@@SLIDES_BEGIN@@*/";
pub const SLIDES_END: &str = "/*@@SLIDES_END@@*/";
pub const MEDIA_BEGIN: &str = "/*@@MEDIA_BEGIN@@*/";
pub const MEDIA_END: &str = "/*@@MEDIA_END@@*/";
pub const DECK_BEGIN: &str = "<!--@@DECK_BEGIN@@-->";
pub const DECK_END: &str = "<!--@@DECK_END@@-->";
pub const RUNTIME_BEGIN: &str = "/*@@RUNTIME_BEGIN@@*/";
pub const RUNTIME_END: &str = "/*@@RUNTIME_END@@*/";
/// Present only in documents that open with editing enabled.
pub const EDITABLE_MARKER: &str = "<!--@@EDITABLE@@-->";

const STYLESHEET: &str = include_str!("lesson.css");
const HOST_SCRIPT: &str = include_str!("host.js");

/// Whether a built document opens with the editor enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentMode {
    Editable,
    #[default]
    ReadOnly,
}

/// The browser build of this crate: the `no-modules` JS glue and its wasm module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeBundle {
    pub glue_js: String,
    pub wasm: Vec<u8>,
}

/// Serializes `value` as JSON that is safe inside a `<script>` element and a
/// marker comment.
fn embed_json(value: &impl serde::Serialize) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/").replace("*/", "*\\/"))
}

/// Every slide rendered statically, widgets in their initial state.
///
/// The deck lives inside `<noscript>`, so authored markup must not close it.
fn render_deck(lesson: &Lesson) -> Result<String> {
    let mut out = String::from(r#"<div class="static-deck">"#);
    out.push_str(render_welcome(lesson)?.as_str());
    for (index, slide) in lesson.slides().iter().enumerate() {
        let ctx = SlideContext {
            media: &lesson.media,
            widget: None,
            xp: 0,
        };
        out.push_str(render_slide(slide, index, Direction::Forward, ctx)?.as_str());
    }
    out.push_str("</div>");
    Ok(out
        .replace("</noscript", "&lt;/noscript")
        .replace(DECK_END, ""))
}

fn embed_runtime(bundle: &RuntimeBundle) -> String {
    let wasm = base64::engine::general_purpose::STANDARD.encode(&bundle.wasm);
    format!(
        "{}\nconst RUNTIME_WASM=\"{wasm}\";",
        bundle.glue_js.replace("</script", "<\\/script").replace(RUNTIME_END, "")
    )
}

/// Builds a complete document for `lesson` that shows its slides statically.
pub fn build_document(lesson: &Lesson, mode: DocumentMode) -> Result<String> {
    build_document_with_runtime(lesson, mode, None)
}

/// Builds a complete document for `lesson`, embedding `runtime` when given so the
/// document plays interactively without network access.
pub fn build_document_with_runtime(
    lesson: &Lesson,
    mode: DocumentMode,
    runtime: Option<&RuntimeBundle>,
) -> Result<String> {
    let welcome = render_welcome(lesson)?;
    let deck = render_deck(lesson)?;
    let runtime = runtime.map(embed_runtime).unwrap_or_default();
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="UTF-8">"#)?;
    writeln!(
        out,
        r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
    )?;
    writeln!(out, "<title>{}</title>", escape_html_text(&lesson.title))?;
    writeln!(out, "<style>\n{STYLESHEET}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    if mode == DocumentMode::Editable {
        writeln!(out, "{EDITABLE_MARKER}")?;
    }
    writeln!(out, r#"<div class="app static" id="app">{welcome}</div>"#)?;
    writeln!(
        out,
        r#"<noscript id="static-deck">{DECK_BEGIN}{deck}{DECK_END}</noscript>"#
    )?;
    writeln!(out, r#"<script id="lesson-data">"#)?;
    writeln!(
        out,
        "const COURSE_TITLE={TITLE_BEGIN}{}{TITLE_END};",
        embed_json(&lesson.title)?
    )?;
    writeln!(
        out,
        "const slidesData={SLIDES_BEGIN}{}{SLIDES_END};",
        embed_json(&lesson.slides_wire())?
    )?;
    writeln!(
        out,
        "const IMAGES={MEDIA_BEGIN}{}{MEDIA_END};",
        embed_json(&lesson.media)?
    )?;
    writeln!(out, "</script>")?;
    writeln!(
        out,
        r#"<script id="lesson-runtime">{RUNTIME_BEGIN}{runtime}{RUNTIME_END}</script>"#
    )?;
    writeln!(out, "<script id=\"lesson-host\">\n{HOST_SCRIPT}</script>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

/// The distributable form: read-only.
pub fn serialize(lesson: &Lesson) -> Result<String> {
    build_document(lesson, DocumentMode::ReadOnly)
}

/// Whether the document carries an embedded runtime.
pub fn has_runtime(document: &str) -> bool {
    between(document, RUNTIME_BEGIN, RUNTIME_END).is_ok_and(|r| !r.is_empty())
}

/// Byte range strictly between `begin` and the following `end`.
fn span(document: &str, begin: &str, end: &str) -> Result<Range<usize>> {
    let start = document
        .find(begin)
        .map(|i| i + begin.len())
        .ok_or_else(|| LessonError::MalformedInput(format!("missing marker {begin}")))?;
    let len = document[start..]
        .find(end)
        .ok_or_else(|| LessonError::MalformedInput(format!("missing marker {end}")))?;
    Ok(start..start + len)
}

fn between<'a>(document: &'a str, begin: &str, end: &str) -> Result<&'a str> {
    Ok(&document[span(document, begin, end)?])
}

/// Replaces the text between `begin` and `end` with `content`, keeping the markers.
pub fn replace_between(document: &str, begin: &str, end: &str, content: &str) -> Result<String> {
    let range = span(document, begin, end)?;
    let mut out = String::with_capacity(document.len() - range.len() + content.len());
    out.push_str(&document[..range.start]);
    out.push_str(content);
    out.push_str(&document[range.end..]);
    Ok(out)
}

pub fn is_editable(document: &str) -> bool {
    document.contains(EDITABLE_MARKER)
}

/// Loads the lesson embedded in a document.
///
/// # Errors
///
/// `MalformedInput` if a marker is missing, `Json` if embedded data does not parse.
pub fn extract_lesson(document: &str) -> Result<Lesson> {
    let title: Option<String> = serde_json::from_str(between(document, TITLE_BEGIN, TITLE_END)?)?;
    let slides: Value = serde_json::from_str(between(document, SLIDES_BEGIN, SLIDES_END)?)?;
    let media: Value = serde_json::from_str(between(document, MEDIA_BEGIN, MEDIA_END)?)?;
    Lesson::load(title, &slides, &media)
}

/// Writes `lesson` into an existing document in place of its embedded data and
/// static slides, and strips the editing marker. Everything outside the markers
/// is kept byte for byte. Documents without a static deck are accepted as is.
pub fn reembed(document: &str, lesson: &Lesson) -> Result<String> {
    let out = replace_between(document, TITLE_BEGIN, TITLE_END, &embed_json(&lesson.title)?)?;
    let out = replace_between(
        &out,
        SLIDES_BEGIN,
        SLIDES_END,
        &embed_json(&lesson.slides_wire())?,
    )?;
    let mut out = replace_between(&out, MEDIA_BEGIN, MEDIA_END, &embed_json(&lesson.media)?)?;
    if span(&out, DECK_BEGIN, DECK_END).is_ok() {
        out = replace_between(&out, DECK_BEGIN, DECK_END, &render_deck(lesson)?)?;
    }
    if is_editable(&out) {
        debug!("Stripping editing marker");
        let stripped = out
            .replace(&format!("{EDITABLE_MARKER}\n"), "")
            .replace(EDITABLE_MARKER, "");
        return Ok(stripped);
    }
    Ok(out)
}

impl LessonSession {
    /// Read-only document of the lesson as currently edited.
    pub fn serialize(&self) -> Result<String> {
        serialize(&self.lesson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MediaTable;
    use serde_json::json;

    fn lesson() -> Lesson {
        let mut media = MediaTable::new();
        media.insert(3, "data:image/png;base64,iVBORw0KGgo=");
        media.insert(0, "data:video/mp4;base64,AAAAIGZ0eXA=");
        let mut lesson = Lesson::load(
            Some("Prompting </script> 101".into()),
            &json!([
                { "cat": "Intro", "t": "Hello */ world", "s": "Start", "type": "content",
                  "body": [
                      { "kind": "text", "html": "<b>bold</b></script><script>alert(1)</script>" },
                      { "kind": "image", "image_idx": 3, "alt": "diagram" }
                  ] },
                { "t": "Check", "type": "quiz",
                  "body": { "question": "Q?", "options": ["a", "b"], "correct": 1 } },
                { "t": "Custom", "body": [ { "kind": "poll", "votes": [1, 2] } ] }
            ]),
            &Value::Null,
        )
        .unwrap();
        lesson.media = media;
        lesson
    }

    fn script<'a>(document: &'a str, id: &str) -> &'a str {
        let open = format!(r#"<script id="{id}">"#);
        let rest = &document[document.find(&open).unwrap() + open.len()..];
        &rest[..rest.find("</script>").unwrap()]
    }

    #[test]
    fn serialize_then_load_round_trips() {
        let lesson = lesson();
        let document = serialize(&lesson).unwrap();
        assert!(!is_editable(&document));
        let loaded = extract_lesson(&document).unwrap();
        assert_eq!(loaded, lesson);

        // A second cycle is byte-identical.
        assert_eq!(serialize(&loaded).unwrap(), document);
    }

    #[test]
    fn embedded_data_cannot_close_the_script_or_a_marker() {
        let document = serialize(&lesson()).unwrap();
        let data = script(&document, "lesson-data");
        assert!(data.contains(r"<b>bold<\/b>"));
        assert!(!data.contains("</"));

        let slides = between(&document, SLIDES_BEGIN, SLIDES_END).unwrap();
        assert!(!slides.contains("*/"));
    }

    #[test]
    fn every_slide_is_rendered_into_the_static_deck() {
        let lesson = Lesson::load(
            None,
            &json!([
                { "t": "One", "body": [ { "kind": "text", "html": "<p>x</noscript><b>y</b></p>" } ] },
                { "t": "Q", "type": "quiz", "body": { "options": ["a", "b"], "correct": 0 } },
                { "t": "Two" }
            ]),
            &Value::Null,
        )
        .unwrap();
        let document = serialize(&lesson).unwrap();
        let deck = between(&document, DECK_BEGIN, DECK_END).unwrap();
        for index in 0..lesson.count() {
            assert!(deck.contains(&format!(r#"data-slide="{index}""#)));
        }
        assert!(deck.contains(r#"class="welcome"#));
        assert!(!deck.contains("</noscript"));
        assert!(script(&document, "lesson-host").contains("wasm_bindgen.LessonRuntime"));
        assert!(document.contains("<style>"));
    }

    #[test]
    fn runtime_is_embedded_only_when_bundled() {
        let lesson = lesson();
        let plain = serialize(&lesson).unwrap();
        assert!(!has_runtime(&plain));
        assert_eq!(between(&plain, RUNTIME_BEGIN, RUNTIME_END).unwrap(), "");

        let bundle = RuntimeBundle {
            glue_js: "let wasm_bindgen = function () { /* </script> */ };".into(),
            wasm: vec![0, 1, 2],
        };
        let document =
            build_document_with_runtime(&lesson, DocumentMode::ReadOnly, Some(&bundle)).unwrap();
        assert!(has_runtime(&document));
        let runtime = script(&document, "lesson-runtime");
        assert!(runtime.contains("let wasm_bindgen = function ()"));
        assert!(runtime.contains(r#"const RUNTIME_WASM="AAEC";"#));
        assert_eq!(extract_lesson(&document).unwrap(), lesson);

        // Re-embedding keeps the runtime.
        let out = reembed(&document, &lesson).unwrap();
        assert!(has_runtime(&out));
    }

    #[test]
    fn reembed_replaces_data_and_strips_editing_marker() {
        let original = lesson();
        let document = build_document(&original, DocumentMode::Editable).unwrap();
        assert!(is_editable(&document));

        let mut edited = original.clone();
        edited.title = "Renamed".into();
        edited.media.remove(0);
        edited.slides_mut()[1].title = "Checkpoint".into();
        let out = reembed(&document, &edited).unwrap();

        assert!(!is_editable(&out));
        assert_eq!(extract_lesson(&out).unwrap(), edited);
        // Markup outside the markers is kept, including the old <title>.
        assert!(out.contains("<title>Prompting &lt;/script&gt; 101</title>"));
        // The static deck follows the new data.
        let deck = between(&out, DECK_BEGIN, DECK_END).unwrap();
        assert!(deck.contains("Checkpoint"));
        assert_eq!(deck, render_deck(&edited).unwrap());
    }

    #[test]
    fn missing_marker_is_malformed() {
        let err = extract_lesson("<html></html>").unwrap_err();
        assert!(matches!(err, LessonError::MalformedInput(_)));
    }

    #[test]
    fn replace_between_keeps_markers() {
        let out = replace_between("a[[old]]b", "[[", "]]", "new").unwrap();
        assert_eq!(out, "a[[new]]b");
    }
}
