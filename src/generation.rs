// src/generation.rs
//! Request building and reply parsing for the slide generation collaborator.
//!
//! The collaborator itself (an LLM behind [`crate::client::anthropic`]) is
//! external. This module only shapes what goes in and validates what comes out.

use std::collections::BTreeMap;
use std::fmt::Write;

use log::{debug, warn};
use serde_json::Value;

use crate::errors::{LessonError, Result};
use crate::models::media::MediaIndex;
use crate::models::slide::Slide;

/// Source text beyond this many characters is cut off.
pub const MAX_SOURCE_CHARS: usize = 150_000;

const TRUNCATION_NOTE: &str = "\n\n[... Content truncated for context window ...]";

/// System prompt for slide generation: the output contract, nothing more.
pub const SLIDES_SYSTEM_PROMPT: &str = r#"Convert the provided content into a JSON array of interactive lesson slides.
Return ONLY the JSON array.
Each slide: {"cat": category, "t": title, "s": subtitle, "narration": 1-3 spoken sentences,
"type": "content" | "quiz" | "matching" | "ordering" | "prompt_builder" | "milestone" | "completion",
"body": kind-specific fields}.
content body: {"blocks": [{"kind": "text" | "bullets" | "icons" | "steps" | "tip" | "table" | "code" | "compare" | "image" | "heading" | "divider", ...}]}
quiz body: {"question", "options": [4 strings], "correct": index, "explanations": {"correct", "wrong"}}
matching body: {"pairs": [{"left", "right"}]}
ordering body: {"instructions", "correct_order": [strings]}
prompt_builder body: {"instructions", "chips": [strings], "placeholder"}
milestone body: {"emoji", "message"}
completion body: {"takeaways": [strings], "cta"}
Image blocks reference available images by "image_idx"."#;

/// System prompt for rewriting one slide.
pub const REWRITE_SYSTEM_PROMPT: &str = r#"You edit one lesson slide. You receive the slide as JSON and an instruction.
Return ONLY the complete updated slide as a JSON object with the same structure.
Keep "type" and "cat" unless the instruction asks to change them.
Rewrite "narration" as 2-5 sentences in a consistent, conversational voice."#;

/// An image the generator may place, with a description of where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHint {
    pub index: MediaIndex,
    pub description: String,
}

/// Everything the generation collaborator is told about one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub course_title: Option<String>,
    pub images: Vec<ImageHint>,
    /// Extra notes keyed by zero-based source slide index.
    pub notes: BTreeMap<usize, String>,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            ..Self::default()
        }
    }

    /// Source text, cut to [`MAX_SOURCE_CHARS`] characters with a note appended.
    pub fn truncated_source(&self) -> String {
        match self.source_text.char_indices().nth(MAX_SOURCE_CHARS) {
            Some((cut, _)) => {
                debug!(
                    "Truncating source text from {} bytes to {cut}",
                    self.source_text.len()
                );
                format!("{}{TRUNCATION_NOTE}", &self.source_text[..cut])
            }
            None => self.source_text.clone(),
        }
    }

    /// The user message sent alongside [`SLIDES_SYSTEM_PROMPT`].
    pub fn user_message(&self) -> Result<String> {
        let mut out = String::new();
        match self.course_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => write!(
                out,
                "Course Title: \"{title}\". Use this exact name for the course. "
            )?,
            _ => out.push_str("Derive a clear, specific course title from the content. "),
        }
        out.push_str("Convert this content into the JSON slides array.\n\n");
        out.push_str("Include ALL content. Do not skip or summarize sections.\n");

        if !self.images.is_empty() {
            out.push_str("\nAVAILABLE IMAGES (use all of them, each on the slide matching its topic):\n");
            for hint in &self.images {
                writeln!(out, "  - image_idx {}: {}", hint.index, hint.description)?;
            }
        }
        if !self.notes.is_empty() {
            out.push_str("\nNOTES FOR SPECIFIC SLIDES:\n");
            for (index, note) in &self.notes {
                writeln!(out, "  - Slide {}: {note}", index + 1)?;
            }
        }
        write!(
            out,
            "\nCONTENT:\n{}\n\nReturn ONLY the JSON array.",
            self.truncated_source()
        )?;
        Ok(out)
    }
}

/// Removes a surrounding markdown code fence, if present.
pub fn strip_fences(raw: &str) -> &str {
    let raw = raw.trim();
    if !raw.starts_with("```") {
        return raw;
    }
    let body = raw.split_once('\n').map_or("", |(_, rest)| rest);
    let body = match body.rsplit_once('\n') {
        Some((inner, last)) if last.trim().starts_with("```") => inner,
        _ if body.trim().starts_with("```") => "",
        _ => body,
    };
    body.trim()
}

/// Parses a generation reply into slides.
///
/// # Errors
///
/// `MalformedInput` if the reply is not a non-empty JSON array. Never retried.
pub fn parse_slides(raw: &str) -> Result<Vec<Slide>> {
    let value: Value = serde_json::from_str(strip_fences(raw)).map_err(|e| {
        warn!("Generation reply is not JSON: {e}");
        LessonError::MalformedInput(format!("generation reply is not valid JSON: {e}"))
    })?;
    let Value::Array(records) = value else {
        return Err(LessonError::MalformedInput(
            "generation reply is not a JSON array".into(),
        ));
    };
    if records.is_empty() {
        return Err(LessonError::MalformedInput(
            "generation reply contains no slides".into(),
        ));
    }
    Ok(records
        .iter()
        .map(Slide::from_wire)
        .collect::<serde_json::Result<Vec<_>>>()?)
}

/// Parses a rewrite reply into a slide record.
pub fn parse_slide_record(raw: &str) -> Result<Value> {
    match serde_json::from_str(strip_fences(raw)) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(LessonError::MalformedInput(
            "rewrite reply is not a JSON object".into(),
        )),
        Err(e) => Err(LessonError::MalformedInput(format!(
            "rewrite reply is not valid JSON: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::SlideKind;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("```\n[1]"), "[1]");
        assert_eq!(strip_fences("  [1]  "), "[1]");
    }

    #[test]
    fn parses_fenced_reply() {
        let slides = parse_slides(
            "```json\n[{\"t\": \"One\"}, {\"t\": \"Q\", \"type\": \"quiz\", \"body\": {\"options\": [\"a\"]}}]\n```",
        )
        .unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].kind(), SlideKind::Quiz);
    }

    #[test]
    fn malformed_replies_are_rejected() {
        for raw in ["not json", "{\"t\": 1}", "[]", "```\n```"] {
            assert!(
                matches!(parse_slides(raw), Err(LessonError::MalformedInput(_))),
                "{raw}"
            );
        }
        assert!(parse_slide_record("[1]").is_err());
        assert!(parse_slide_record("{\"t\": \"x\"}").is_ok());
    }

    #[test]
    fn long_source_is_truncated_on_a_char_boundary() {
        let request = GenerationRequest::new("é".repeat(MAX_SOURCE_CHARS + 10));
        let text = request.truncated_source();
        assert!(text.ends_with(TRUNCATION_NOTE));
        assert_eq!(
            text.trim_end_matches(TRUNCATION_NOTE).chars().count(),
            MAX_SOURCE_CHARS
        );
        assert_eq!(GenerationRequest::new("short").truncated_source(), "short");
    }

    #[test]
    fn user_message_lists_images_and_notes() {
        let mut request = GenerationRequest::new("Body text");
        request.course_title = Some("Pitching".into());
        request.images.push(ImageHint {
            index: 0,
            description: "Slide 2: market chart".into(),
        });
        request.notes.insert(1, "Mention the demo".into());
        let message = request.user_message().unwrap();
        assert!(message.starts_with("Course Title: \"Pitching\""));
        assert!(message.contains("image_idx 0: Slide 2: market chart"));
        assert!(message.contains("Slide 2: Mention the demo"));
        assert!(message.contains("CONTENT:\nBody text"));
    }
}
