// src/models/lesson.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LessonError, Result};
use crate::models::media::MediaTable;
use crate::models::slide::{Slide, SlideKind};

/// Fallback course title when neither the payload nor the slides provide one.
pub const DEFAULT_COURSE_TITLE: &str = "Lesson";

/// Fallback welcome subtitle.
pub const DEFAULT_WELCOME_SUBTITLE: &str =
    "Master the key concepts through interactive lessons, quizzes, and hands-on activities.";

/// One lesson: an ordered, never-empty sequence of slides plus its media table.
///
/// Deserialization goes through [`Lesson::new`], so it rejects an empty slide list
/// and derives a missing title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LessonRecord")]
pub struct Lesson {
    /// The course title shown on the welcome screen and in the document head.
    pub title: String,

    /// The slides, in presentation order.
    slides: Vec<Slide>,

    /// Media assets referenced by image blocks.
    #[serde(default)]
    pub media: MediaTable,
}

#[derive(Deserialize)]
struct LessonRecord {
    #[serde(default)]
    title: Option<String>,
    slides: Vec<Slide>,
    #[serde(default)]
    media: MediaTable,
}

impl TryFrom<LessonRecord> for Lesson {
    type Error = LessonError;

    fn try_from(record: LessonRecord) -> Result<Self> {
        Lesson::new(record.title, record.slides, record.media)
    }
}

impl Lesson {
    /// Builds a lesson from already decoded slides.
    ///
    /// A missing or blank `title` is derived from the slides.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::MalformedInput` if `slides` is empty.
    pub fn new(title: Option<String>, slides: Vec<Slide>, media: MediaTable) -> Result<Self> {
        if slides.is_empty() {
            return Err(LessonError::MalformedInput(
                "a lesson needs at least one slide".to_string(),
            ));
        }
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| derive_course_title(&slides));
        Ok(Lesson {
            title,
            slides,
            media,
        })
    }

    /// Loads the external payload: a JSON array of slide records and a JSON object
    /// mapping media indices to data URIs. Only defaulting is applied.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if the slides value is not a non-empty array, `Json` if the
    /// media value is not an index-keyed object.
    pub fn load(title: Option<String>, raw_slides: &Value, raw_media: &Value) -> Result<Self> {
        let Value::Array(records) = raw_slides else {
            return Err(LessonError::MalformedInput(
                "slides payload must be a JSON array".to_string(),
            ));
        };
        let slides = records
            .iter()
            .map(Slide::from_wire)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let media = match raw_media {
            Value::Null => MediaTable::new(),
            other => serde_json::from_value(other.clone())?,
        };
        Self::new(title, slides, media)
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn count(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub(crate) fn slides_mut(&mut self) -> &mut Vec<Slide> {
        &mut self.slides
    }

    /// Replaces the contents of this lesson in place with `snapshot`'s.
    pub(crate) fn restore_from(&mut self, snapshot: Lesson) {
        self.title = snapshot.title;
        self.slides = snapshot.slides;
        self.media = snapshot.media;
    }

    pub fn last_index(&self) -> usize {
        self.slides.len().saturating_sub(1)
    }

    /// Subtitle for the welcome screen: the first content slide's subtitle.
    pub fn welcome_subtitle(&self) -> &str {
        self.slides
            .iter()
            .find(|s| s.kind() == SlideKind::Content && !s.subtitle.is_empty())
            .map(|s| s.subtitle.as_str())
            .unwrap_or(DEFAULT_WELCOME_SUBTITLE)
    }

    /// Distinct categories in first-appearance order, for the navigation drawer.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for slide in &self.slides {
            if !seen.contains(&slide.category.as_str()) {
                seen.push(slide.category.as_str());
            }
        }
        seen
    }

    /// The slide array in wire form.
    pub fn slides_wire(&self) -> Value {
        Value::Array(self.slides.iter().map(Slide::to_wire).collect())
    }
}

/// First content slide's title, else the first slide's title, else a fixed default.
pub fn derive_course_title(slides: &[Slide]) -> String {
    slides
        .iter()
        .find(|s| s.kind() == SlideKind::Content && !s.title.is_empty())
        .or_else(|| slides.first().filter(|s| !s.title.is_empty()))
        .map(|s| s.title.clone())
        .unwrap_or_else(|| DEFAULT_COURSE_TITLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_is_rejected() {
        let err = Lesson::load(None, &json!([]), &Value::Null).unwrap_err();
        assert!(matches!(err, LessonError::MalformedInput(_)));
        let err = Lesson::load(None, &json!({ "slides": [] }), &Value::Null).unwrap_err();
        assert!(matches!(err, LessonError::MalformedInput(_)));
    }

    #[test]
    fn deserializing_keeps_the_non_empty_invariant() {
        let err = serde_json::from_value::<Lesson>(json!({ "title": "T", "slides": [] }))
            .unwrap_err();
        assert!(err.to_string().contains("at least one slide"));

        let lesson: Lesson =
            serde_json::from_value(json!({ "slides": [{ "t": "Only", "type": "content" }] }))
                .unwrap();
        assert_eq!(lesson.title, "Only");
        assert_eq!(lesson.count(), 1);

        let round_trip: Lesson =
            serde_json::from_value(serde_json::to_value(&lesson).unwrap()).unwrap();
        assert_eq!(round_trip, lesson);
    }

    #[test]
    fn title_is_derived_from_first_content_slide() {
        let lesson = Lesson::load(
            None,
            &json!([
                { "t": "Check", "type": "quiz" },
                { "t": "Pitch Basics", "s": "Why decks matter", "type": "content" }
            ]),
            &json!({ "0": "data:image/png;base64,AA==" }),
        )
        .unwrap();
        assert_eq!(lesson.title, "Pitch Basics");
        assert_eq!(lesson.welcome_subtitle(), "Why decks matter");
        assert_eq!(lesson.count(), 2);
        assert!(lesson.media.contains(0));

        let named = Lesson::load(Some("Given".into()), &json!([{}]), &Value::Null).unwrap();
        assert_eq!(named.title, "Given");
        assert_eq!(named.welcome_subtitle(), DEFAULT_WELCOME_SUBTITLE);
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let lesson = Lesson::load(
            None,
            &json!([{ "cat": "B" }, { "cat": "A" }, { "cat": "B" }, {}]),
            &Value::Null,
        )
        .unwrap();
        assert_eq!(lesson.categories(), vec!["B", "A", "Lesson"]);
    }
}
