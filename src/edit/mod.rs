//! Edit and undo subsystem.
//!
//! The only writer of the lesson and its media table. Every mutating operation
//! validates first, then pushes an undo snapshot, then mutates. A rejected
//! operation leaves both the lesson and the history untouched.

pub mod ai;
pub mod form;
pub mod undo;

use log::{debug, info};

pub use form::{BlockForm, BodyForm, SlideForm};
use undo::Snapshot;

use crate::errors::{LessonError, Result};
use crate::models::block::Block;
use crate::models::media::MediaIndex;
use crate::models::slide::{Slide, SlideBody, SlideKind};
use crate::session::{Effect, LessonSession, SlideId};
use crate::converters::html::Direction;

/// An open structured editor, bound to a slide by id so it survives moves.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideEditor {
    pub slide_id: SlideId,
    pub form: SlideForm,
    /// Distinguishes this editor opening from earlier ones.
    pub generation: u64,
    /// Visible, recoverable message (e.g. a missing credential).
    pub notice: Option<String>,
}

impl LessonSession {
    // --- Structured editor ---

    /// Opens the editor for slide `index`, replacing any open editor.
    pub fn begin_edit(&mut self, index: usize) -> Result<&SlideForm> {
        let slide = self
            .lesson
            .get(index)
            .ok_or_else(|| LessonError::InvalidOperation(format!("no slide at index {index}")))?;
        self.editor_generation += 1;
        let editor = SlideEditor {
            slide_id: self.ids[index],
            form: SlideForm::from_slide(slide),
            generation: self.editor_generation,
            notice: None,
        };
        Ok(&self.editor.insert(editor).form)
    }

    pub fn editor(&self) -> Option<&SlideEditor> {
        self.editor.as_ref()
    }

    /// Mutable access to the open form for field edits.
    pub fn editor_form_mut(&mut self) -> Option<&mut SlideForm> {
        self.editor.as_mut().map(|e| &mut e.form)
    }

    /// Index of the slide being edited.
    pub fn editing_index(&self) -> Option<usize> {
        self.editor.as_ref().and_then(|e| self.index_of(e.slide_id))
    }

    pub fn cancel_edit(&mut self) {
        if self.editor.take().is_some() {
            self.editor_generation += 1;
        }
    }

    /// Commits the open form into the slide.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if no editor is open, `InvalidInput` if a field does not
    /// convert. On error the editor and its form stay as they were.
    pub fn save_edit(&mut self) -> Result<Vec<Effect>> {
        let editor = self
            .editor
            .as_ref()
            .ok_or_else(|| LessonError::InvalidOperation("no slide is being edited".into()))?;
        let index = self
            .index_of(editor.slide_id)
            .ok_or_else(|| LessonError::InvalidOperation("edited slide no longer exists".into()))?;
        let slide = editor.form.to_slide()?;

        self.push_snapshot();
        self.lesson.slides_mut()[index] = slide;
        self.editor = None;
        self.editor_generation += 1;
        self.narration.invalidate(index);
        self.render_cache.remove(&self.ids[index]);
        info!("Saved slide {index}");

        if index == self.nav.current() {
            let mut effects = self.narration.stop();
            self.activate_current();
            effects.push(Effect::Refresh { index });
            Ok(effects)
        } else {
            Ok(Vec::new())
        }
    }

    // --- Structural operations ---

    /// Moves the current slide one step up (`delta < 0`) or down.
    pub fn move_slide(&mut self, delta: i64) -> Result<Vec<Effect>> {
        let from = self.nav.current();
        let to = i64::try_from(from)
            .ok()
            .and_then(|f| f.checked_add(delta))
            .and_then(|t| usize::try_from(t).ok())
            .filter(|t| *t < self.lesson.count() && *t != from)
            .ok_or_else(|| {
                LessonError::InvalidOperation(format!("cannot move slide {from} by {delta}"))
            })?;

        self.push_snapshot();
        let slide = self.lesson.slides_mut().remove(from);
        self.lesson.slides_mut().insert(to, slide);
        let id = self.ids.remove(from);
        self.ids.insert(to, id);
        Ok(self.after_structural_edit(to))
    }

    /// Inserts a copy of the current slide right after it and moves there.
    pub fn duplicate_slide(&mut self) -> Result<Vec<Effect>> {
        let from = self.nav.current();
        let copy = self
            .lesson
            .get(from)
            .cloned()
            .ok_or_else(|| LessonError::InvalidOperation(format!("no slide at index {from}")))?;

        self.push_snapshot();
        let id = self.allocate_id();
        self.lesson.slides_mut().insert(from + 1, copy);
        self.ids.insert(from + 1, id);
        Ok(self.after_structural_edit(from + 1))
    }

    /// Inserts a blank slide of `kind` after the current one and moves there.
    pub fn add_slide_after(&mut self, kind: SlideKind) -> Result<Vec<Effect>> {
        let at = self.nav.current() + 1;
        self.push_snapshot();
        let id = self.allocate_id();
        let mut slide = Slide::blank(kind);
        if let Some(current) = self.lesson.get(at - 1) {
            slide.category = current.category.clone();
        }
        self.lesson.slides_mut().insert(at, slide);
        self.ids.insert(at, id);
        Ok(self.after_structural_edit(at))
    }

    /// Asks the host to confirm deleting the current slide. Nothing changes yet.
    pub fn request_delete(&self) -> Result<Vec<Effect>> {
        self.check_deletable()?;
        Ok(vec![Effect::ConfirmDelete {
            index: self.nav.current(),
        }])
    }

    /// Deletes the current slide.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if it is the only slide. No snapshot is pushed then.
    pub fn delete_slide(&mut self) -> Result<Vec<Effect>> {
        self.check_deletable()?;
        let index = self.nav.current();

        self.push_snapshot();
        self.lesson.slides_mut().remove(index);
        let id = self.ids.remove(index);
        self.render_cache.remove(&id);
        if self.editor.as_ref().is_some_and(|e| e.slide_id == id) {
            self.cancel_edit();
        }
        let target = index.min(self.lesson.last_index());
        Ok(self.after_structural_edit(target))
    }

    fn check_deletable(&self) -> Result<()> {
        if self.lesson.count() <= 1 {
            return Err(LessonError::InvalidOperation(
                "a lesson must keep at least one slide".into(),
            ));
        }
        Ok(())
    }

    // --- Media ---

    /// Sets the media of image block `block` on slide `slide` to `uri`.
    ///
    /// An index used only by this block is reused; an index shared with another
    /// block (e.g. after a duplicate) is left alone and the lowest free index is
    /// allocated instead. The open editor form follows the change.
    pub fn replace_block_media(
        &mut self,
        slide: usize,
        block: usize,
        uri: impl Into<String>,
    ) -> Result<MediaIndex> {
        let existing = self.image_block(slide, block)?;
        let uri = uri.into();

        self.push_snapshot();
        let index = match existing {
            Some(index) if !self.is_shared(index, slide, block) => {
                self.lesson.media.insert(index, uri);
                self.after_media_edit(index);
                index
            }
            _ => self.lesson.media.allocate(uri),
        };
        self.media_clips.remove(&index);
        self.set_block_media(slide, block, Some(index));
        Ok(index)
    }

    /// Appends a new image block with freshly allocated media.
    pub fn add_image_block(
        &mut self,
        slide: usize,
        uri: impl Into<String>,
        alt: impl Into<String>,
    ) -> Result<MediaIndex> {
        if !matches!(
            self.lesson.get(slide).map(|s| &s.body),
            Some(SlideBody::Content { .. })
        ) {
            return Err(LessonError::InvalidOperation(format!(
                "slide {slide} cannot hold image blocks"
            )));
        }

        self.push_snapshot();
        let index = self.lesson.media.allocate(uri);
        let new_block = Block::Image {
            media_index: Some(index),
            alt: alt.into(),
        };
        if let SlideBody::Content { blocks } = &mut self.lesson.slides_mut()[slide].body {
            blocks.push(new_block.clone());
        }
        if let Some(editor) = self.editor.as_mut() {
            if self.ids.get(slide) == Some(&editor.slide_id) {
                if let BodyForm::Content { blocks } = &mut editor.form.body {
                    blocks.push(BlockForm::from_block(&new_block));
                }
            }
        }
        self.invalidate_slide(slide);
        Ok(index)
    }

    /// Removes the media of image block `block`. The index is released unless
    /// another block still uses it.
    pub fn delete_block_media(&mut self, slide: usize, block: usize) -> Result<()> {
        let index = self.image_block(slide, block)?.ok_or_else(|| {
            LessonError::InvalidOperation(format!("block {block} on slide {slide} has no media"))
        })?;

        self.push_snapshot();
        if !self.is_shared(index, slide, block) {
            self.lesson.media.remove(index);
            self.media_clips.remove(&index);
        }
        self.set_block_media(slide, block, None);
        Ok(())
    }

    /// Media index of an image block, validating that the block exists.
    fn image_block(&self, slide: usize, block: usize) -> Result<Option<MediaIndex>> {
        match self.lesson.get(slide).map(|s| s.blocks().get(block)) {
            Some(Some(Block::Image { media_index, .. })) => Ok(*media_index),
            _ => Err(LessonError::InvalidOperation(format!(
                "slide {slide} has no image block {block}"
            ))),
        }
    }

    /// Points one image block at `index` and refreshes everything derived from it.
    fn set_block_media(&mut self, slide: usize, block: usize, index: Option<MediaIndex>) {
        if let SlideBody::Content { blocks } = &mut self.lesson.slides_mut()[slide].body {
            if let Some(Block::Image { media_index, .. }) = blocks.get_mut(block) {
                *media_index = index;
            }
        }
        self.sync_editor_block(slide, block, index);
        self.invalidate_slide(slide);
    }

    fn sync_editor_block(&mut self, slide: usize, block: usize, index: Option<MediaIndex>) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if self.ids.get(slide) != Some(&editor.slide_id) {
            return;
        }
        if let BodyForm::Content { blocks } = &mut editor.form.body {
            if let Some(BlockForm::Image { media_index, .. }) = blocks.get_mut(block) {
                *media_index = index;
            }
        }
    }

    /// Slides with an image block pointing at `index`.
    fn slides_using(&self, index: MediaIndex) -> Vec<usize> {
        self.lesson
            .slides()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.blocks().iter().any(|b| b.media_index() == Some(index)))
            .map(|(i, _)| i)
            .collect()
    }

    /// True if a block other than (`slide`, `block`) points at `index`.
    fn is_shared(&self, index: MediaIndex, slide: usize, block: usize) -> bool {
        self.lesson.slides().iter().enumerate().any(|(i, s)| {
            s.blocks()
                .iter()
                .enumerate()
                .any(|(j, b)| (i, j) != (slide, block) && b.media_index() == Some(index))
        })
    }

    /// The entry at `index` changed in place: every slide showing it re-renders.
    fn after_media_edit(&mut self, index: MediaIndex) {
        for slide in self.slides_using(index) {
            self.invalidate_slide(slide);
        }
    }

    fn invalidate_slide(&mut self, slide: usize) {
        self.narration.invalidate(slide);
        if let Some(id) = self.ids.get(slide) {
            self.render_cache.remove(id);
        }
    }

    // --- Undo ---

    fn push_snapshot(&mut self) {
        self.history.push(Snapshot {
            lesson: self.lesson.clone(),
            ids: self.ids.clone(),
            current: self.nav.current(),
        });
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Restores the most recent snapshot in place. No-op without history.
    pub fn undo(&mut self) -> Vec<Effect> {
        let Some(snapshot) = self.history.pop() else {
            debug!("Nothing to undo");
            return Vec::new();
        };
        self.lesson.restore_from(snapshot.lesson);
        self.ids = snapshot.ids;
        self.media_clips.clear();
        self.render_cache.clear();
        let orphaned = self
            .editor
            .as_ref()
            .is_some_and(|e| !self.ids.contains(&e.slide_id));
        if orphaned {
            self.cancel_edit();
        }
        self.nav.set_count(self.lesson.count());
        let mut effects = self.narration.stop();
        self.narration.clear_cache();
        self.nav.repoint(snapshot.current);
        self.activate_current();
        effects.push(Effect::StopVideos);
        effects.push(Effect::Render {
            index: self.nav.current(),
            direction: Direction::Forward,
        });
        effects
    }

    /// Common tail of move/duplicate/add/delete: slide indices shifted, so the
    /// whole narration cache goes, and `current` follows the affected slide.
    fn after_structural_edit(&mut self, target: usize) -> Vec<Effect> {
        self.nav.set_count(self.lesson.count());
        let mut effects = self.narration.stop();
        self.narration.clear_cache();
        self.nav.repoint(target);
        self.activate_current();
        effects.push(Effect::StopVideos);
        effects.push(Effect::Render {
            index: self.nav.current(),
            direction: Direction::Forward,
        });
        effects
    }
}
