//! The lesson runtime.
//!
//! A [`LessonSession`] owns one loaded lesson and every piece of runtime state:
//! position, XP, the live widget engine, narration, render cache, undo history and
//! the open editor. All operations run on one logical thread and return the
//! [`Effect`]s the host must perform. Results of async work come back through
//! `audio_fetched`, `playback_ended`, `video_ended`, `probe_finished` and `fire`.

pub mod effects;
pub mod narration;
pub mod navigation;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub use effects::{AudioRequest, Effect, ListenStatus, Ticket, Timer};
pub use narration::{speech_chunks, NarrationCoordinator, RemoteState, SlideCue};
pub use navigation::Navigator;

use crate::config::SessionSettings;
use crate::converters::html::{self, ChromeState, Direction, Fragment, SlideContext};
use crate::edit::undo::UndoHistory;
use crate::edit::SlideEditor;
use crate::errors::{LessonError, Result};
use crate::models::lesson::Lesson;
use crate::models::media::{MediaClip, MediaIndex};
use crate::models::slide::{Slide, SlideKind};
use crate::widgets::{Widget, WidgetAction, WidgetEvent};

/// Session-local identity of a slide. Survives moves, so rewards and cached
/// renders stay attached to the slide rather than to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub u64);

/// Which external collaborators have credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collaborators {
    pub narration: bool,
    pub ai_edit: bool,
}

pub struct LessonSession {
    pub(crate) lesson: Lesson,
    /// Parallel to `lesson.slides()`.
    pub(crate) ids: Vec<SlideId>,
    next_id: u64,
    pub(crate) nav: Navigator,
    pub(crate) settings: SessionSettings,
    pub(crate) collaborators: Collaborators,
    pub(crate) narration: NarrationCoordinator,
    widget: Option<Widget>,
    /// Bumps on every widget activation; tags flash-clear timers.
    activation: u64,
    xp: u32,
    awarded: HashSet<SlideId>,
    rng: StdRng,
    pub(crate) render_cache: HashMap<SlideId, Fragment>,
    /// Decoded playback handles for media entries.
    pub(crate) media_clips: HashMap<MediaIndex, Rc<MediaClip>>,
    pub(crate) history: UndoHistory,
    pub(crate) editor: Option<SlideEditor>,
    pub(crate) editor_generation: u64,
    started: bool,
}

impl LessonSession {
    pub fn new(lesson: Lesson, settings: SessionSettings, collaborators: Collaborators) -> Self {
        Self::with_rng(lesson, settings, collaborators, StdRng::from_entropy())
    }

    /// Like [`LessonSession::new`] with a caller-supplied shuffle source.
    pub fn with_rng(
        lesson: Lesson,
        settings: SessionSettings,
        collaborators: Collaborators,
        rng: StdRng,
    ) -> Self {
        let count = lesson.count();
        let mut session = Self {
            lesson,
            ids: Vec::with_capacity(count),
            next_id: 0,
            nav: Navigator::new(count),
            narration: NarrationCoordinator::new(collaborators.narration, &settings),
            history: UndoHistory::new(settings.undo_capacity),
            settings,
            collaborators,
            widget: None,
            activation: 0,
            xp: 0,
            awarded: HashSet::new(),
            rng,
            render_cache: HashMap::new(),
            media_clips: HashMap::new(),
            editor: None,
            editor_generation: 0,
            started: false,
        };
        for _ in 0..count {
            let id = session.allocate_id();
            session.ids.push(id);
        }
        session
    }

    // --- Accessors ---

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn current_index(&self) -> usize {
        self.nav.current()
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.lesson.get(self.nav.current())
    }

    pub fn slide_id(&self, index: usize) -> Option<SlideId> {
        self.ids.get(index).copied()
    }

    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.ids.iter().position(|i| *i == id)
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn widget(&self) -> Option<&Widget> {
        self.widget.as_ref()
    }

    pub fn is_listening(&self) -> bool {
        self.narration.is_listening()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn narration(&self) -> &NarrationCoordinator {
        &self.narration
    }

    pub(crate) fn allocate_id(&mut self) -> SlideId {
        let id = SlideId(self.next_id);
        self.next_id += 1;
        id
    }

    // --- Navigation ---

    /// Leaves the welcome screen, in listen or read mode.
    pub fn start(&mut self, listen: bool) -> Vec<Effect> {
        self.started = true;
        self.narration.set_listening(listen);
        self.goto(0)
    }

    /// Moves to `target`, clamped into range. Stops narration and videos, builds a
    /// fresh widget for the target slide and restarts narration when listening.
    pub fn goto(&mut self, target: i64) -> Vec<Effect> {
        let (index, direction) = self.nav.goto(target);
        debug!("goto {target} -> slide {index} ({direction:?})");
        let mut effects = self.narration.stop();
        effects.push(Effect::StopVideos);
        self.activate_current();
        effects.push(Effect::Render { index, direction });
        effects.extend(self.begin_narration());
        effects
    }

    /// No-op on the last slide.
    pub fn next(&mut self) -> Vec<Effect> {
        match self.nav.next_index() {
            Some(i) => self.goto(i as i64),
            None => Vec::new(),
        }
    }

    /// No-op on the first slide.
    pub fn previous(&mut self) -> Vec<Effect> {
        match self.nav.previous_index() {
            Some(i) => self.goto(i as i64),
            None => Vec::new(),
        }
    }

    /// Builds a fresh engine for the current slide, dropping the previous one.
    pub(crate) fn activate_current(&mut self) {
        self.activation += 1;
        let reward = self.settings.reward_points;
        self.widget = self
            .lesson
            .get(self.nav.current())
            .and_then(|slide| Widget::for_slide(slide, reward, &mut self.rng));
    }

    // --- Widgets ---

    /// Routes a learner action to the current widget.
    pub fn act(&mut self, action: WidgetAction) -> Vec<Effect> {
        let Some(widget) = self.widget.as_mut() else {
            debug!("Ignoring {action:?}: current slide has no widget");
            return Vec::new();
        };
        let events = widget.apply(action);
        self.translate_widget_events(events)
    }

    fn translate_widget_events(&mut self, events: Vec<WidgetEvent>) -> Vec<Effect> {
        let index = self.nav.current();
        let mut effects = Vec::new();
        for event in events {
            match event {
                WidgetEvent::Redraw => effects.push(Effect::Refresh { index }),
                WidgetEvent::Reward(points) => effects.extend(self.award(points)),
                WidgetEvent::Celebrate => effects.push(Effect::Celebrate),
                WidgetEvent::Wrong => effects.push(Effect::WrongFlash),
                WidgetEvent::Shake => effects.push(Effect::Shake),
                WidgetEvent::FlashStarted => effects.push(Effect::Schedule {
                    timer: Timer::ClearMatchFlash {
                        activation: self.activation,
                    },
                    after: self.settings.match_flash(),
                }),
                WidgetEvent::Completed => debug!("Widget on slide {index} completed"),
            }
        }
        effects
    }

    /// Pays out once per slide for the life of the session.
    fn award(&mut self, points: u32) -> Vec<Effect> {
        let Some(id) = self.slide_id(self.nav.current()) else {
            return Vec::new();
        };
        if !self.awarded.insert(id) {
            debug!("Slide {id:?} already rewarded");
            return Vec::new();
        }
        self.xp += points;
        vec![Effect::RewardAwarded {
            points,
            total: self.xp,
        }]
    }

    // --- Timers & async results ---

    /// A scheduled timer fired. Stale timers are ignored.
    pub fn fire(&mut self, timer: Timer) -> Vec<Effect> {
        match timer {
            Timer::AutoAdvance { generation } => {
                if self.narration.auto_advance_due(generation) {
                    self.next()
                } else {
                    debug!("Ignoring stale auto-advance from generation {generation}");
                    Vec::new()
                }
            }
            Timer::ClearMatchFlash { activation } => {
                if activation != self.activation {
                    return Vec::new();
                }
                match self.widget.as_mut() {
                    Some(Widget::Matching(engine)) => {
                        let events = engine.clear_flash();
                        self.translate_widget_events(events)
                    }
                    _ => Vec::new(),
                }
            }
        }
    }

    pub fn audio_fetched(&mut self, ticket: Ticket, result: Result<MediaClip>) -> Vec<Effect> {
        self.narration.audio_fetched(ticket, result)
    }

    pub fn playback_ended(&mut self, ticket: Ticket) -> Vec<Effect> {
        self.narration.playback_ended(ticket)
    }

    pub fn video_ended(&mut self, ticket: Ticket) -> Vec<Effect> {
        self.narration.video_ended(ticket)
    }

    /// Result of probing the remote narration backend.
    pub fn probe_finished(&mut self, available: bool) -> Vec<Effect> {
        let first = self.upcoming_from(0, self.settings.prefetch_ahead);
        self.narration.probe_finished(available, first)
    }

    // --- Narration ---

    pub fn set_listening(&mut self, listen: bool) -> Vec<Effect> {
        if listen == self.narration.is_listening() {
            return Vec::new();
        }
        let mut effects = self.narration.stop();
        self.narration.set_listening(listen);
        if listen {
            effects.extend(self.begin_narration());
        } else {
            effects.push(Effect::Status {
                status: ListenStatus::Off,
            });
        }
        effects
    }

    pub fn toggle_listening(&mut self) -> Vec<Effect> {
        let listen = !self.narration.is_listening();
        self.set_listening(listen)
    }

    fn begin_narration(&mut self) -> Vec<Effect> {
        if !self.narration.is_listening() {
            return Vec::new();
        }
        let index = self.nav.current();
        let Some(slide) = self.lesson.get(index) else {
            return Vec::new();
        };
        let cue = SlideCue {
            index,
            text: slide.narration_text(&self.lesson.media),
            video: slide.video_media_index(&self.lesson.media),
            holds: slide.kind().is_interactive() || self.nav.is_last(),
        };
        let upcoming = self.upcoming_from(index + 1, self.settings.prefetch_ahead);
        self.narration.begin(cue, upcoming)
    }

    fn upcoming_from(&self, start: usize, count: usize) -> Vec<(usize, String)> {
        self.lesson
            .slides()
            .iter()
            .enumerate()
            .skip(start)
            .take(count)
            .map(|(i, s)| (i, s.narration_text(&self.lesson.media)))
            .collect()
    }

    /// Text that narration would speak for slide `index`.
    pub fn narration_text(&self, index: usize) -> Option<String> {
        self.lesson
            .get(index)
            .map(|s| s.narration_text(&self.lesson.media))
    }

    // --- Media ---

    /// Decoded bytes of a media entry, cached until the entry changes.
    pub fn media_clip(&mut self, index: MediaIndex) -> Result<Rc<MediaClip>> {
        if let Some(clip) = self.media_clips.get(&index) {
            return Ok(Rc::clone(clip));
        }
        let clip = Rc::new(MediaClip::from_uri(self.lesson.media.resolve(index)?)?);
        self.media_clips.insert(index, Rc::clone(&clip));
        Ok(clip)
    }

    // --- Rendering ---

    /// Renders the current slide with its live widget state.
    pub fn render_current(&mut self, direction: Direction) -> Result<Fragment> {
        let index = self.nav.current();
        self.render_slide(index, direction)
    }

    /// Renders slide `index`. Content and milestone bodies are cached per slide id.
    pub fn render_slide(&mut self, index: usize, direction: Direction) -> Result<Fragment> {
        let slide = self
            .lesson
            .get(index)
            .ok_or_else(|| LessonError::InvalidOperation(format!("no slide at index {index}")))?;
        let widget = if index == self.nav.current() {
            self.widget.as_ref()
        } else {
            None
        };
        let ctx = SlideContext {
            media: &self.lesson.media,
            widget,
            xp: self.xp,
        };
        let cacheable = matches!(slide.kind(), SlideKind::Content | SlideKind::Milestone);
        let id = self.ids[index];
        let cached = if cacheable {
            self.render_cache.get(&id).cloned()
        } else {
            None
        };
        let body = match cached {
            Some(body) => body,
            None => {
                let body = html::render_slide_body(slide, ctx)?;
                if cacheable {
                    self.render_cache.insert(id, body.clone());
                }
                body
            }
        };
        html::wrap_slide(slide, index, direction, &body)
    }

    pub fn render_chrome(&self) -> Result<Fragment> {
        html::render_chrome(
            &self.lesson,
            ChromeState {
                current: self.nav.current(),
                xp: self.xp,
                listening: self.narration.is_listening(),
            },
        )
    }

    pub fn render_welcome(&self) -> Result<Fragment> {
        html::render_welcome(&self.lesson)
    }
}
