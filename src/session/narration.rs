//! Narration coordinator.
//!
//! Decides between the remote text-to-speech backend and on-device speech,
//! caches fetched audio per slide index, pre-fetches upcoming slides and sequences
//! playback, video hand-off and auto-advance. It never performs I/O itself; it
//! returns [`Effect`]s and is told about results.
//!
//! Staleness is tracked with counters instead of cancelling requests:
//! * `generation` bumps on every stop (navigation, listen off, edits). Playback
//!   tickets and auto-advance timers from an older generation are ignored.
//! * `cache_epoch` bumps when the cache is cleared wholesale. Fetches started in an
//!   older epoch are dropped on arrival because their slide index may now point at
//!   different content.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, warn};

use super::effects::{AudioRequest, Effect, ListenStatus, Ticket, Timer};
use crate::config::SessionSettings;
use crate::errors::{LessonError, Result};
use crate::models::media::{MediaClip, MediaIndex};

/// Availability of the remote narration backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// No credentials. Local speech only.
    Unconfigured,
    /// Configured but not confirmed yet.
    Untested,
    Available,
    /// A call failed. Stays unavailable for the rest of the session.
    Unavailable,
}

/// What the coordinator needs to know about the slide being narrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideCue {
    pub index: usize,
    pub text: String,
    /// Media index of the slide's video, if it has one.
    pub video: Option<MediaIndex>,
    /// Interactive or last slides never auto-advance.
    pub holds: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    slide: usize,
    epoch: u64,
    prefetch: bool,
}

#[derive(Debug)]
pub struct NarrationCoordinator {
    listening: bool,
    generation: u64,
    remote: RemoteState,
    cache: HashMap<usize, Rc<MediaClip>>,
    cache_epoch: u64,
    pending: HashMap<Ticket, PendingFetch>,
    next_ticket: Ticket,
    cue: Option<SlideCue>,
    lookahead: Vec<(usize, String)>,
    /// Slide whose on-demand audio the current narration is waiting for.
    waiting_for: Option<usize>,
    playing: Option<Ticket>,
    awaiting_video: Option<Ticket>,
    auto_advance_delay: Duration,
    single_chunk_below: usize,
    chunk_max: usize,
}

impl NarrationCoordinator {
    pub fn new(remote_configured: bool, settings: &SessionSettings) -> Self {
        Self {
            listening: false,
            generation: 0,
            remote: if remote_configured {
                RemoteState::Untested
            } else {
                RemoteState::Unconfigured
            },
            cache: HashMap::new(),
            cache_epoch: 0,
            pending: HashMap::new(),
            next_ticket: 1,
            cue: None,
            lookahead: Vec::new(),
            waiting_for: None,
            playing: None,
            awaiting_video: None,
            auto_advance_delay: settings.auto_advance_delay(),
            single_chunk_below: settings.speech_single_chunk_below,
            chunk_max: settings.speech_chunk_max,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn remote_state(&self) -> RemoteState {
        self.remote
    }

    pub fn is_cached(&self, slide: usize) -> bool {
        self.cache.contains_key(&slide)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    fn ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    /// Stops whatever is playing and invalidates outstanding tickets and timers.
    pub fn stop(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.cue = None;
        self.waiting_for = None;
        self.playing = None;
        self.awaiting_video = None;
        vec![Effect::StopAudio]
    }

    /// Starts narrating `cue`. `upcoming` lists the next slides to pre-fetch.
    pub fn begin(&mut self, cue: SlideCue, upcoming: Vec<(usize, String)>) -> Vec<Effect> {
        if !self.listening {
            return Vec::new();
        }
        let slide = cue.index;
        self.cue = Some(cue);
        self.lookahead = upcoming;

        let mut effects = if self.cache.contains_key(&slide) {
            self.play(slide)
        } else {
            match self.remote {
                RemoteState::Unconfigured | RemoteState::Unavailable => self.speak_local(),
                RemoteState::Untested | RemoteState::Available => {
                    self.waiting_for = Some(slide);
                    let mut effects = Vec::new();
                    if !self.is_pending(slide) {
                        effects.extend(self.fetch(slide, false));
                    }
                    effects.push(Effect::Status {
                        status: ListenStatus::Loading,
                    });
                    effects
                }
            }
        };
        effects.extend(self.prefetch_lookahead());
        effects
    }

    /// Handles the result of a `FetchAudio` effect.
    pub fn audio_fetched(&mut self, ticket: Ticket, result: Result<MediaClip>) -> Vec<Effect> {
        let Some(fetch) = self.pending.remove(&ticket) else {
            debug!("Ignoring audio for unknown ticket {ticket}");
            return Vec::new();
        };
        if fetch.epoch != self.cache_epoch {
            debug!(
                "{} (slide {}, cache cleared)",
                LessonError::StaleAsyncResult("narration fetch"),
                fetch.slide
            );
            return Vec::new();
        }

        match result {
            Ok(clip) => {
                self.cache.insert(fetch.slide, Rc::new(clip));
                let mut effects = Vec::new();
                if self.listening && self.waiting_for == Some(fetch.slide) {
                    self.waiting_for = None;
                    effects = self.play(fetch.slide);
                } else if !fetch.prefetch {
                    debug!(
                        "{} (slide {} is no longer current)",
                        LessonError::StaleAsyncResult("narration fetch"),
                        fetch.slide
                    );
                }
                if self.remote == RemoteState::Untested {
                    self.remote = RemoteState::Available;
                    effects.extend(self.prefetch_lookahead());
                }
                effects
            }
            Err(e) => {
                warn!(
                    "Remote narration failed for slide {}: {}. Falling back to local speech.",
                    fetch.slide, e
                );
                self.remote = RemoteState::Unavailable;
                self.pending.clear();
                if self.listening && self.waiting_for.is_some() {
                    self.waiting_for = None;
                    self.speak_local()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Result of the one-time availability probe. When confirmed, the first
    /// slides in `first_slides` are pre-fetched.
    pub fn probe_finished(&mut self, available: bool, first_slides: Vec<(usize, String)>) -> Vec<Effect> {
        if self.remote != RemoteState::Untested {
            return Vec::new();
        }
        if !available {
            warn!("Remote narration unavailable; using local speech");
            self.remote = RemoteState::Unavailable;
            return Vec::new();
        }
        self.remote = RemoteState::Available;
        let targets: Vec<(usize, String)> = first_slides
            .into_iter()
            .filter(|(slide, _)| !self.cache.contains_key(slide) && !self.is_pending(*slide))
            .collect();
        targets
            .into_iter()
            .flat_map(|(slide, text)| self.fetch_text(slide, text, true))
            .collect()
    }

    /// The current audio or local speech finished.
    pub fn playback_ended(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.playing != Some(ticket) {
            debug!("Ignoring end of stale playback {ticket}");
            return Vec::new();
        }
        self.playing = None;
        let Some(cue) = self.cue.clone() else {
            return Vec::new();
        };

        let mut effects = vec![Effect::Status {
            status: ListenStatus::Idle,
        }];
        if let Some(media_index) = cue.video {
            let ticket = self.ticket();
            self.awaiting_video = Some(ticket);
            effects.push(Effect::PlayVideo {
                ticket,
                media_index,
            });
        } else if !cue.holds {
            effects.push(self.schedule_advance());
        }
        effects
    }

    /// The slide's video finished after a narration hand-off.
    pub fn video_ended(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.awaiting_video != Some(ticket) {
            debug!("Ignoring end of stale video {ticket}");
            return Vec::new();
        }
        self.awaiting_video = None;
        match &self.cue {
            Some(cue) if self.listening && !cue.holds => vec![self.schedule_advance()],
            _ => Vec::new(),
        }
    }

    /// True if an auto-advance timer issued under `generation` may still act.
    pub fn auto_advance_due(&self, generation: u64) -> bool {
        self.listening && generation == self.generation
    }

    /// Forgets everything known about one slide's narration: cached audio,
    /// in-flight fetches and its queued look-ahead text.
    pub fn invalidate(&mut self, slide: usize) {
        self.cache.remove(&slide);
        self.pending.retain(|_, fetch| fetch.slide != slide);
        self.lookahead.retain(|(index, _)| *index != slide);
        if self.waiting_for == Some(slide) {
            self.waiting_for = None;
        }
    }

    /// Drops every cached clip and orphans in-flight fetches.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.pending.clear();
        self.cache_epoch += 1;
    }

    // --- Internals ---

    fn is_pending(&self, slide: usize) -> bool {
        self.pending
            .values()
            .any(|p| p.slide == slide && p.epoch == self.cache_epoch)
    }

    fn fetch(&mut self, slide: usize, prefetch: bool) -> Vec<Effect> {
        let text = match (&self.cue, prefetch) {
            (Some(cue), false) if cue.index == slide => cue.text.clone(),
            _ => match self.lookahead.iter().find(|(i, _)| *i == slide) {
                Some((_, text)) => text.clone(),
                None => return Vec::new(),
            },
        };
        self.fetch_text(slide, text, prefetch)
    }

    fn fetch_text(&mut self, slide: usize, text: String, prefetch: bool) -> Vec<Effect> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let ticket = self.ticket();
        self.pending.insert(
            ticket,
            PendingFetch {
                slide,
                epoch: self.cache_epoch,
                prefetch,
            },
        );
        vec![Effect::FetchAudio(AudioRequest {
            ticket,
            slide,
            text,
            prefetch,
        })]
    }

    fn prefetch_lookahead(&mut self) -> Vec<Effect> {
        if self.remote != RemoteState::Available {
            return Vec::new();
        }
        let targets: Vec<usize> = self
            .lookahead
            .iter()
            .map(|(slide, _)| *slide)
            .filter(|slide| !self.cache.contains_key(slide) && !self.is_pending(*slide))
            .collect();
        targets
            .into_iter()
            .flat_map(|slide| self.fetch(slide, true))
            .collect()
    }

    fn play(&mut self, slide: usize) -> Vec<Effect> {
        let Some(clip) = self.cache.get(&slide).cloned() else {
            return self.speak_local();
        };
        let ticket = self.ticket();
        self.playing = Some(ticket);
        vec![
            Effect::PlayAudio { ticket, slide, clip },
            Effect::Status {
                status: ListenStatus::Playing,
            },
        ]
    }

    fn speak_local(&mut self) -> Vec<Effect> {
        let Some(cue) = &self.cue else {
            return Vec::new();
        };
        let chunks = speech_chunks(&cue.text, self.single_chunk_below, self.chunk_max);
        let ticket = self.ticket();
        self.playing = Some(ticket);
        vec![
            Effect::SpeakLocal { ticket, chunks },
            Effect::Status {
                status: ListenStatus::SpeakingLocally,
            },
        ]
    }

    fn schedule_advance(&self) -> Effect {
        Effect::Schedule {
            timer: Timer::AutoAdvance {
                generation: self.generation,
            },
            after: self.auto_advance_delay,
        }
    }
}

/// Splits text for on-device speech engines that choke on long utterances.
///
/// Text shorter than `single_below` characters is one chunk. Longer text is split
/// after sentence terminators and sentences are packed into chunks of at most
/// `max` characters. A single sentence longer than `max` stays whole.
pub fn speech_chunks(text: &str, single_below: usize, max: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() < single_below {
        return vec![text.to_string()];
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|(_, n)| n.is_whitespace()) {
            let end = i + c.len_utf8();
            sentences.push(text[start..end].trim());
            start = end;
        }
    }
    sentences.push(text[start..].trim());

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for sentence in sentences.into_iter().filter(|s| !s.is_empty()) {
        let joined_len = current.chars().count() + 1 + sentence.chars().count();
        if !current.is_empty() && joined_len > max {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
