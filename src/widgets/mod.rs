//! Interactive widget engines.
//!
//! Each engine is a small state machine scoped to one activation of one slide. The
//! session builds a fresh engine whenever a widget slide becomes current and drops it
//! on navigation, so no widget state crosses slides. Engines never touch the display;
//! they report what happened as [`WidgetEvent`]s and the HTML converter renders their
//! state.

pub mod matching;
pub mod ordering;
pub mod prompt_builder;
pub mod quiz;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::slide::{Slide, SlideBody};
pub use matching::MatchingEngine;
pub use ordering::OrderingEngine;
pub use prompt_builder::PromptBuilderEngine;
pub use quiz::{QuizEngine, QuizState};

/// Something an engine wants the host to know about after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// State changed; the widget should be re-rendered.
    Redraw,
    /// The learner earned `points`. The session decides whether it is paid out.
    Reward(u32),
    /// Success animation.
    Celebrate,
    /// Wrong-answer flash.
    Wrong,
    /// Error shake on the widget container. No state change.
    Shake,
    /// A transient error state started and must be cleared by a timer.
    FlashStarted,
    /// The widget reached its terminal state.
    Completed,
}

/// A learner action routed from the display surface to the current widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WidgetAction {
    SelectOption { index: usize },
    SelectLeft { index: usize },
    SelectRight { position: usize },
    SelectPosition { position: usize },
    CheckOrder,
    ChooseChip { group: usize, chip: usize },
}

/// The engine bound to the current slide, if the slide is interactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Quiz(QuizEngine),
    Matching(MatchingEngine),
    Ordering(OrderingEngine),
    PromptBuilder(PromptBuilderEngine),
}

impl Widget {
    /// Builds a fresh engine for `slide`. Non-interactive slides get `None`.
    pub fn for_slide<R: Rng + ?Sized>(slide: &Slide, reward: u32, rng: &mut R) -> Option<Self> {
        match &slide.body {
            SlideBody::Quiz(body) => Some(Widget::Quiz(QuizEngine::new(
                body.options.len(),
                body.correct_index,
                reward,
            ))),
            SlideBody::Matching(body) => Some(Widget::Matching(MatchingEngine::new(
                body.pairs.len(),
                reward,
                rng,
            ))),
            SlideBody::Ordering(body) => Some(Widget::Ordering(OrderingEngine::new(
                body.items.len(),
                reward,
                rng,
            ))),
            SlideBody::PromptBuilder(body) => Some(Widget::PromptBuilder(
                PromptBuilderEngine::new(body.groups.iter().map(|g| g.chips.len()).collect()),
            )),
            _ => None,
        }
    }

    /// Routes `action` to the engine. Actions meant for another widget kind are ignored.
    pub fn apply(&mut self, action: WidgetAction) -> Vec<WidgetEvent> {
        match (self, action) {
            (Widget::Quiz(q), WidgetAction::SelectOption { index }) => q.select(index),
            (Widget::Matching(m), WidgetAction::SelectLeft { index }) => m.select_left(index),
            (Widget::Matching(m), WidgetAction::SelectRight { position }) => {
                m.select_right(position)
            }
            (Widget::Ordering(o), WidgetAction::SelectPosition { position }) => o.select(position),
            (Widget::Ordering(o), WidgetAction::CheckOrder) => o.check(),
            (Widget::PromptBuilder(p), WidgetAction::ChooseChip { group, chip }) => {
                p.choose(group, chip)
            }
            (_, action) => {
                log::debug!("Ignoring {action:?}: no matching widget on this slide");
                Vec::new()
            }
        }
    }

    /// True once the engine is in its terminal state. Prompt builders never are.
    pub fn is_complete(&self) -> bool {
        match self {
            Widget::Quiz(q) => q.is_answered(),
            Widget::Matching(m) => m.is_complete(),
            Widget::Ordering(o) => o.is_solved(),
            Widget::PromptBuilder(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::{QuizBody, SlideKind};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn builds_engines_only_for_interactive_slides() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in SlideKind::ALL {
            let widget = Widget::for_slide(&Slide::blank(kind), 20, &mut rng);
            assert_eq!(widget.is_some(), kind.is_interactive(), "{kind:?}");
        }
    }

    #[test]
    fn mismatched_actions_are_ignored() {
        let mut slide = Slide::blank(SlideKind::Quiz);
        slide.body = SlideBody::Quiz(QuizBody {
            options: vec!["a".into(), "b".into()],
            correct_index: 1,
            ..QuizBody::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        let mut widget = Widget::for_slide(&slide, 20, &mut rng).unwrap();
        assert!(widget.apply(WidgetAction::CheckOrder).is_empty());
        assert!(!widget.is_complete());
        assert!(widget
            .apply(WidgetAction::SelectOption { index: 1 })
            .contains(&WidgetEvent::Reward(20)));
        assert!(widget.is_complete());
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: WidgetAction =
            serde_json::from_str(r#"{"action":"choose_chip","group":0,"chip":2}"#).unwrap();
        assert_eq!(action, WidgetAction::ChooseChip { group: 0, chip: 2 });
        let action: WidgetAction = serde_json::from_str(r#"{"action":"check_order"}"#).unwrap();
        assert_eq!(action, WidgetAction::CheckOrder);
    }
}
