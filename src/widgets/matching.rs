use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};

use super::WidgetEvent;

/// A rejected pairing, shown as an error until the flash timer clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongPair {
    pub left: usize,
    pub right_position: usize,
}

/// Match-the-pairs exercise.
///
/// Left items stay in source order; right items are shown in a shuffled order.
/// While a wrong pair is flashing, clicks are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingEngine {
    /// `right_order[position]` is the pair index displayed at that right-hand position.
    right_order: Vec<usize>,
    selected_left: Option<usize>,
    /// left index -> right position it was matched with.
    matched: BTreeMap<usize, usize>,
    flash: Option<WrongPair>,
    complete: bool,
    reward: u32,
}

impl MatchingEngine {
    pub fn new<R: Rng + ?Sized>(pair_count: usize, reward: u32, rng: &mut R) -> Self {
        let mut right_order: Vec<usize> = (0..pair_count).collect();
        right_order.shuffle(rng);
        Self::with_right_order(right_order, reward)
    }

    /// Builds an engine with a fixed right-hand order.
    pub fn with_right_order(right_order: Vec<usize>, reward: u32) -> Self {
        Self {
            right_order,
            selected_left: None,
            matched: BTreeMap::new(),
            flash: None,
            complete: false,
            reward,
        }
    }

    pub fn pair_count(&self) -> usize {
        self.right_order.len()
    }

    pub fn right_order(&self) -> &[usize] {
        &self.right_order
    }

    pub fn selected_left(&self) -> Option<usize> {
        self.selected_left
    }

    pub fn matched(&self) -> &BTreeMap<usize, usize> {
        &self.matched
    }

    pub fn flash(&self) -> Option<WrongPair> {
        self.flash
    }

    pub fn is_left_matched(&self, left: usize) -> bool {
        self.matched.contains_key(&left)
    }

    pub fn is_right_matched(&self, position: usize) -> bool {
        self.matched.values().any(|p| *p == position)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn select_left(&mut self, left: usize) -> Vec<WidgetEvent> {
        if self.complete
            || self.flash.is_some()
            || left >= self.pair_count()
            || self.is_left_matched(left)
        {
            return Vec::new();
        }
        self.selected_left = Some(left);
        vec![WidgetEvent::Redraw]
    }

    pub fn select_right(&mut self, position: usize) -> Vec<WidgetEvent> {
        if self.complete || self.flash.is_some() || position >= self.pair_count() {
            return Vec::new();
        }
        let Some(left) = self.selected_left else {
            return Vec::new();
        };
        if self.is_right_matched(position) {
            return Vec::new();
        }
        self.selected_left = None;

        if self.right_order[position] != left {
            self.flash = Some(WrongPair {
                left,
                right_position: position,
            });
            return vec![
                WidgetEvent::Redraw,
                WidgetEvent::Wrong,
                WidgetEvent::FlashStarted,
            ];
        }

        self.matched.insert(left, position);
        if self.matched.len() < self.pair_count() {
            return vec![WidgetEvent::Redraw];
        }
        self.complete = true;
        vec![
            WidgetEvent::Redraw,
            WidgetEvent::Reward(self.reward),
            WidgetEvent::Celebrate,
            WidgetEvent::Completed,
        ]
    }

    /// Ends the wrong-pair flash. `matched` is never touched by a wrong pair.
    pub fn clear_flash(&mut self) -> Vec<WidgetEvent> {
        match self.flash.take() {
            Some(_) => vec![WidgetEvent::Redraw],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn engine() -> MatchingEngine {
        // Position 0 shows pair 3, position 1 shows pair 0, ...
        MatchingEngine::with_right_order(vec![3, 0, 4, 1, 2], 20)
    }

    fn position_of(engine: &MatchingEngine, pair: usize) -> usize {
        engine.right_order().iter().position(|p| *p == pair).unwrap()
    }

    #[test]
    fn completes_once_after_wrong_attempts() {
        let mut m = engine();
        let mut rewards = 0;

        m.select_left(0);
        let events = m.select_right(0);
        assert!(events.contains(&WidgetEvent::FlashStarted));
        assert!(m.matched().is_empty());
        m.clear_flash();

        for left in 0..5 {
            m.select_left(left);
            let pos = position_of(&m, left);
            let events = m.select_right(pos);
            rewards += events
                .iter()
                .filter(|e| matches!(e, WidgetEvent::Reward(_)))
                .count();
        }
        assert!(m.is_complete());
        assert_eq!(rewards, 1);
        assert!(m.select_left(0).is_empty());
    }

    #[test]
    fn clicks_during_flash_are_ignored() {
        let mut m = engine();
        m.select_left(1);
        m.select_right(0);
        assert!(m.flash().is_some());

        assert!(m.select_left(2).is_empty());
        assert!(m.select_right(3).is_empty());
        assert_eq!(m.selected_left(), None);

        assert_eq!(m.clear_flash(), vec![WidgetEvent::Redraw]);
        assert!(m.clear_flash().is_empty());
        assert_eq!(m.select_left(2), vec![WidgetEvent::Redraw]);
    }

    #[test]
    fn right_click_without_selection_is_a_no_op() {
        let mut m = engine();
        assert!(m.select_right(1).is_empty());
        m.select_left(0);
        m.select_right(position_of(&engine(), 0));
        m.select_left(1);
        // Already matched right position cannot be reused.
        assert!(m.select_right(position_of(&engine(), 0)).is_empty());
        assert!(m.select_left(0).is_empty());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let m = MatchingEngine::new(5, 20, &mut rng);
        let mut order = m.right_order().to_vec();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
