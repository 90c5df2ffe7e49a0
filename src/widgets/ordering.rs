use rand::{seq::SliceRandom, Rng};

use super::WidgetEvent;

/// Put-the-steps-in-order exercise.
///
/// The learner swaps two positions at a time by selecting one and then another,
/// then asks for a check. The slide's item list is the correct order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingEngine {
    /// `current[position]` is the index of the item displayed at that position.
    current: Vec<usize>,
    selected: Option<usize>,
    solved: bool,
    reward: u32,
}

impl OrderingEngine {
    /// Starts from a random permutation. With more than one item the permutation
    /// is never the identity, so the exercise never starts solved.
    pub fn new<R: Rng + ?Sized>(item_count: usize, reward: u32, rng: &mut R) -> Self {
        let mut current: Vec<usize> = (0..item_count).collect();
        if item_count > 1 {
            while is_identity(&current) {
                current.shuffle(rng);
            }
        }
        Self::with_order(current, reward)
    }

    pub fn with_order(current: Vec<usize>, reward: u32) -> Self {
        Self {
            current,
            selected: None,
            solved: false,
            reward,
        }
    }

    pub fn current(&self) -> &[usize] {
        &self.current
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Selects a position, or swaps it with the already selected one.
    pub fn select(&mut self, position: usize) -> Vec<WidgetEvent> {
        if self.solved || position >= self.current.len() {
            return Vec::new();
        }
        match self.selected.take() {
            None => self.selected = Some(position),
            Some(first) if first == position => {}
            Some(first) => self.current.swap(first, position),
        }
        vec![WidgetEvent::Redraw]
    }

    /// Checks the arrangement. A wrong order only shakes; nothing changes.
    pub fn check(&mut self) -> Vec<WidgetEvent> {
        if self.solved {
            return Vec::new();
        }
        if !is_identity(&self.current) {
            return vec![WidgetEvent::Shake];
        }
        self.solved = true;
        self.selected = None;
        vec![
            WidgetEvent::Redraw,
            WidgetEvent::Reward(self.reward),
            WidgetEvent::Celebrate,
            WidgetEvent::Completed,
        ]
    }
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, v)| i == *v)
}
