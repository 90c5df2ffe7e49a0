use std::collections::VecDeque;

use crate::models::lesson::Lesson;
use crate::session::SlideId;

/// Deep copy of everything an edit can change.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub lesson: Lesson,
    pub ids: Vec<SlideId>,
    pub current: usize,
}

/// Bounded, one-directional undo history. When full, the oldest snapshot is
/// evicted first. There is no redo.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl UndoHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::MediaTable;
    use crate::models::slide::{Slide, SlideKind};

    fn snapshot(current: usize) -> Snapshot {
        Snapshot {
            lesson: Lesson::new(
                Some(format!("v{current}")),
                vec![Slide::blank(SlideKind::Content)],
                MediaTable::new(),
            )
            .unwrap(),
            ids: vec![SlideId(0)],
            current,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut history = UndoHistory::new(3);
        for i in 0..5 {
            history.push(snapshot(i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.pop().unwrap().current, 4);
        assert_eq!(history.pop().unwrap().current, 3);
        assert_eq!(history.pop().unwrap().current, 2);
        assert!(history.pop().is_none());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = UndoHistory::new(0);
        history.push(snapshot(0));
        assert!(history.is_empty());
    }
}
