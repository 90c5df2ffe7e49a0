use crate::converters::html::Direction;

/// Current position within a lesson of `count` slides.
///
/// `current` is always in `[0, count - 1]`; `count` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    previous: usize,
    count: usize,
}

impl Navigator {
    pub fn new(count: usize) -> Self {
        Self {
            current: 0,
            previous: 0,
            count: count.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn previous(&self) -> usize {
        self.previous
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.count
    }

    /// Clamps `target` into range and moves there. Entry direction is forward
    /// unless the target lies before the previous position.
    pub fn goto(&mut self, target: i64) -> (usize, Direction) {
        let last = i64::try_from(self.count - 1).unwrap_or(i64::MAX);
        let index = usize::try_from(target.clamp(0, last)).unwrap_or(0);
        let direction = if index >= self.current {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.previous = self.current;
        self.current = index;
        (index, direction)
    }

    /// Index of the next slide, or `None` at the end.
    pub fn next_index(&self) -> Option<usize> {
        (!self.is_last()).then_some(self.current + 1)
    }

    /// Index of the previous slide, or `None` at the start.
    pub fn previous_index(&self) -> Option<usize> {
        self.current.checked_sub(1)
    }

    /// Follows a change in slide count, keeping `current` in range.
    pub fn set_count(&mut self, count: usize) {
        self.count = count.max(1);
        self.current = self.current.min(self.count - 1);
        self.previous = self.previous.min(self.count - 1);
    }

    /// Points at `index` without a transition, e.g. after a structural edit.
    pub fn repoint(&mut self, index: usize) {
        self.previous = self.current;
        self.current = index.min(self.count - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goto_always_clamps_into_range() {
        for count in 1..6 {
            let mut nav = Navigator::new(count);
            for target in [-100, -1, 0, 1, 2, 5, 9, i64::MAX, i64::MIN] {
                let (index, _) = nav.goto(target);
                assert!(index < count, "count {count}, target {target}");
                assert_eq!(index, nav.current());
            }
        }
    }

    #[test]
    fn direction_follows_movement() {
        let mut nav = Navigator::new(4);
        assert_eq!(nav.goto(2), (2, Direction::Forward));
        assert_eq!(nav.goto(1), (1, Direction::Backward));
        assert_eq!(nav.previous(), 2);
        assert_eq!(nav.goto(1), (1, Direction::Forward));
    }

    #[test]
    fn boundaries_have_no_neighbour() {
        let mut nav = Navigator::new(3);
        assert_eq!(nav.previous_index(), None);
        assert_eq!(nav.next_index(), Some(1));
        nav.goto(2);
        assert_eq!(nav.next_index(), None);
        assert!(nav.is_last());
    }

    #[test]
    fn shrinking_keeps_current_in_range() {
        let mut nav = Navigator::new(5);
        nav.goto(4);
        nav.set_count(2);
        assert_eq!(nav.current(), 1);
        nav.set_count(0);
        assert_eq!(nav.count(), 1);
        assert_eq!(nav.current(), 0);
    }
}
