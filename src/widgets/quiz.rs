use super::WidgetEvent;

/// Quiz answer state. `Answered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Unanswered,
    Answered { selected: usize, correct: bool },
}

/// Multiple choice with exactly one attempt per activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizEngine {
    option_count: usize,
    correct_index: usize,
    reward: u32,
    state: QuizState,
}

impl QuizEngine {
    pub fn new(option_count: usize, correct_index: usize, reward: u32) -> Self {
        Self {
            option_count,
            correct_index,
            reward,
            state: QuizState::Unanswered,
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.state, QuizState::Answered { .. })
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Selects option `index`. Only the first selection counts.
    pub fn select(&mut self, index: usize) -> Vec<WidgetEvent> {
        if self.is_answered() || index >= self.option_count {
            return Vec::new();
        }
        let correct = index == self.correct_index;
        self.state = QuizState::Answered {
            selected: index,
            correct,
        };
        if correct {
            vec![
                WidgetEvent::Redraw,
                WidgetEvent::Reward(self.reward),
                WidgetEvent::Celebrate,
                WidgetEvent::Completed,
            ]
        } else {
            vec![WidgetEvent::Redraw, WidgetEvent::Wrong, WidgetEvent::Completed]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answer_rewards_once_and_locks() {
        let mut quiz = QuizEngine::new(4, 2, 20);
        let events = quiz.select(2);
        assert!(events.contains(&WidgetEvent::Reward(20)));
        assert!(events.contains(&WidgetEvent::Celebrate));
        assert_eq!(
            quiz.state(),
            QuizState::Answered {
                selected: 2,
                correct: true
            }
        );

        assert!(quiz.select(2).is_empty());
        assert!(quiz.select(0).is_empty());
    }

    #[test]
    fn wrong_answer_locks_without_reward() {
        let mut quiz = QuizEngine::new(4, 2, 20);
        let events = quiz.select(1);
        assert!(events.contains(&WidgetEvent::Wrong));
        assert!(!events.iter().any(|e| matches!(e, WidgetEvent::Reward(_))));
        assert!(quiz.select(2).is_empty());
        assert_eq!(
            quiz.state(),
            QuizState::Answered {
                selected: 1,
                correct: false
            }
        );
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut quiz = QuizEngine::new(4, 0, 20);
        assert!(quiz.select(4).is_empty());
        assert_eq!(quiz.state(), QuizState::Unanswered);
    }
}
