use super::WidgetEvent;

use crate::models::slide::PromptBuilderBody;

/// Chip picker that assembles a response preview. No scoring, no terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilderEngine {
    chip_counts: Vec<usize>,
    /// One optional selection per group.
    selections: Vec<Option<usize>>,
}

impl PromptBuilderEngine {
    pub fn new(chip_counts: Vec<usize>) -> Self {
        let selections = vec![None; chip_counts.len()];
        Self {
            chip_counts,
            selections,
        }
    }

    pub fn selections(&self) -> &[Option<usize>] {
        &self.selections
    }

    pub fn is_chosen(&self, group: usize, chip: usize) -> bool {
        self.selections.get(group).copied().flatten() == Some(chip)
    }

    /// Replaces the selection of `group`.
    pub fn choose(&mut self, group: usize, chip: usize) -> Vec<WidgetEvent> {
        match self.chip_counts.get(group) {
            Some(count) if chip < *count => {
                self.selections[group] = Some(chip);
                vec![WidgetEvent::Redraw]
            }
            _ => Vec::new(),
        }
    }

    pub fn is_filled(&self) -> bool {
        !self.selections.is_empty() && self.selections.iter().all(Option::is_some)
    }

    /// The assembled response once every group has a choice. Until then the
    /// placeholder shows.
    pub fn preview(&self, body: &PromptBuilderBody) -> Option<String> {
        if !self.is_filled() {
            return None;
        }
        let parts = self
            .selections
            .iter()
            .zip(&body.groups)
            .map(|(sel, group)| sel.and_then(|i| group.chips.get(i)).map(String::as_str))
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slide::ChipGroup;

    fn body() -> PromptBuilderBody {
        PromptBuilderBody {
            groups: vec![
                ChipGroup {
                    label: "Role".into(),
                    chips: vec!["As a coach".into(), "As a critic".into()],
                },
                ChipGroup {
                    label: "Task".into(),
                    chips: vec!["review my pitch".into()],
                },
            ],
            placeholder: "Pick some chips".into(),
        }
    }

    #[test]
    fn preview_tracks_latest_choice_per_group() {
        let body = body();
        let mut engine = PromptBuilderEngine::new(vec![2, 1]);
        assert_eq!(engine.preview(&body), None);

        engine.choose(0, 0);
        engine.choose(0, 1);
        assert!(engine.is_chosen(0, 1));
        assert!(!engine.is_chosen(0, 0));
        assert_eq!(engine.preview(&body), None);

        engine.choose(1, 0);
        assert_eq!(
            engine.preview(&body).as_deref(),
            Some("As a critic, review my pitch")
        );
    }

    #[test]
    fn out_of_range_choices_are_ignored() {
        let mut engine = PromptBuilderEngine::new(vec![2]);
        assert!(engine.choose(0, 2).is_empty());
        assert!(engine.choose(1, 0).is_empty());
        assert_eq!(engine.selections(), &[None]);
    }
}
