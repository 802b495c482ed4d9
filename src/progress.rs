use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::Result;
use crate::taxonomy::CategoryTag;

/// Which of the eight food groups have been eaten today.
///
/// Always holds exactly one flag per [`CategoryTag`]. Persisted as a JSON
/// object keyed by the canonical tag names; on restore, missing keys read as
/// `false` and unknown keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "HashMap<String, bool>", into = "BTreeMap<CategoryTag, bool>")]
pub struct DailyProgress {
    flags: [bool; 8],
}

impl DailyProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_harvested(&self, tag: CategoryTag) -> bool {
        self.flags[tag.index()]
    }

    pub fn toggle(&mut self, tag: CategoryTag) {
        let flag = &mut self.flags[tag.index()];
        *flag = !*flag;
    }

    /// Toggle by canonical name. Fails with `InvalidCategory` on anything
    /// that is not one of the eight tag names.
    pub fn toggle_named(&mut self, name: &str) -> Result<CategoryTag> {
        let tag: CategoryTag = name.parse()?;
        self.toggle(tag);
        Ok(tag)
    }

    /// Marks every tag named by `labels` (case-insensitive) as harvested.
    /// A scan only adds: flags are never cleared and unmatched labels are
    /// skipped. Returns the tags that flipped from false to true.
    pub fn apply_scan<S: AsRef<str>>(&mut self, labels: &[S]) -> Vec<CategoryTag> {
        let mut newly_set = Vec::new();
        for label in labels {
            match CategoryTag::from_label(label.as_ref()) {
                Some(tag) => {
                    if !self.flags[tag.index()] {
                        self.flags[tag.index()] = true;
                        newly_set.push(tag);
                    }
                }
                None => debug!(label = label.as_ref(), "ignoring unrecognised scan label"),
            }
        }
        newly_set
    }

    pub fn reset(&mut self) {
        self.flags = [false; 8];
    }

    /// The garden score: number of groups harvested, 0..=8.
    pub fn score(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryTag, bool)> + '_ {
        CategoryTag::ALL.iter().map(move |tag| (*tag, self.flags[tag.index()]))
    }
}

impl From<HashMap<String, bool>> for DailyProgress {
    fn from(map: HashMap<String, bool>) -> Self {
        let mut progress = DailyProgress::default();
        for (key, value) in map {
            if let Ok(tag) = key.parse::<CategoryTag>() {
                progress.flags[tag.index()] = value;
            }
        }
        progress
    }
}

impl From<DailyProgress> for BTreeMap<CategoryTag, bool> {
    fn from(progress: DailyProgress) -> Self {
        progress.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdenError;
    use rand::Rng;

    #[test]
    fn test_new_is_all_false() {
        let progress = DailyProgress::new();
        assert_eq!(progress.score(), 0);
        assert!(progress.iter().all(|(_, v)| !v));
        assert_eq!(progress.iter().count(), 8);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut progress = DailyProgress::new();
        progress.toggle(CategoryTag::Roots);
        let before = progress;
        progress.toggle(CategoryTag::Nuts);
        progress.toggle(CategoryTag::Nuts);
        assert_eq!(progress, before);
        assert!(progress.is_harvested(CategoryTag::Roots));
    }

    #[test]
    fn test_random_toggle_sequences_keep_score_consistent() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut progress = DailyProgress::new();
            let mut expected = [false; 8];
            for _ in 0..rng.gen_range(0..40) {
                let idx = rng.gen_range(0..8);
                progress.toggle(CategoryTag::ALL[idx]);
                expected[idx] = !expected[idx];
            }
            assert_eq!(progress.score(), expected.iter().filter(|f| **f).count());
            for (tag, value) in progress.iter() {
                assert_eq!(value, expected[tag.index()]);
            }
        }
    }

    #[test]
    fn test_toggle_named_rejects_unknown() {
        let mut progress = DailyProgress::new();
        let err = progress.toggle_named("Seeds").unwrap_err();
        assert!(matches!(err, EdenError::InvalidCategory(_)));
        assert_eq!(progress.score(), 0);

        assert_eq!(progress.toggle_named("Leaves").unwrap(), CategoryTag::Leaves);
        assert!(progress.is_harvested(CategoryTag::Leaves));
    }

    #[test]
    fn test_scan_is_case_insensitive_and_duplicate_safe() {
        let mut progress = DailyProgress::new();
        let newly = progress.apply_scan(&["fruits", "FRUITS", "grains"]);
        assert_eq!(newly, vec![CategoryTag::Fruits, CategoryTag::Grains]);
        for (tag, value) in progress.iter() {
            let expected = matches!(tag, CategoryTag::Fruits | CategoryTag::Grains);
            assert_eq!(value, expected, "{}", tag);
        }
    }

    #[test]
    fn test_scan_never_clears() {
        let mut progress = DailyProgress::new();
        progress.toggle(CategoryTag::Mushrooms);
        let newly = progress.apply_scan(&["Mushrooms", "pizza", ""]);
        assert!(newly.is_empty());
        assert!(progress.is_harvested(CategoryTag::Mushrooms));
        assert_eq!(progress.score(), 1);
    }

    #[test]
    fn test_scan_is_monotonic_for_random_states() {
        let mut rng = rand::thread_rng();
        let vocabulary = ["fruits", "Leaves", "ROOTS", "tofu", "nuts", "bread", "Flowers"];
        for _ in 0..50 {
            let mut progress = DailyProgress::new();
            for tag in CategoryTag::ALL {
                if rng.gen_bool(0.5) {
                    progress.toggle(tag);
                }
            }
            let before = progress;
            let labels: Vec<&str> = (0..rng.gen_range(0..6))
                .map(|_| vocabulary[rng.gen_range(0..vocabulary.len())])
                .collect();
            progress.apply_scan(&labels);
            assert!(progress.score() >= before.score());
            for tag in CategoryTag::ALL {
                if before.is_harvested(tag) {
                    assert!(progress.is_harvested(tag));
                }
            }
        }
    }

    #[test]
    fn test_reset() {
        let mut progress = DailyProgress::new();
        progress.apply_scan(&["fruits", "nuts", "roots"]);
        assert_eq!(progress.score(), 3);
        progress.reset();
        assert_eq!(progress, DailyProgress::new());
    }

    #[test]
    fn test_serializes_as_total_object() {
        let mut progress = DailyProgress::new();
        progress.toggle(CategoryTag::Legumes);
        let value = serde_json::to_value(progress).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 8);
        assert_eq!(object["Legumes"], serde_json::json!(true));
        assert_eq!(object["Fruits"], serde_json::json!(false));
    }

    #[test]
    fn test_restore_tolerates_partial_and_unknown_keys() {
        let progress: DailyProgress =
            serde_json::from_str(r#"{"Nuts": true, "Seeds": true}"#).unwrap();
        assert_eq!(progress.score(), 1);
        assert!(progress.is_harvested(CategoryTag::Nuts));
    }
}
