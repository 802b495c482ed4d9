//! The eight whole-plant food groups a day's meals are scored against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EdenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryTag {
    Fruits,
    Grains,
    Leaves,
    Roots,
    Legumes,
    Flowers,
    Nuts,
    Mushrooms,
}

impl CategoryTag {
    /// All tags in display order.
    pub const ALL: [CategoryTag; 8] = [
        CategoryTag::Fruits,
        CategoryTag::Grains,
        CategoryTag::Leaves,
        CategoryTag::Roots,
        CategoryTag::Legumes,
        CategoryTag::Flowers,
        CategoryTag::Nuts,
        CategoryTag::Mushrooms,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CategoryTag::Fruits => "Fruits",
            CategoryTag::Grains => "Grains",
            CategoryTag::Leaves => "Leaves",
            CategoryTag::Roots => "Roots",
            CategoryTag::Legumes => "Legumes",
            CategoryTag::Flowers => "Flowers",
            CategoryTag::Nuts => "Nuts",
            CategoryTag::Mushrooms => "Mushrooms",
        }
    }

    /// Position of the tag inside [`CategoryTag::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Case-insensitive match of a free-text label (e.g. a model's answer)
    /// against the canonical names.
    pub fn from_label(label: &str) -> Option<CategoryTag> {
        let label = label.trim();
        CategoryTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(label))
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CategoryTag::Fruits => "apple",
            CategoryTag::Grains => "wheat",
            CategoryTag::Leaves => "leaf",
            CategoryTag::Roots => "carrot",
            CategoryTag::Legumes => "bean",
            CategoryTag::Flowers => "flower-2",
            CategoryTag::Nuts => "nut",
            CategoryTag::Mushrooms => "cloud",
        }
    }

    pub fn color_classes(&self) -> &'static str {
        match self {
            CategoryTag::Fruits => "bg-red-100 text-red-600 border-red-200",
            CategoryTag::Grains => "bg-amber-100 text-amber-600 border-amber-200",
            CategoryTag::Leaves => "bg-emerald-100 text-emerald-600 border-emerald-200",
            CategoryTag::Roots => "bg-orange-100 text-orange-600 border-orange-200",
            CategoryTag::Legumes => "bg-emerald-50 text-emerald-700 border-emerald-100",
            CategoryTag::Flowers => "bg-purple-100 text-purple-600 border-purple-200",
            CategoryTag::Nuts => "bg-yellow-800/10 text-yellow-800 border-yellow-200",
            CategoryTag::Mushrooms => "bg-stone-100 text-stone-600 border-stone-200",
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoryTag {
    type Err = EdenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| EdenError::InvalidCategory(s.to_string()))
    }
}

/// Maps the singular authoring spellings used when writing catalog entries
/// ("Fruit", "Grain", ...) to tags. Lookup is case-sensitive and unknown
/// spellings are dropped.
pub fn map_tags_to_categories<S: AsRef<str>>(tags: &[S]) -> Vec<CategoryTag> {
    tags.iter()
        .filter_map(|tag| match tag.as_ref() {
            "Fruit" => Some(CategoryTag::Fruits),
            "Grain" => Some(CategoryTag::Grains),
            "Leaf" => Some(CategoryTag::Leaves),
            "Root" => Some(CategoryTag::Roots),
            "Legume" => Some(CategoryTag::Legumes),
            "Flower" => Some(CategoryTag::Flowers),
            "Nut" => Some(CategoryTag::Nuts),
            "Mushroom" => Some(CategoryTag::Mushrooms),
            _ => None,
        })
        .collect()
}
