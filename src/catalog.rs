use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EdenError;
use crate::taxonomy::{map_tags_to_categories, CategoryTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Course {
    #[default]
    All,
    Breakfast,
    #[serde(rename = "Appetizers & Salads")]
    AppetizersAndSalads,
    Soups,
    Sandwiches,
    #[serde(rename = "Entrées")]
    Entrees,
    #[serde(rename = "Side Dishes")]
    SideDishes,
    Desserts,
}

impl Course {
    /// Filter order; `All` first.
    pub const ALL: [Course; 8] = [
        Course::All,
        Course::Breakfast,
        Course::AppetizersAndSalads,
        Course::Soups,
        Course::Sandwiches,
        Course::Entrees,
        Course::SideDishes,
        Course::Desserts,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Course::All => "All",
            Course::Breakfast => "Breakfast",
            Course::AppetizersAndSalads => "Appetizers & Salads",
            Course::Soups => "Soups",
            Course::Sandwiches => "Sandwiches",
            Course::Entrees => "Entrées",
            Course::SideDishes => "Side Dishes",
            Course::Desserts => "Desserts",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Course::All => "all",
            Course::Breakfast => "breakfast",
            Course::AppetizersAndSalads => "appetizers-salads",
            Course::Soups => "soups",
            Course::Sandwiches => "sandwiches",
            Course::Entrees => "entrees",
            Course::SideDishes => "side-dishes",
            Course::Desserts => "desserts",
        }
    }

    /// Whether a recipe of course `other` passes this filter.
    pub fn admits(&self, other: Course) -> bool {
        *self == Course::All || *self == other
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Course {
    type Err = EdenError;

    /// Accepts either the display label or its slug, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Course::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s) || c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| EdenError::Config(format!("unknown course '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub course: Course,
    pub description: String,
    pub categories: Vec<CategoryTag>,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub prep_time: u32,
    pub is_quick: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_tip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<String>,
}

impl Recipe {
    /// Instructions split into steps on sentence boundaries.
    pub fn steps(&self) -> Vec<&str> {
        self.instructions
            .split(". ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn in_track(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t == track_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseTrack {
    pub id: String,
    pub title: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapShortcut {
    pub label: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservationRule {
    pub item: String,
    pub rule: String,
    pub reason: String,
}

/// Read-only recipe library. Built once at startup and shared.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    tracks: Vec<DiseaseTrack>,
    swaps: Vec<SwapShortcut>,
    preservation: Vec<PreservationRule>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<Recipe>, tracks: Vec<DiseaseTrack>) -> Self {
        Self {
            recipes,
            tracks,
            swaps: Vec::new(),
            preservation: Vec::new(),
        }
    }

    /// The library shipped with the application.
    pub fn seeded() -> Self {
        Self {
            recipes: seed_recipes(),
            tracks: seed_tracks(),
            swaps: seed_swaps(),
            preservation: seed_preservation_rules(),
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn by_course(&self, course: Course) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| course.admits(r.course)).collect()
    }

    pub fn for_track(&self, track_id: &str) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.in_track(track_id)).collect()
    }

    pub fn tracks(&self) -> &[DiseaseTrack] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&DiseaseTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn featured_swaps(&self) -> &[SwapShortcut] {
        &self.swaps
    }

    pub fn preservation_rules(&self) -> &[PreservationRule] {
        &self.preservation
    }
}

#[allow(clippy::too_many_arguments)]
fn recipe(
    id: &str,
    name: &str,
    course: Course,
    prep_time: u32,
    description: &str,
    tags: &[&str],
    ingredients: &[&str],
    instructions: &str,
    health_tip: Option<&str>,
    tracks: &[&str],
) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: name.to_string(),
        course,
        description: description.to_string(),
        categories: map_tags_to_categories(tags),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        instructions: instructions.to_string(),
        prep_time,
        is_quick: prep_time <= 30,
        health_tip: health_tip.map(str::to_string),
        tracks: tracks.iter().map(|s| s.to_string()).collect(),
    }
}

fn seed_recipes() -> Vec<Recipe> {
    vec![
        recipe(
            "REC_001",
            "Banana Crumb Muffins",
            Course::Breakfast,
            15,
            "Sweetened with ripe bananas and Sucanat.",
            &["Fruit", "Grain", "Nut"],
            &[
                "Whole wheat pastry flour",
                "Baking powder",
                "Baking soda",
                "Cinnamon",
                "Salt",
                "Ripe bananas",
                "Nondairy milk",
                "Vanilla extract",
                "Walnuts",
                "Sucanat",
                "Raw oats",
            ],
            "Preheat oven to 375°F. Mix dry ingredients in a large bowl. Separately mash bananas with milk and vanilla. Combine wet and dry. Add walnuts. Top with cinnamon and oats. Bake for 18-20 mins.",
            Some("Complex carbohydrates in their natural state are extremely good for you."),
            &["diabetes", "cancer"],
        ),
        recipe(
            "REC_014",
            "Kale & Apple Crunch Salad",
            Course::AppetizersAndSalads,
            10,
            "Massaged kale with crisp apple and a date-mustard dressing.",
            &["Leaf", "Fruit", "Nut"],
            &["Kale", "Apple", "Lemon juice", "Dijon mustard", "Dates", "Pumpkin seeds"],
            "Strip kale from the stems and massage with lemon juice. Blend dates and mustard with water into a dressing. Toss kale with sliced apple and dressing. Top with pumpkin seeds.",
            Some("Dark leafy greens are the most nutrient-dense foods per calorie."),
            &["heart", "cancer"],
        ),
        recipe(
            "REC_027",
            "Red Lentil Harvest Soup",
            Course::Soups,
            35,
            "A hearty, oil-free soup of lentils and root vegetables.",
            &["Legume", "Root", "Leaf"],
            &["Red lentils", "Carrots", "Onion", "Garlic", "Cumin", "Vegetable broth", "Spinach"],
            "Water sauté onion and garlic. Add carrots, cumin, lentils and broth. Simmer for 20 mins until lentils break down. Stir in spinach before serving.",
            Some("Legumes deliver plant protein together with the fiber animal protein lacks."),
            &["heart", "diabetes"],
        ),
        recipe(
            "REC_061",
            "Veggie Fajita Wraps",
            Course::Entrees,
            25,
            "A rainbow of sautéed peppers and mushrooms.",
            &["Flower", "Fruit", "Grain", "Leaf", "Legume", "Mushroom", "Nut", "Root"],
            &[
                "Onion",
                "Garlic",
                "Bell peppers",
                "Broccoli",
                "Mushrooms",
                "Zucchini",
                "Corn",
                "Black beans",
                "Tortillas",
                "Avocado",
                "Salsa",
                "Lemon pepper",
            ],
            "Water sauté garlic and onion. Add peppers, broccoli, and mushrooms. Season with lemon pepper. Serve in warm tortillas with avocado and salsa.",
            Some("Antioxidants are why colorful foods are nutrient-rich."),
            &["heart", "cancer", "diabetes"],
        ),
        recipe(
            "REC_088",
            "Roasted Sweet Potato Wedges",
            Course::SideDishes,
            40,
            "Crisp wedges roasted without a drop of oil.",
            &["Root"],
            &["Sweet potatoes", "Smoked paprika", "Garlic powder"],
            "Preheat oven to 425°F. Cut sweet potatoes into wedges. Toss with paprika and garlic powder. Roast on parchment for 30 mins, turning once.",
            None,
            &["diabetes"],
        ),
        recipe(
            "REC_102",
            "Chocolate Banana Nice Cream",
            Course::Desserts,
            5,
            "Frozen bananas blended into a soft-serve treat.",
            &["Fruit", "Flower"],
            &["Frozen bananas", "Cocoa powder", "Nondairy milk"],
            "Blend frozen bananas with cocoa. Add milk a splash at a time until smooth. Serve immediately.",
            Some("Fruit satisfies a sweet tooth with fiber intact."),
            &[],
        ),
    ]
}

fn seed_tracks() -> Vec<DiseaseTrack> {
    let track = |id: &str, title: &str, description: &str, impact: &str| DiseaseTrack {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        impact: impact.to_string(),
    };
    vec![
        track(
            "heart",
            "Heart Health",
            "Focus on zero-cholesterol fiber sources to reverse arterial plaque.",
            "WFPB diets eliminate dietary cholesterol and reduce saturated fat intake significantly.",
        ),
        track(
            "cancer",
            "Cancer Prevention",
            "Maximize antioxidant and fiber intake to lower cellular oxidative stress.",
            "Dietary fiber lowers colon cancer risk. Cruciferous veg regulate protective hormones.",
        ),
        track(
            "diabetes",
            "Diabetes Control",
            "Stabilize blood sugar through complex, high-fiber carbohydrates.",
            "Natural plant starches prevent the insulin spikes caused by processed sugars.",
        ),
    ]
}

fn seed_swaps() -> Vec<SwapShortcut> {
    [
        ("Eggs (Baking)", "🥚"),
        ("Cooking Oil", "🫗"),
        ("White Sugar", "🍬"),
        ("Butter", "🧈"),
        ("Cow's Milk", "🥛"),
        ("Mayonnaise", "🧴"),
    ]
    .iter()
    .map(|(label, icon)| SwapShortcut {
        label: label.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}

fn seed_preservation_rules() -> Vec<PreservationRule> {
    vec![
        PreservationRule {
            item: "Corn".to_string(),
            rule: "Chill immediately.".to_string(),
            reason: "Loses 50% of sweetness in 1 day at room temp.".to_string(),
        },
        PreservationRule {
            item: "Asparagus".to_string(),
            rule: "Refrigerate.".to_string(),
            reason: "Loses 50% of Vitamin C in 2 days at room temp.".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seeded_ids_are_unique_and_categories_non_empty() {
        let catalog = RecipeCatalog::seeded();
        let ids: HashSet<&str> = catalog.recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.recipes().len());
        for recipe in catalog.recipes() {
            assert!(!recipe.categories.is_empty(), "{} has no categories", recipe.id);
            assert_ne!(recipe.course, Course::All, "{} uses the synthetic course", recipe.id);
        }
    }

    #[test]
    fn test_seeded_track_references_exist() {
        let catalog = RecipeCatalog::seeded();
        for recipe in catalog.recipes() {
            for track in &recipe.tracks {
                assert!(
                    catalog.track(track).is_some(),
                    "{} references unknown track {}",
                    recipe.id,
                    track
                );
            }
        }
    }

    #[test]
    fn test_fajita_wraps_cover_all_eight_groups() {
        let catalog = RecipeCatalog::seeded();
        let wraps = catalog.get("REC_061").unwrap();
        assert_eq!(wraps.categories.len(), 8);
        assert_eq!(wraps.categories[0], CategoryTag::Flowers);
    }

    #[test]
    fn test_course_filter() {
        let catalog = RecipeCatalog::seeded();
        assert_eq!(catalog.by_course(Course::All).len(), catalog.recipes().len());
        let breakfast = catalog.by_course(Course::Breakfast);
        assert!(breakfast.iter().all(|r| r.course == Course::Breakfast));
        assert!(breakfast.iter().any(|r| r.id == "REC_001"));
        assert!(catalog.by_course(Course::Sandwiches).is_empty());
    }

    #[test]
    fn test_track_filter() {
        let catalog = RecipeCatalog::seeded();
        let heart: Vec<&str> = catalog.for_track("heart").iter().map(|r| r.id.as_str()).collect();
        assert!(heart.contains(&"REC_061"));
        assert!(!heart.contains(&"REC_001"));
        assert!(catalog.for_track("unknown").is_empty());
    }

    #[test]
    fn test_steps_split_on_sentences() {
        let catalog = RecipeCatalog::seeded();
        let wraps = catalog.get("REC_061").unwrap();
        let steps = wraps.steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], "Water sauté garlic and onion");
        assert!(steps[3].ends_with("salsa."));
    }

    #[test]
    fn test_course_parsing() {
        assert_eq!("Entrées".parse::<Course>().unwrap(), Course::Entrees);
        assert_eq!("side-dishes".parse::<Course>().unwrap(), Course::SideDishes);
        assert_eq!("appetizers & salads".parse::<Course>().unwrap(), Course::AppetizersAndSalads);
        assert!("brunch".parse::<Course>().is_err());
    }

    #[test]
    fn test_course_serializes_as_label() {
        let json = serde_json::to_string(&Course::AppetizersAndSalads).unwrap();
        assert_eq!(json, "\"Appetizers & Salads\"");
    }

    #[test]
    fn test_supplementary_tables() {
        let catalog = RecipeCatalog::seeded();
        assert_eq!(catalog.featured_swaps().len(), 6);
        assert_eq!(catalog.preservation_rules()[0].item, "Corn");
    }
}
