use async_trait::async_trait;
use eden_planner::api_connection::{
    ApiConnectionError, GenerateContentRequest, GenerateContentResponse,
};
use eden_planner::catalog::{Course, RecipeCatalog};
use eden_planner::config::ModelConfig;
use eden_planner::error::EdenError;
use eden_planner::gateway::{
    ContentGenerator, GeminiAssistant, HealthAnswer, HealthSource, NutritionAssistant, Substitution,
    FALLBACK_INGREDIENT_TIP,
};
use eden_planner::media::EncodedImage;
use eden_planner::planner::ShoppingItem;
use eden_planner::session::{AiOutcome, Session};
use eden_planner::store::{
    load_or_default, save_value, FileStore, KeyValueStore, MemoryStore, DAILY_PROGRESS_KEY,
    PLANNED_RECIPES_KEY, SHOPPING_LIST_KEY,
};
use eden_planner::taxonomy::CategoryTag;
use eden_planner::view::{AiSlot, Tab, ViewEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Answers every request from its input, without any network.
struct EchoAssistant {
    scan_labels: Vec<String>,
}

impl EchoAssistant {
    fn new() -> Self {
        Self {
            scan_labels: vec!["fruits".into(), "FRUITS".into(), "grains".into()],
        }
    }
}

#[async_trait]
impl NutritionAssistant for EchoAssistant {
    async fn fetch_substitution(&self, query: &str) -> Substitution {
        Substitution {
            substitution: format!("whole-food {}", query),
            reason: "fiber".to_string(),
            how_to_use: "1:1".to_string(),
        }
    }

    async fn classify_meal_photo(&self, _image: &EncodedImage) -> Vec<String> {
        self.scan_labels.clone()
    }

    async fn search_health_topic(&self, query: &str) -> HealthAnswer {
        HealthAnswer {
            text: format!("about {}", query),
            sources: vec![HealthSource {
                title: "Study".to_string(),
                uri: "https://example.org/study".to_string(),
            }],
        }
    }

    async fn fetch_ingredient_tip(&self, ingredient: &str) -> String {
        format!("{} is good for you", ingredient)
    }

    async fn synthesize_recipe_image(&self, name: &str, _description: &str) -> Option<String> {
        Some(format!("data:image/png;base64,{}", name.len()))
    }
}

/// Fails every call the way an offline network would.
struct OfflineGenerator;

#[async_trait]
impl ContentGenerator for OfflineGenerator {
    async fn generate(
        &self,
        _model: &str,
        _request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError> {
        Err(ApiConnectionError::EmptyResponse("offline".to_string()))
    }
}

fn new_session(store: Box<dyn KeyValueStore>) -> Session {
    Session::restore(
        Arc::new(RecipeCatalog::seeded()),
        store,
        Arc::new(EchoAssistant::new()),
    )
}

fn fresh_session() -> Session {
    new_session(Box::new(MemoryStore::new()))
}

#[test]
fn test_fresh_session_is_empty() {
    let session = fresh_session();
    assert_eq!(session.garden_score(), 0);
    assert!(session.planner().planned_ids().is_empty());
    assert!(session.planner().shopping_list().is_empty());
    assert_eq!(session.view().tab, Tab::Planner);
    assert_eq!(session.pending_requests(), 0);
}

#[test]
fn test_toggle_persists_progress() {
    let mut session = fresh_session();
    session.toggle_category(CategoryTag::Leaves);
    let tag = session.toggle_category_named("Roots").unwrap();
    assert_eq!(tag, CategoryTag::Roots);
    assert_eq!(session.garden_score(), 2);

    let saved: BTreeMap<String, bool> = load_or_default(session.store(), DAILY_PROGRESS_KEY);
    assert_eq!(saved.get("Leaves"), Some(&true));
    assert_eq!(saved.get("Roots"), Some(&true));
    assert_eq!(saved.get("Fruits"), Some(&false));
}

#[test]
fn test_toggle_unknown_category_changes_nothing() {
    let mut session = fresh_session();
    let err = session.toggle_category_named("Dairy").unwrap_err();
    assert!(matches!(err, EdenError::InvalidCategory(name) if name == "Dairy"));
    assert_eq!(session.garden_score(), 0);
    assert!(session.store().get(DAILY_PROGRESS_KEY).unwrap().is_none());
}

#[test]
fn test_add_and_remove_recipe_keeps_list_in_step() {
    let mut session = fresh_session();
    session.dispatch(ViewEvent::OpenRecipe("REC_001".to_string()));

    assert!(session.add_to_plan("REC_001").unwrap());
    assert!(session.view().selected_recipe.is_none());
    assert!(session.add_to_plan("REC_014").unwrap());
    assert!(!session.add_to_plan("REC_001").unwrap());
    assert_eq!(session.planner().planned_ids(), &["REC_001".to_string(), "REC_014".to_string()]);
    assert_eq!(session.planner().shopping_list().len(), 11 + 6);

    assert!(session.remove_from_plan("REC_001"));
    assert!(!session.remove_from_plan("REC_001"));
    let names: Vec<&str> = session
        .planner()
        .shopping_list()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Kale", "Apple", "Lemon juice", "Dijon mustard", "Dates", "Pumpkin seeds"]
    );

    let saved_plan: Vec<String> = load_or_default(session.store(), PLANNED_RECIPES_KEY);
    assert_eq!(saved_plan, vec!["REC_014".to_string()]);
    let saved_list: Vec<ShoppingItem> = load_or_default(session.store(), SHOPPING_LIST_KEY);
    assert_eq!(saved_list.len(), 6);
}

#[test]
fn test_add_unknown_recipe_is_error() {
    let mut session = fresh_session();
    let err = session.add_to_plan("REC_999").unwrap_err();
    assert!(matches!(err, EdenError::UnknownRecipe(id) if id == "REC_999"));
    assert!(session.planner().planned_ids().is_empty());
}

#[test]
fn test_reset_plan_clears_both_collections() {
    let mut session = fresh_session();
    session.add_to_plan("REC_027").unwrap();
    session.reset_plan();
    assert!(session.planner().planned_ids().is_empty());
    assert!(session.planner().shopping_list().is_empty());
    let saved_list: Vec<ShoppingItem> = load_or_default(session.store(), SHOPPING_LIST_KEY);
    assert!(saved_list.is_empty());
}

#[test]
fn test_mark_purchased_survives_restore() {
    let mut session = fresh_session();
    session.add_to_plan("REC_014").unwrap();
    session.toggle_category(CategoryTag::Fruits);
    let item_id = session.planner().shopping_list()[0].id.clone();
    session.mark_purchased(&item_id, true).unwrap();

    let err = session.mark_purchased("no-such-item", true).unwrap_err();
    assert!(matches!(err, EdenError::UnknownShoppingItem(_)));

    let planner_before = session.planner().clone();
    let restored = new_session(session.into_store());
    assert_eq!(restored.planner(), &planner_before);
    assert!(restored.planner().shopping_list()[0].purchased);
    assert!(restored.progress().is_harvested(CategoryTag::Fruits));
    assert_eq!(restored.garden_score(), 1);
}

#[test]
fn test_restore_drops_recipes_missing_from_catalog() {
    let mut store = MemoryStore::new();
    let planned = vec!["REC_001".to_string(), "REC_GONE".to_string()];
    let shopping = vec![
        ShoppingItem {
            id: "a".to_string(),
            name: "Raw oats".to_string(),
            category: "Produce".to_string(),
            purchased: false,
            recipe_id: Some("REC_001".to_string()),
        },
        ShoppingItem {
            id: "b".to_string(),
            name: "Mystery".to_string(),
            category: "Produce".to_string(),
            purchased: true,
            recipe_id: Some("REC_GONE".to_string()),
        },
    ];
    save_value(&mut store, PLANNED_RECIPES_KEY, &planned).unwrap();
    save_value(&mut store, SHOPPING_LIST_KEY, &shopping).unwrap();

    let session = new_session(Box::new(store));
    assert_eq!(session.planner().planned_ids(), &["REC_001".to_string()]);
    assert_eq!(session.planner().shopping_list().len(), 1);
    assert_eq!(session.planner().shopping_list()[0].id, "a");

    let saved_plan: Vec<String> = load_or_default(session.store(), PLANNED_RECIPES_KEY);
    assert_eq!(saved_plan, vec!["REC_001".to_string()]);
}

#[test]
fn test_corrupt_entries_restore_as_empty() {
    let mut store = MemoryStore::new();
    store.set(DAILY_PROGRESS_KEY, b"{not json").unwrap();
    store.set(PLANNED_RECIPES_KEY, b"42").unwrap();
    let session = new_session(Box::new(store));
    assert_eq!(session.garden_score(), 0);
    assert!(session.planner().planned_ids().is_empty());
}

#[test]
fn test_file_store_session_round_trip() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = new_session(Box::new(FileStore::open(dir.path())));
        session.add_to_plan("REC_088").unwrap();
        session.toggle_category(CategoryTag::Mushrooms);
    }
    let session = new_session(Box::new(FileStore::open(dir.path())));
    assert_eq!(session.planner().planned_ids(), &["REC_088".to_string()]);
    assert!(session.progress().is_harvested(CategoryTag::Mushrooms));
}

#[test]
fn test_view_navigation_through_session() {
    let mut session = fresh_session();
    session.dispatch(ViewEvent::SelectCourse(Course::Breakfast));
    let visible = session.view().visible_recipes(session.catalog());
    assert!(visible.iter().all(|r| r.course == Course::Breakfast));
    assert!(!visible.is_empty());

    session.dispatch(ViewEvent::OpenTrack("heart".to_string()));
    assert_eq!(session.view().tab, Tab::Health);
    let track = session.view().track_recipes(session.catalog());
    assert!(track.iter().all(|r| r.in_track("heart")));
}

#[tokio::test]
async fn test_meal_scan_outcome_updates_tracker() {
    let mut session = fresh_session();
    let image = EncodedImage::from_bytes(b"plate", "image/jpeg");
    session.request_meal_scan(image);
    assert!(session.view().is_loading(AiSlot::Scan));
    assert_eq!(session.pending_requests(), 1);

    let outcome = session.next_outcome().await.unwrap();
    assert!(matches!(outcome, AiOutcome::MealScan { .. }));
    assert!(!session.view().is_loading(AiSlot::Scan));
    assert!(session.progress().is_harvested(CategoryTag::Fruits));
    assert!(session.progress().is_harvested(CategoryTag::Grains));
    assert_eq!(session.garden_score(), 2);

    let saved: BTreeMap<String, bool> = load_or_default(session.store(), DAILY_PROGRESS_KEY);
    assert_eq!(saved.get("Grains"), Some(&true));
    assert!(session.next_outcome().await.is_none());
}

#[tokio::test]
async fn test_only_latest_substitution_is_shown() {
    let mut session = fresh_session();
    let first = session.request_substitution("butter").unwrap();
    let second = session.request_substitution("sugar").unwrap();
    assert!(second > first);

    session.next_outcome().await.unwrap();
    session.next_outcome().await.unwrap();
    let result = session.view().exchange_result.clone().unwrap();
    assert_eq!(result.substitution, "whole-food sugar");
    assert!(!session.view().is_loading(AiSlot::Exchange));
}

#[tokio::test]
async fn test_blank_queries_are_ignored() {
    let mut session = fresh_session();
    assert!(session.request_substitution("   ").is_none());
    assert!(session.request_health_search("").is_none());
    assert_eq!(session.pending_requests(), 0);
    assert!(!session.view().is_loading(AiSlot::Exchange));
}

#[tokio::test]
async fn test_health_tip_and_image_outcomes() {
    let mut session = fresh_session();
    session.request_health_search("fiber").unwrap();
    session.request_ingredient_tip("Kale");
    session.request_recipe_image("REC_014").unwrap();
    assert_eq!(session.view().generating_image.as_deref(), Some("REC_014"));

    for _ in 0..3 {
        session.next_outcome().await.unwrap();
    }
    let answer = session.view().academy_answer.clone().unwrap();
    assert_eq!(answer.text, "about fiber");
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(session.view().ingredient_insight.as_deref(), Some("Kale is good for you"));
    assert!(session.view().generated_images.contains_key("REC_014"));
    assert!(session.view().generating_image.is_none());
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test]
async fn test_recipe_image_for_unknown_recipe_is_error() {
    let mut session = fresh_session();
    let err = session.request_recipe_image("REC_999").unwrap_err();
    assert!(matches!(err, EdenError::UnknownRecipe(_)));
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test]
async fn test_offline_assistant_falls_back() {
    let assistant = GeminiAssistant::new(OfflineGenerator, ModelConfig::default());
    let mut session = Session::restore(
        Arc::new(RecipeCatalog::seeded()),
        Box::new(MemoryStore::new()),
        Arc::new(assistant),
    );

    session.request_ingredient_tip("Kale");
    session.request_substitution("butter").unwrap();
    session.request_meal_scan(EncodedImage::from_bytes(b"plate", "image/jpeg"));
    for _ in 0..3 {
        session.next_outcome().await.unwrap();
    }

    assert_eq!(session.view().ingredient_insight.as_deref(), Some(FALLBACK_INGREDIENT_TIP));
    assert_eq!(session.view().exchange_result, Some(Substitution::fallback()));
    assert_eq!(session.garden_score(), 0);
}

#[tokio::test]
async fn test_drain_outcomes_applies_arrived_results() {
    let mut session = fresh_session();
    session.request_ingredient_tip("Oats");
    // Wait for the task to post, then drain without blocking.
    while session.pending_requests() > 0 {
        let drained = session.drain_outcomes();
        if drained.is_empty() {
            tokio::task::yield_now().await;
        }
    }
    assert_eq!(session.view().ingredient_insight.as_deref(), Some("Oats is good for you"));
}

#[test]
fn test_corrupt_plan_drops_items_of_unplanned_recipes() {
    let mut store = MemoryStore::new();
    store.set(PLANNED_RECIPES_KEY, b"42").unwrap();
    let shopping = vec![
        ShoppingItem {
            id: "k".to_string(),
            name: "Kale".to_string(),
            category: "Produce".to_string(),
            purchased: false,
            recipe_id: Some("REC_014".to_string()),
        },
        ShoppingItem {
            id: "x".to_string(),
            name: "X".to_string(),
            category: "Produce".to_string(),
            purchased: false,
            recipe_id: Some("REC_GONE".to_string()),
        },
    ];
    save_value(&mut store, SHOPPING_LIST_KEY, &shopping).unwrap();

    let mut session = new_session(Box::new(store));
    assert!(session.planner().planned_ids().is_empty());
    assert!(session.planner().shopping_list().is_empty());
    let saved_list: Vec<ShoppingItem> = load_or_default(session.store(), SHOPPING_LIST_KEY);
    assert!(saved_list.is_empty());

    session.add_to_plan("REC_014").unwrap();
    let kale = session
        .planner()
        .shopping_list()
        .iter()
        .filter(|item| item.name == "Kale")
        .count();
    assert_eq!(kale, 1);
    for item in session.planner().shopping_list() {
        let recipe_id = item.recipe_id.as_deref().unwrap();
        assert!(session.planner().is_planned(recipe_id));
    }
}

#[test]
fn test_replanning_keeps_detail_view_open() {
    let mut session = fresh_session();
    session.add_to_plan("REC_027").unwrap();
    session.dispatch(ViewEvent::OpenRecipe("REC_027".to_string()));
    assert!(!session.add_to_plan("REC_027").unwrap());
    assert_eq!(session.view().selected_recipe.as_deref(), Some("REC_027"));
}

/// Panics on every call.
struct PanickingAssistant;

#[async_trait]
impl NutritionAssistant for PanickingAssistant {
    async fn fetch_substitution(&self, _query: &str) -> Substitution {
        panic!("substitution backend exploded")
    }

    async fn classify_meal_photo(&self, _image: &EncodedImage) -> Vec<String> {
        panic!("classifier exploded")
    }

    async fn search_health_topic(&self, _query: &str) -> HealthAnswer {
        panic!("search exploded")
    }

    async fn fetch_ingredient_tip(&self, _ingredient: &str) -> String {
        panic!("tip exploded")
    }

    async fn synthesize_recipe_image(&self, _name: &str, _description: &str) -> Option<String> {
        panic!("image exploded")
    }
}

#[tokio::test]
async fn test_panicking_assistant_still_settles_requests() {
    let mut session = Session::restore(
        Arc::new(RecipeCatalog::seeded()),
        Box::new(MemoryStore::new()),
        Arc::new(PanickingAssistant),
    );
    session.request_ingredient_tip("Kale");
    session.request_substitution("butter").unwrap();
    session.request_meal_scan(EncodedImage::from_bytes(b"plate", "image/jpeg"));
    session.request_recipe_image("REC_014").unwrap();

    for _ in 0..4 {
        assert!(session.next_outcome().await.is_some());
    }
    assert_eq!(session.pending_requests(), 0);
    assert!(session.next_outcome().await.is_none());

    let view = session.view();
    assert_eq!(view.ingredient_insight.as_deref(), Some(FALLBACK_INGREDIENT_TIP));
    assert_eq!(view.exchange_result, Some(Substitution::fallback()));
    assert!(view.generating_image.is_none());
    assert!(!view.is_loading(AiSlot::Scan));
    assert_eq!(session.garden_score(), 0);
}
