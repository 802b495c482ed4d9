//! Navigation and AI-result state as explicit transitions.
//!
//! [`ViewState::apply`] is a pure `(state, event) -> state` function. AI
//! requests are bracketed by a `RequestStarted` event carrying a ticket and a
//! matching completion event. A completion is applied even if the user has
//! navigated elsewhere meanwhile, but one whose ticket is no longer the
//! latest for its slot is dropped, so an older call can never overwrite the
//! answer to a newer one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::catalog::{Course, DiseaseTrack, Recipe, RecipeCatalog};
use crate::gateway::{HealthAnswer, Substitution};

pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tab {
    Garden,
    #[default]
    Planner,
    Exchange,
    Health,
    Cooking,
}

/// Independent loading/result slots; each may have one request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiSlot {
    Exchange,
    Academy,
    Scan,
    Insight,
    RecipeImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiRequest {
    Substitution,
    HealthSearch,
    MealScan,
    IngredientTip,
    RecipeImage { recipe_id: String },
}

impl AiRequest {
    pub fn slot(&self) -> AiSlot {
        match self {
            AiRequest::Substitution => AiSlot::Exchange,
            AiRequest::HealthSearch => AiSlot::Academy,
            AiRequest::MealScan => AiSlot::Scan,
            AiRequest::IngredientTip => AiSlot::Insight,
            AiRequest::RecipeImage { .. } => AiSlot::RecipeImage,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    SelectTab(Tab),
    OpenRecipe(String),
    CloseRecipe,
    /// A recipe was added to the plan from its detail view.
    RecipePlanned(String),
    SelectCourse(Course),
    OpenTrack(String),
    CloseTrack,
    DismissInsight,
    RequestStarted { request: AiRequest, ticket: Ticket },
    SubstitutionReady { ticket: Ticket, result: Substitution },
    HealthAnswerReady { ticket: Ticket, answer: HealthAnswer },
    ScanFinished { ticket: Ticket },
    InsightReady { ticket: Ticket, tip: String },
    RecipeImageReady { ticket: Ticket, recipe_id: String, image: Option<String> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub tab: Tab,
    pub selected_recipe: Option<String>,
    pub ingredient_insight: Option<String>,
    pub active_track: Option<String>,
    pub course_filter: Course,
    pub exchange_result: Option<Substitution>,
    pub academy_answer: Option<HealthAnswer>,
    pub generating_image: Option<String>,
    pub generated_images: HashMap<String, String>,
    in_flight: HashMap<AiSlot, Ticket>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self, slot: AiSlot) -> bool {
        self.in_flight.contains_key(&slot)
    }

    /// Clears the slot if `ticket` is its latest request. Returns whether the
    /// completion is current.
    fn settle(&mut self, slot: AiSlot, ticket: Ticket) -> bool {
        if self.in_flight.get(&slot) == Some(&ticket) {
            self.in_flight.remove(&slot);
            true
        } else {
            debug!(?slot, ticket, "dropping superseded completion");
            false
        }
    }

    pub fn apply(mut self, event: ViewEvent) -> Self {
        match event {
            ViewEvent::SelectTab(tab) => self.tab = tab,
            ViewEvent::OpenRecipe(id) => self.selected_recipe = Some(id),
            ViewEvent::CloseRecipe | ViewEvent::RecipePlanned(_) => self.selected_recipe = None,
            ViewEvent::SelectCourse(course) => self.course_filter = course,
            ViewEvent::OpenTrack(id) => {
                self.tab = Tab::Health;
                self.active_track = Some(id);
            }
            ViewEvent::CloseTrack => self.active_track = None,
            ViewEvent::DismissInsight => self.ingredient_insight = None,
            ViewEvent::RequestStarted { request, ticket } => {
                if let AiRequest::RecipeImage { recipe_id } = &request {
                    self.generating_image = Some(recipe_id.clone());
                }
                self.in_flight.insert(request.slot(), ticket);
            }
            ViewEvent::SubstitutionReady { ticket, result } => {
                if self.settle(AiSlot::Exchange, ticket) {
                    self.exchange_result = Some(result);
                }
            }
            ViewEvent::HealthAnswerReady { ticket, answer } => {
                if self.settle(AiSlot::Academy, ticket) {
                    self.academy_answer = Some(answer);
                }
            }
            ViewEvent::ScanFinished { ticket } => {
                self.settle(AiSlot::Scan, ticket);
            }
            ViewEvent::InsightReady { ticket, tip } => {
                if self.settle(AiSlot::Insight, ticket) {
                    self.ingredient_insight = Some(tip);
                }
            }
            ViewEvent::RecipeImageReady {
                ticket,
                recipe_id,
                image,
            } => {
                // Images are keyed by recipe, so a late one never overwrites
                // a different recipe's picture; keep it either way.
                if let Some(url) = image {
                    self.generated_images.insert(recipe_id, url);
                }
                if self.settle(AiSlot::RecipeImage, ticket) {
                    self.generating_image = None;
                }
            }
        }
        self
    }

    /// Catalog entries passing the course filter.
    pub fn visible_recipes<'a>(&self, catalog: &'a RecipeCatalog) -> Vec<&'a Recipe> {
        catalog.by_course(self.course_filter)
    }

    /// Recipes of the active disease track; empty when no track is open.
    pub fn track_recipes<'a>(&self, catalog: &'a RecipeCatalog) -> Vec<&'a Recipe> {
        match &self.active_track {
            Some(id) => catalog.for_track(id),
            None => Vec::new(),
        }
    }

    pub fn active_track_info<'a>(&self, catalog: &'a RecipeCatalog) -> Option<&'a DiseaseTrack> {
        self.active_track.as_deref().and_then(|id| catalog.track(id))
    }

    pub fn selected_recipe_info<'a>(&self, catalog: &'a RecipeCatalog) -> Option<&'a Recipe> {
        self.selected_recipe.as_deref().and_then(|id| catalog.get(id))
    }
}
