//! A running planner session: owns every piece of user state, persists it
//! after each mutation and routes AI completions back into it.
//!
//! Mutations are plain `&mut self` calls. AI requests are spawned as tokio
//! tasks; each posts exactly one [`AiOutcome`] to a channel that only the
//! session reads, so all state changes still happen on the caller's side.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::catalog::{Recipe, RecipeCatalog};
use crate::error::{EdenError, Result};
use crate::gateway::{HealthAnswer, NutritionAssistant, Substitution, FALLBACK_INGREDIENT_TIP};
use crate::media::EncodedImage;
use crate::planner::{MealPlanner, ShoppingItem};
use crate::progress::DailyProgress;
use crate::store::{
    load_or_default, save_value, KeyValueStore, DAILY_PROGRESS_KEY, PLANNED_RECIPES_KEY,
    SHOPPING_LIST_KEY,
};
use crate::taxonomy::CategoryTag;
use crate::view::{AiRequest, Ticket, ViewEvent, ViewState};

#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome {
    Substitution {
        ticket: Ticket,
        result: Substitution,
    },
    HealthAnswer {
        ticket: Ticket,
        answer: HealthAnswer,
    },
    MealScan {
        ticket: Ticket,
        labels: Vec<String>,
    },
    IngredientTip {
        ticket: Ticket,
        tip: String,
    },
    RecipeImage {
        ticket: Ticket,
        recipe_id: String,
        image: Option<String>,
    },
}

pub struct Session {
    catalog: Arc<RecipeCatalog>,
    progress: DailyProgress,
    planner: MealPlanner,
    view: ViewState,
    store: Box<dyn KeyValueStore>,
    assistant: Arc<dyn NutritionAssistant>,
    next_ticket: Ticket,
    pending: usize,
    outcome_tx: UnboundedSender<AiOutcome>,
    outcome_rx: UnboundedReceiver<AiOutcome>,
}

impl Session {
    /// Starts a session from whatever `store` holds. Absent or corrupt
    /// entries start empty; planned recipes the catalog no longer has are
    /// dropped along with their shopping items, as are items whose recipe is
    /// not planned. A cleaned plan is written back.
    pub fn restore(
        catalog: Arc<RecipeCatalog>,
        store: Box<dyn KeyValueStore>,
        assistant: Arc<dyn NutritionAssistant>,
    ) -> Self {
        let progress: DailyProgress = load_or_default(store.as_ref(), DAILY_PROGRESS_KEY);
        let planned: Vec<String> = load_or_default(store.as_ref(), PLANNED_RECIPES_KEY);
        let shopping: Vec<ShoppingItem> = load_or_default(store.as_ref(), SHOPPING_LIST_KEY);
        let stored_items = shopping.len();
        let mut planner = MealPlanner::from_parts(planned, shopping);
        let dropped = planner.retain_known(&catalog);
        let cleaned = !dropped.is_empty() || planner.shopping_list().len() != stored_items;

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let mut session = Self {
            catalog,
            progress,
            planner,
            view: ViewState::new(),
            store,
            assistant,
            next_ticket: 0,
            pending: 0,
            outcome_tx,
            outcome_rx,
        };
        if cleaned {
            session.persist_plan();
        }
        info!(
            score = session.progress.score(),
            planned = session.planner.planned_ids().len(),
            shopping_items = session.planner.shopping_list().len(),
            "session restored"
        );
        session
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    pub fn planner(&self) -> &MealPlanner {
        &self.planner
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }

    /// Number of spawned AI requests whose outcome has not been processed.
    pub fn pending_requests(&self) -> usize {
        self.pending
    }

    fn persist_progress(&mut self) {
        if let Err(e) = save_value(self.store.as_mut(), DAILY_PROGRESS_KEY, &self.progress) {
            warn!(error = %e, "failed to persist daily progress");
        }
    }

    fn persist_plan(&mut self) {
        let store = self.store.as_mut();
        if let Err(e) = save_value(store, PLANNED_RECIPES_KEY, self.planner.planned_ids()) {
            warn!(error = %e, "failed to persist planned recipes");
        }
        if let Err(e) = save_value(store, SHOPPING_LIST_KEY, self.planner.shopping_list()) {
            warn!(error = %e, "failed to persist shopping list");
        }
    }

    // Garden tracker

    pub fn toggle_category(&mut self, tag: CategoryTag) {
        self.progress.toggle(tag);
        self.persist_progress();
    }

    pub fn toggle_category_named(&mut self, name: &str) -> Result<CategoryTag> {
        let tag = self.progress.toggle_named(name)?;
        self.persist_progress();
        Ok(tag)
    }

    pub fn apply_scan<S: AsRef<str>>(&mut self, labels: &[S]) -> Vec<CategoryTag> {
        let newly_set = self.progress.apply_scan(labels);
        self.persist_progress();
        newly_set
    }

    pub fn reset_progress(&mut self) {
        self.progress.reset();
        self.persist_progress();
    }

    pub fn garden_score(&self) -> usize {
        self.progress.score()
    }

    // Meal plan

    fn recipe(&self, recipe_id: &str) -> Result<&Recipe> {
        self.catalog
            .get(recipe_id)
            .ok_or_else(|| EdenError::UnknownRecipe(recipe_id.to_string()))
    }

    /// Plans a catalog recipe and closes its detail view. `Ok(false)`, with
    /// nothing changed, when it was already planned.
    pub fn add_to_plan(&mut self, recipe_id: &str) -> Result<bool> {
        let catalog = Arc::clone(&self.catalog);
        let recipe = catalog
            .get(recipe_id)
            .ok_or_else(|| EdenError::UnknownRecipe(recipe_id.to_string()))?;
        let added = self.planner.add_recipe(recipe);
        if added {
            self.dispatch(ViewEvent::RecipePlanned(recipe_id.to_string()));
            self.persist_plan();
        }
        Ok(added)
    }

    pub fn remove_from_plan(&mut self, recipe_id: &str) -> bool {
        let removed = self.planner.remove_recipe(recipe_id);
        if removed {
            self.persist_plan();
        }
        removed
    }

    pub fn reset_plan(&mut self) {
        self.planner.reset_all();
        self.persist_plan();
    }

    pub fn mark_purchased(&mut self, item_id: &str, purchased: bool) -> Result<()> {
        self.planner.mark_purchased(item_id, purchased)?;
        self.persist_plan();
        Ok(())
    }

    pub fn planned_recipes(&self) -> Vec<&Recipe> {
        self.planner.planned_recipes(&self.catalog)
    }

    // Navigation

    pub fn dispatch(&mut self, event: ViewEvent) {
        let view = std::mem::take(&mut self.view);
        self.view = view.apply(event);
    }

    // AI requests

    fn begin(&mut self, request: AiRequest) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.dispatch(ViewEvent::RequestStarted { request, ticket });
        self.pending += 1;
        ticket
    }

    /// Runs `task` on the runtime. Exactly one outcome is posted: the
    /// task's own, or `fallback` if the task panicked.
    fn spawn<F, Fut>(&self, fallback: AiOutcome, task: F)
    where
        F: FnOnce(Arc<dyn NutritionAssistant>) -> Fut,
        Fut: std::future::Future<Output = AiOutcome> + Send + 'static,
    {
        let outcome_tx = self.outcome_tx.clone();
        let handle = tokio::spawn(task(Arc::clone(&self.assistant)));
        tokio::spawn(async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "assistant task failed, using fallback");
                    fallback
                }
            };
            // The receiver lives as long as the session; a send error only
            // means the session is gone.
            let _ = outcome_tx.send(outcome);
        });
    }

    /// Looks up a WFPB replacement for `query`. Blank queries are ignored.
    pub fn request_substitution(&mut self, query: &str) -> Option<Ticket> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        let ticket = self.begin(AiRequest::Substitution);
        let fallback = AiOutcome::Substitution {
            ticket,
            result: Substitution::fallback(),
        };
        self.spawn(fallback, move |assistant| async move {
            let result = assistant.fetch_substitution(&query).await;
            AiOutcome::Substitution { ticket, result }
        });
        Some(ticket)
    }

    pub fn request_health_search(&mut self, query: &str) -> Option<Ticket> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        let ticket = self.begin(AiRequest::HealthSearch);
        let fallback = AiOutcome::HealthAnswer {
            ticket,
            answer: HealthAnswer::fallback(),
        };
        self.spawn(fallback, move |assistant| async move {
            let answer = assistant.search_health_topic(&query).await;
            AiOutcome::HealthAnswer { ticket, answer }
        });
        Some(ticket)
    }

    pub fn request_meal_scan(&mut self, image: EncodedImage) -> Ticket {
        let ticket = self.begin(AiRequest::MealScan);
        let fallback = AiOutcome::MealScan {
            ticket,
            labels: Vec::new(),
        };
        self.spawn(fallback, move |assistant| async move {
            let labels = assistant.classify_meal_photo(&image).await;
            AiOutcome::MealScan { ticket, labels }
        });
        ticket
    }

    pub fn request_ingredient_tip(&mut self, ingredient: &str) -> Ticket {
        let ingredient = ingredient.to_string();
        let ticket = self.begin(AiRequest::IngredientTip);
        let fallback = AiOutcome::IngredientTip {
            ticket,
            tip: FALLBACK_INGREDIENT_TIP.to_string(),
        };
        self.spawn(fallback, move |assistant| async move {
            let tip = assistant.fetch_ingredient_tip(&ingredient).await;
            AiOutcome::IngredientTip { ticket, tip }
        });
        ticket
    }

    pub fn request_recipe_image(&mut self, recipe_id: &str) -> Result<Ticket> {
        let (name, description) = {
            let recipe = self.recipe(recipe_id)?;
            (recipe.name.clone(), recipe.description.clone())
        };
        let recipe_id = recipe_id.to_string();
        let ticket = self.begin(AiRequest::RecipeImage {
            recipe_id: recipe_id.clone(),
        });
        let fallback = AiOutcome::RecipeImage {
            ticket,
            recipe_id: recipe_id.clone(),
            image: None,
        };
        self.spawn(fallback, move |assistant| async move {
            let image = assistant.synthesize_recipe_image(&name, &description).await;
            AiOutcome::RecipeImage {
                ticket,
                recipe_id,
                image,
            }
        });
        Ok(ticket)
    }

    // Completions

    /// Applies a completed AI request. Scan labels always reach the tracker
    /// (a scan only adds evidence); everything else goes through the view
    /// state's ticket check.
    pub fn apply_outcome(&mut self, outcome: AiOutcome) {
        match outcome {
            AiOutcome::Substitution { ticket, result } => {
                self.dispatch(ViewEvent::SubstitutionReady { ticket, result })
            }
            AiOutcome::HealthAnswer { ticket, answer } => {
                self.dispatch(ViewEvent::HealthAnswerReady { ticket, answer })
            }
            AiOutcome::MealScan { ticket, labels } => {
                self.apply_scan(&labels);
                self.dispatch(ViewEvent::ScanFinished { ticket });
            }
            AiOutcome::IngredientTip { ticket, tip } => {
                self.dispatch(ViewEvent::InsightReady { ticket, tip })
            }
            AiOutcome::RecipeImage {
                ticket,
                recipe_id,
                image,
            } => self.dispatch(ViewEvent::RecipeImageReady {
                ticket,
                recipe_id,
                image,
            }),
        }
    }

    /// Waits for the next AI completion and applies it. Returns `None`
    /// straight away when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<AiOutcome> {
        if self.pending == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        self.pending -= 1;
        self.apply_outcome(outcome.clone());
        Some(outcome)
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn drain_outcomes(&mut self) -> Vec<AiOutcome> {
        let mut applied = Vec::new();
        loop {
            match self.outcome_rx.try_recv() {
                Ok(outcome) => {
                    self.pending = self.pending.saturating_sub(1);
                    self.apply_outcome(outcome.clone());
                    applied.push(outcome);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }
}
