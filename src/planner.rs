use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::catalog::{Recipe, RecipeCatalog};
use crate::error::{EdenError, Result};

/// Every generated shopping item lands in this bucket.
pub const DEFAULT_SHOPPING_CATEGORY: &str = "Produce";

/// Recipes per week the plan progress bar counts towards.
pub const WEEKLY_PLAN_TARGET: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub purchased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
}

impl ShoppingItem {
    fn for_ingredient(ingredient: &str, recipe_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: ingredient.to_string(),
            category: DEFAULT_SHOPPING_CATEGORY.to_string(),
            purchased: false,
            recipe_id: Some(recipe_id.to_string()),
        }
    }
}

/// Planned recipes and the shopping list derived from them.
///
/// The list is expanded from a recipe's ingredients when it is planned and
/// retracted when it is removed; both collections always change together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealPlanner {
    planned: Vec<String>,
    shopping: Vec<ShoppingItem>,
}

impl MealPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a planner from persisted parts. Duplicate plan ids are
    /// collapsed, keeping the first occurrence. Items generated for a recipe
    /// that is not in the plan are dropped; items without a recipe stay.
    pub fn from_parts(planned: Vec<String>, mut shopping: Vec<ShoppingItem>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(planned.len());
        for id in planned {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        shopping.retain(|item| match &item.recipe_id {
            Some(recipe_id) if !deduped.contains(recipe_id) => {
                warn!(
                    item = %item.name,
                    %recipe_id,
                    "dropping shopping item of an unplanned recipe"
                );
                false
            }
            _ => true,
        });
        Self {
            planned: deduped,
            shopping,
        }
    }

    pub fn planned_ids(&self) -> &[String] {
        &self.planned
    }

    pub fn shopping_list(&self) -> &[ShoppingItem] {
        &self.shopping
    }

    pub fn is_planned(&self, recipe_id: &str) -> bool {
        self.planned.iter().any(|id| id == recipe_id)
    }

    /// Plans `recipe` and appends one shopping item per ingredient, in
    /// ingredient order. Returns `false` (and changes nothing) when the
    /// recipe is already planned.
    pub fn add_recipe(&mut self, recipe: &Recipe) -> bool {
        if self.is_planned(&recipe.id) {
            return false;
        }
        self.planned.push(recipe.id.clone());
        self.shopping.extend(
            recipe
                .ingredients
                .iter()
                .map(|ingredient| ShoppingItem::for_ingredient(ingredient, &recipe.id)),
        );
        true
    }

    /// Drops `recipe_id` from the plan together with every shopping item that
    /// came from it. Returns `false` when the recipe was not planned.
    pub fn remove_recipe(&mut self, recipe_id: &str) -> bool {
        let was_planned = self.is_planned(recipe_id);
        self.planned.retain(|id| id != recipe_id);
        self.shopping
            .retain(|item| item.recipe_id.as_deref() != Some(recipe_id));
        was_planned
    }

    /// Planned count against [`WEEKLY_PLAN_TARGET`], e.g. `(2, 4)`.
    pub fn plan_progress(&self) -> (usize, usize) {
        (self.planned.len(), WEEKLY_PLAN_TARGET)
    }

    /// Fill of the weekly progress bar, capped at 1.0.
    pub fn plan_completion(&self) -> f64 {
        (self.planned.len() as f64 / WEEKLY_PLAN_TARGET as f64).min(1.0)
    }

    pub fn reset_all(&mut self) {
        self.planned.clear();
        self.shopping.clear();
    }

    pub fn mark_purchased(&mut self, item_id: &str, purchased: bool) -> Result<&ShoppingItem> {
        let item = self
            .shopping
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| EdenError::UnknownShoppingItem(item_id.to_string()))?;
        item.purchased = purchased;
        Ok(&*item)
    }

    /// Planned recipes as catalog entries, in catalog order.
    pub fn planned_recipes<'a>(&self, catalog: &'a RecipeCatalog) -> Vec<&'a Recipe> {
        catalog
            .recipes()
            .iter()
            .filter(|r| self.is_planned(&r.id))
            .collect()
    }

    /// Removes plan entries the catalog does not know, and their items.
    /// Returns the ids that were dropped.
    pub fn retain_known(&mut self, catalog: &RecipeCatalog) -> Vec<String> {
        let unknown: Vec<String> = self
            .planned
            .iter()
            .filter(|id| !catalog.contains(id))
            .cloned()
            .collect();
        for id in &unknown {
            warn!(recipe_id = %id, "dropping planned recipe missing from catalog");
            self.remove_recipe(id);
        }
        unknown
    }
}
