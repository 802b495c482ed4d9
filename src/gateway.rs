//! Fail-open access to the hosted model.
//!
//! [`NutritionAssistant`] is what the rest of the crate talks to. Its Gemini
//! implementation never returns an error: any transport, status or parse
//! failure is logged and replaced by a fixed fallback answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api_connection::endpoints::{GenerationConfig, InlineData, JsonSchema, Part};
use crate::api_connection::{
    ApiConnectionError, GenerateContentRequest, GenerateContentResponse, Provider,
};
use crate::config::ModelConfig;
use crate::media::EncodedImage;

pub const FALLBACK_SUBSTITUTION: &str = "Try pureed prunes or flaxseed meal.";
pub const FALLBACK_SUBSTITUTION_REASON: &str =
    "Whole plants preserve vital fiber and phytonutrients.";
pub const FALLBACK_SUBSTITUTION_HOW_TO_USE: &str =
    "Use 1/3 cup prune paste to replace 1 cup of oil in baking.";
pub const FALLBACK_HEALTH_ANSWER: &str =
    "WFPB nutrition focuses on the synergy of whole plant parts for optimal health and chronic disease prevention.";
pub const FALLBACK_INGREDIENT_TIP: &str =
    "Whole plant foods are naturally rich in fiber, antioxidants, and phytochemicals.";
pub const UNTITLED_SOURCE: &str = "Scientific Resource";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub substitution: String,
    pub reason: String,
    pub how_to_use: String,
}

impl Substitution {
    pub fn fallback() -> Self {
        Self {
            substitution: FALLBACK_SUBSTITUTION.to_string(),
            reason: FALLBACK_SUBSTITUTION_REASON.to_string(),
            how_to_use: FALLBACK_SUBSTITUTION_HOW_TO_USE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAnswer {
    pub text: String,
    pub sources: Vec<HealthSource>,
}

impl HealthAnswer {
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_HEALTH_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Raw request/response transport to the model API.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError>;
}

#[async_trait]
impl ContentGenerator for Provider {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiConnectionError> {
        self.call_generate_content(model, request).await
    }
}

/// The AI features the planner offers. Every operation answers; failures
/// turn into fallback values.
#[async_trait]
pub trait NutritionAssistant: Send + Sync {
    async fn fetch_substitution(&self, query: &str) -> Substitution;
    async fn classify_meal_photo(&self, image: &EncodedImage) -> Vec<String>;
    async fn search_health_topic(&self, query: &str) -> HealthAnswer;
    async fn fetch_ingredient_tip(&self, ingredient: &str) -> String;
    /// A `data:` URL of the generated picture, or `None`.
    async fn synthesize_recipe_image(&self, name: &str, description: &str) -> Option<String>;
}

pub struct GeminiAssistant<G> {
    generator: G,
    models: ModelConfig,
}

impl<G: ContentGenerator> GeminiAssistant<G> {
    pub fn new(generator: G, models: ModelConfig) -> Self {
        Self { generator, models }
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    async fn generate_text(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, ApiConnectionError> {
        let response = self.generator.generate(model, request).await?;
        let text = response
            .text()
            .ok_or_else(|| ApiConnectionError::EmptyResponse("no text parts".to_string()))?;
        debug!(model, raw = %text, "model text response");
        Ok(text)
    }

    async fn try_substitution(&self, query: &str) -> Result<Substitution, ApiConnectionError> {
        let prompt = format!(
            "You are a whole-food, plant-based (WFPB) nutrition expert following the China Study. \
Suggest a WFPB replacement for: \"{}\".
Rules:
1. No added oil: use water or broth sautéing, or prune paste in baking.
2. No refined sugar: use Sucanat or whole fruit.
3. Build on whole plant parts (grains, legumes, roots and so on).
Answer with the substitution name, the health reason behind it, and a concrete ratio or preparation instruction.",
            query
        );
        let request = GenerateContentRequest::new(vec![Part::text(prompt)]).with_config(
            GenerationConfig::json(JsonSchema::object_of_strings(&[
                "substitution",
                "reason",
                "howToUse",
            ])),
        );
        let text = self.generate_text(&self.models.text_model, &request).await?;
        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }

    async fn try_classification(
        &self,
        image: &EncodedImage,
    ) -> Result<Vec<String>, ApiConnectionError> {
        let request = GenerateContentRequest::new(vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            },
            Part::text(
                "Classify the food in this image into these 8 WFPB categories: Fruits, Grains, \
Leaves, Roots, Legumes, Flowers, Nuts, Mushrooms. Return only a JSON array of the category names found.",
            ),
        ])
        .with_config(GenerationConfig::json(JsonSchema::array_of(JsonSchema::string())));
        let text = self.generate_text(&self.models.text_model, &request).await?;
        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }

    async fn try_health_search(&self, query: &str) -> Result<HealthAnswer, ApiConnectionError> {
        let prompt = format!(
            "Explain how a WFPB diet, as described in the China Study, bears on this health question: \"{}\". \
Emphasize chronic disease prevention and the benefits of dietary fiber and plant protein over animal protein.",
            query
        );
        let request = GenerateContentRequest::new(vec![Part::text(prompt)]).with_google_search();
        let response = self
            .generator
            .generate(&self.models.reasoning_model, &request)
            .await?;
        let text = response
            .text()
            .ok_or_else(|| ApiConnectionError::EmptyResponse("no answer text".to_string()))?;
        let sources = response
            .grounding_chunks()
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.clone()?;
                let title = web
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| UNTITLED_SOURCE.to_string());
                Some(HealthSource { title, uri })
            })
            .collect();
        Ok(HealthAnswer { text, sources })
    }

    async fn try_ingredient_tip(&self, ingredient: &str) -> Result<String, ApiConnectionError> {
        let prompt = format!(
            "Give one interesting, science-backed health fact about {} in the context of chronic disease \
prevention and WFPB nutrition. Keep it under 20 words. Example: 'One cup of broccoli has more vitamin C than an orange.'",
            ingredient
        );
        let request = GenerateContentRequest::new(vec![Part::text(prompt)]);
        let text = self.generate_text(&self.models.text_model, &request).await?;
        let tip = text.trim();
        if tip.is_empty() {
            return Err(ApiConnectionError::EmptyResponse("blank tip".to_string()));
        }
        Ok(tip.to_string())
    }

    async fn try_recipe_image(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ApiConnectionError> {
        let prompt = format!(
            "A bright, appetizing overhead food photograph of {}: {}. Whole-food plant-based, no oil sheen, natural light.",
            name, description
        );
        let request =
            GenerateContentRequest::new(vec![Part::text(prompt)]).with_config(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..GenerationConfig::default()
            });
        let response = self.generator.generate(&self.models.image_model, &request).await?;
        let image = response
            .inline_data()
            .ok_or_else(|| ApiConnectionError::EmptyResponse("no image part".to_string()))?;
        Ok(EncodedImage {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        }
        .to_data_url())
    }
}

#[async_trait]
impl<G: ContentGenerator> NutritionAssistant for GeminiAssistant<G> {
    async fn fetch_substitution(&self, query: &str) -> Substitution {
        self.try_substitution(query).await.unwrap_or_else(|e| {
            warn!(query, error = %e, "substitution lookup failed, using fallback");
            Substitution::fallback()
        })
    }

    async fn classify_meal_photo(&self, image: &EncodedImage) -> Vec<String> {
        self.try_classification(image).await.unwrap_or_else(|e| {
            warn!(error = %e, "meal photo classification failed, reporting no categories");
            Vec::new()
        })
    }

    async fn search_health_topic(&self, query: &str) -> HealthAnswer {
        self.try_health_search(query).await.unwrap_or_else(|e| {
            warn!(query, error = %e, "health search failed, using fallback");
            HealthAnswer::fallback()
        })
    }

    async fn fetch_ingredient_tip(&self, ingredient: &str) -> String {
        self.try_ingredient_tip(ingredient).await.unwrap_or_else(|e| {
            warn!(ingredient, error = %e, "ingredient tip failed, using fallback");
            FALLBACK_INGREDIENT_TIP.to_string()
        })
    }

    async fn synthesize_recipe_image(&self, name: &str, description: &str) -> Option<String> {
        match self.try_recipe_image(name, description).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(recipe = name, error = %e, "recipe image synthesis failed");
                None
            }
        }
    }
}

/// Removes a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        let inner = &trimmed[3..trimmed.len() - 3];
        inner.strip_prefix("json").unwrap_or(inner).trim()
    } else {
        trimmed
    }
}
