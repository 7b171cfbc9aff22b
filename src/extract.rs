//! AI-assisted recipe extraction from arbitrary webpages.
//!
//! The model is asked for JSON-LD carrying every ingredient and instruction in
//! both metric and US measurements. The metric half goes through the regular
//! JSON-LD normalizer; the US half is parsed separately and appended, so the
//! resulting recipe holds both systems tagged by `systemUsed`.

use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::config::default_max_page_chars;
use crate::error::AppError;
use crate::ingredients::{DefaultIngredientParser, IngredientParser, ParsedIngredient};
use crate::model::{MeasurementSystem, Recipe, RecipeIngredient, Step};
use crate::normalize::{JsonLdNormalizer, RecipeNormalizer};
use crate::prompts::{PromptName, PromptResolver};
use crate::providers::{recipe_schema, AiProvider};
use crate::sanitize::sanitize;
use crate::settings::ServerSettings;

pub const SYSTEM_INSTRUCTION: &str = "You extract recipe data as JSON-LD with both metric and US measurements. Return {} if insufficient data.";

/// Ingredient or instruction lists in both measurement systems
#[derive(Debug, Default, Deserialize)]
struct DualList {
    #[serde(default)]
    metric: Vec<String>,
    #[serde(default)]
    us: Vec<String>,
}

/// The fields of the model's answer that extraction depends on
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtraction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    recipe_ingredient: Option<DualList>,
    #[serde(default)]
    recipe_instructions: Option<DualList>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Name,
    MetricIngredients,
    UsIngredients,
    MetricInstructions,
    UsInstructions,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingField::Name => "name",
            MissingField::MetricIngredients => "recipeIngredient.metric",
            MissingField::UsIngredients => "recipeIngredient.us",
            MissingField::MetricInstructions => "recipeInstructions.metric",
            MissingField::UsInstructions => "recipeInstructions.us",
        })
    }
}

/// A model answer with a name and non-empty lists in both systems
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExtraction {
    pub name: String,
    pub metric_ingredients: Vec<String>,
    pub us_ingredients: Vec<String>,
    pub metric_instructions: Vec<String>,
    pub us_instructions: Vec<String>,
}

impl RawExtraction {
    pub fn validate(self) -> Result<ValidExtraction, MissingField> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .ok_or(MissingField::Name)?;
        let ingredients = self.recipe_ingredient.unwrap_or_default();
        let instructions = self.recipe_instructions.unwrap_or_default();

        let non_empty = |list: Vec<String>, field| {
            if list.is_empty() {
                Err(field)
            } else {
                Ok(list)
            }
        };

        Ok(ValidExtraction {
            name,
            metric_ingredients: non_empty(ingredients.metric, MissingField::MetricIngredients)?,
            us_ingredients: non_empty(ingredients.us, MissingField::UsIngredients)?,
            metric_instructions: non_empty(
                instructions.metric,
                MissingField::MetricInstructions,
            )?,
            us_instructions: non_empty(instructions.us, MissingField::UsInstructions)?,
        })
    }
}

pub struct RecipeExtractor {
    settings: ServerSettings,
    prompts: PromptResolver,
    provider: Arc<dyn AiProvider>,
    parser: Arc<dyn IngredientParser>,
    normalizer: Arc<dyn RecipeNormalizer>,
    max_page_chars: usize,
}

impl RecipeExtractor {
    pub fn new(
        settings: ServerSettings,
        prompts: PromptResolver,
        provider: Arc<dyn AiProvider>,
    ) -> Self {
        Self {
            settings,
            prompts,
            provider,
            parser: Arc::new(DefaultIngredientParser),
            normalizer: Arc::new(JsonLdNormalizer::new(DefaultIngredientParser)),
            max_page_chars: default_max_page_chars(),
        }
    }

    pub fn parser(mut self, parser: Arc<dyn IngredientParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn RecipeNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Maximum characters of sanitized page text sent to the model
    pub fn max_page_chars(mut self, max_page_chars: usize) -> Self {
        self.max_page_chars = max_page_chars;
        self
    }

    /// Extract a dual-system recipe from `html`.
    ///
    /// Returns `Ok(None)` when AI is disabled or the model's answer is empty,
    /// incomplete or not a recipe.
    pub async fn extract_recipe(
        &self,
        html: &str,
        url: Option<&str>,
    ) -> Result<Option<Recipe>, AppError> {
        let url_label = url.unwrap_or("<none>");

        if !self.settings.is_ai_enabled().await? {
            info!("AI features are disabled, skipping extraction");
            return Ok(None);
        }

        info!("Starting AI recipe extraction for {}", url_label);

        let prompt = self.build_prompt(html, url).await?;
        debug!(
            "Sending {} char prompt to {} for {}",
            prompt.chars().count(),
            self.provider.provider_name(),
            url_label
        );

        let response = self
            .provider
            .generate_structured_output(&prompt, &recipe_schema(), SYSTEM_INSTRUCTION)
            .await?;

        let raw_json = match response {
            Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
            Some(Value::Object(_)) | None => {
                error!("Empty or null response from AI provider for {}", url_label);
                return Ok(None);
            }
            Some(other) => {
                error!(
                    "AI provider returned a non-object response for {}: {}",
                    url_label, other
                );
                return Ok(None);
            }
        };

        let raw: RawExtraction = match serde_json::from_value(raw_json.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Malformed recipe data from AI provider for {}: {}", url_label, e);
                return Ok(None);
            }
        };

        let extraction = match raw.validate() {
            Ok(extraction) => extraction,
            Err(field) => {
                error!(
                    "Invalid recipe data for {} - missing required field {}",
                    url_label, field
                );
                return Ok(None);
            }
        };

        debug!(
            "AI response for {}: '{}' with {}/{} metric/US ingredients, {}/{} metric/US steps",
            url_label,
            extraction.name,
            extraction.metric_ingredients.len(),
            extraction.us_ingredients.len(),
            extraction.metric_instructions.len(),
            extraction.us_instructions.len()
        );

        let units = self.settings.units().await?;

        let Some(mut recipe) = self
            .normalizer
            .normalize(&metric_view(raw_json, &extraction), &units)
        else {
            error!("Failed to normalize recipe from JSON-LD for {}", url_label);
            return Ok(None);
        };

        let parsed_us = self
            .parser
            .parse_ingredients(&extraction.us_ingredients, &units);
        let (us_ingredients, us_steps) = system_entries(
            parsed_us,
            extraction.us_instructions,
            MeasurementSystem::Us,
        );

        tag_system(&mut recipe, MeasurementSystem::Metric);
        recipe.url = url.map(str::to_string);
        recipe.recipe_ingredients.extend(us_ingredients);
        recipe.steps.extend(us_steps);

        info!(
            "AI recipe extraction completed for {}: '{}' with {} ingredients and {} steps ({})",
            url_label,
            recipe.name,
            recipe.recipe_ingredients.len(),
            recipe.steps.len(),
            recipe.system_used
        );

        Ok(Some(recipe))
    }

    async fn build_prompt(&self, html: &str, url: Option<&str>) -> Result<String, AppError> {
        let sanitized = sanitize(html);
        let page_text = truncate_chars(&sanitized, self.max_page_chars);
        let prompt = self.prompts.load(PromptName::RecipeExtraction).await?;

        Ok(assemble_prompt(&prompt, url, page_text))
    }
}

fn assemble_prompt(prompt: &str, url: Option<&str>, page_text: &str) -> String {
    let url_line = url.map(|u| format!("URL: {}\n", u)).unwrap_or_default();
    format!("{}\n{}\nWEBPAGE TEXT:\n{}", prompt, url_line, page_text)
}

/// Longest prefix of `text` with at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// The answer with both dual lists replaced by their metric halves
fn metric_view(mut raw: Value, extraction: &ValidExtraction) -> Value {
    if let Value::Object(map) = &mut raw {
        map.insert(
            "recipeIngredient".to_string(),
            Value::from(extraction.metric_ingredients.clone()),
        );
        map.insert(
            "recipeInstructions".to_string(),
            Value::from(extraction.metric_instructions.clone()),
        );
    }
    raw
}

/// Tag the whole recipe with `system`, whatever the normalizer detected.
///
/// Metric lists often use spoons, which the unit table files under US.
fn tag_system(recipe: &mut Recipe, system: MeasurementSystem) {
    recipe.system_used = system;
    for ingredient in &mut recipe.recipe_ingredients {
        ingredient.system_used = system;
    }
    for step in &mut recipe.steps {
        step.system_used = system;
    }
}

/// Ingredients (0-based order) and steps (1-based order) tagged with `system`
fn system_entries(
    ingredients: Vec<ParsedIngredient>,
    instructions: Vec<String>,
    system: MeasurementSystem,
) -> (Vec<RecipeIngredient>, Vec<Step>) {
    let ingredients = ingredients
        .into_iter()
        .enumerate()
        .map(|(i, parsed)| RecipeIngredient {
            ingredient_id: None,
            ingredient_name: parsed.description,
            amount: parsed.quantity,
            unit: parsed.unit_of_measure_id,
            system_used: system,
            order: i as u32,
        })
        .collect();

    let steps = instructions
        .into_iter()
        .enumerate()
        .map(|(i, step)| Step {
            step,
            order: i as u32 + 1,
            system_used: system,
        })
        .collect();

    (ingredients, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawExtraction {
        serde_json::from_value(value).unwrap()
    }

    fn complete() -> Value {
        json!({
            "name": "Pancakes",
            "recipeIngredient": {"metric": ["250 g flour"], "us": ["2 cups flour"]},
            "recipeInstructions": {"metric": ["Mix."], "us": ["Mix."]}
        })
    }

    #[test]
    fn test_validate_complete() {
        let valid = raw(complete()).validate().unwrap();
        assert_eq!(valid.name, "Pancakes");
        assert_eq!(valid.us_ingredients, vec!["2 cups flour"]);
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut value = complete();
        value["name"] = json!("");
        assert_eq!(raw(value).validate(), Err(MissingField::Name));

        let mut value = complete();
        value["recipeIngredient"]["us"] = json!([]);
        assert_eq!(raw(value).validate(), Err(MissingField::UsIngredients));

        let mut value = complete();
        value.as_object_mut().unwrap().remove("recipeInstructions");
        assert_eq!(raw(value).validate(), Err(MissingField::MetricInstructions));

        let mut value = complete();
        value["recipeInstructions"]["us"] = json!([]);
        value["recipeIngredient"]["metric"] = json!([]);
        assert_eq!(raw(value).validate(), Err(MissingField::MetricIngredients));
    }

    #[test]
    fn test_assemble_prompt() {
        assert_eq!(
            assemble_prompt("PROMPT", Some("https://example.com/r"), "text"),
            "PROMPT\nURL: https://example.com/r\n\nWEBPAGE TEXT:\ntext"
        );
        assert_eq!(
            assemble_prompt("PROMPT", None, "text"),
            "PROMPT\n\nWEBPAGE TEXT:\ntext"
        );
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_metric_view_keeps_other_fields() {
        let value = complete();
        let valid = raw(value.clone()).validate().unwrap();
        let view = metric_view(value, &valid);

        assert_eq!(view["name"], "Pancakes");
        assert_eq!(view["recipeIngredient"], json!(["250 g flour"]));
        assert_eq!(view["recipeInstructions"], json!(["Mix."]));
    }

    #[test]
    fn test_tag_system_overrides_detected() {
        let mut recipe = Recipe {
            name: "Dressing".to_string(),
            system_used: MeasurementSystem::Us,
            ..Default::default()
        };
        let (ingredients, steps) = system_entries(
            vec![ParsedIngredient {
                description: "olive oil".to_string(),
                quantity: Some(1.0),
                unit_of_measure_id: Some("tbsp".to_string()),
            }],
            vec!["Whisk.".to_string()],
            MeasurementSystem::Us,
        );
        recipe.recipe_ingredients = ingredients;
        recipe.steps = steps;

        tag_system(&mut recipe, MeasurementSystem::Metric);

        assert_eq!(recipe.system_used, MeasurementSystem::Metric);
        assert_eq!(recipe.recipe_ingredients[0].system_used, MeasurementSystem::Metric);
        assert_eq!(recipe.steps[0].system_used, MeasurementSystem::Metric);
        assert_eq!(recipe.recipe_ingredients[0].unit.as_deref(), Some("tbsp"));
    }

    #[test]
    fn test_system_entries_ordering() {
        let parsed = vec![
            ParsedIngredient {
                description: "flour".to_string(),
                quantity: Some(2.0),
                unit_of_measure_id: Some("cup".to_string()),
            },
            ParsedIngredient {
                description: "salt".to_string(),
                quantity: None,
                unit_of_measure_id: None,
            },
        ];
        let (ingredients, steps) = system_entries(
            parsed,
            vec!["Mix.".to_string(), "Bake.".to_string()],
            MeasurementSystem::Us,
        );

        assert_eq!(
            ingredients.iter().map(|i| i.order).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(steps.iter().map(|s| s.order).collect::<Vec<_>>(), vec![1, 2]);
        assert!(ingredients.iter().all(|i| i.system_used == MeasurementSystem::Us));
        assert!(ingredients.iter().all(|i| i.ingredient_id.is_none()));
        assert!(steps.iter().all(|s| s.system_used == MeasurementSystem::Us));
    }
}
