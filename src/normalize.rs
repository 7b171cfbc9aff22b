//! JSON-LD recipe normalization into the [`Recipe`] DTO.

use html_escape::decode_html_entities;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::ingredients::{IngredientParser, UnitTable};
use crate::model::{MeasurementSystem, Recipe, RecipeIngredient, Step};

pub trait RecipeNormalizer: Send + Sync {
    /// Convert single-system JSON-LD into a recipe, or `None` if it holds no usable recipe
    fn normalize(&self, json: &Value, units: &UnitTable) -> Option<Recipe>;
}

pub struct JsonLdNormalizer<P> {
    parser: P,
}

impl<P: IngredientParser> JsonLdNormalizer<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: IngredientParser> RecipeNormalizer for JsonLdNormalizer<P> {
    fn normalize(&self, json: &Value, units: &UnitTable) -> Option<Recipe> {
        let json_ld: JsonLdRecipe = match serde_json::from_value(json.clone()) {
            Ok(recipe) => recipe,
            Err(e) => {
                debug!("JSON-LD did not match the recipe shape: {}", e);
                return None;
            }
        };

        let name = json_ld
            .name
            .as_deref()
            .map(decode_html_symbols)
            .filter(|n| !n.trim().is_empty())?;

        let ingredient_lines: Vec<String> = match json_ld.recipe_ingredient {
            Some(RecipeIngredients::Single(line)) => vec![line],
            Some(RecipeIngredients::Multiple(lines)) => lines,
            None => Vec::new(),
        }
        .iter()
        .map(|line| decode_html_symbols(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

        let step_texts: Vec<String> = json_ld
            .recipe_instructions
            .map(RecipeInstructions::into_texts)
            .unwrap_or_default()
            .iter()
            .map(|text| decode_html_symbols(text))
            .filter(|text| !text.trim().is_empty())
            .collect();

        if ingredient_lines.is_empty() && step_texts.is_empty() {
            debug!("JSON-LD recipe '{}' has neither ingredients nor steps", name);
            return None;
        }

        let parsed = self.parser.parse_ingredients(&ingredient_lines, units);
        let system = detect_system(
            parsed.iter().filter_map(|p| p.unit_of_measure_id.as_deref()),
            units,
        );

        let recipe_ingredients = parsed
            .into_iter()
            .enumerate()
            .map(|(i, p)| RecipeIngredient {
                ingredient_id: None,
                ingredient_name: p.description,
                amount: p.quantity,
                unit: p.unit_of_measure_id,
                system_used: system,
                order: i as u32,
            })
            .collect();

        let steps = step_texts
            .into_iter()
            .enumerate()
            .map(|(i, step)| Step {
                step,
                order: i as u32 + 1,
                system_used: system,
            })
            .collect();

        Some(Recipe {
            name,
            description: json_ld
                .description
                .map(|d| decode_html_symbols(&d))
                .filter(|d| !d.trim().is_empty()),
            url: None,
            image: json_ld.image.and_then(ImageType::first_url),
            servings: json_ld.recipe_yield.and_then(RecipeYield::servings),
            prep_minutes: json_ld.prep_time.as_deref().and_then(duration_minutes),
            cook_minutes: json_ld.cook_time.as_deref().and_then(duration_minutes),
            total_minutes: json_ld.total_time.as_deref().and_then(duration_minutes),
            system_used: system,
            recipe_ingredients,
            steps,
        })
    }
}

/// Majority vote over unit systems; ties and unit-less lists are metric
pub fn detect_system<'a>(
    unit_ids: impl Iterator<Item = &'a str>,
    units: &UnitTable,
) -> MeasurementSystem {
    let (metric, us) = unit_ids
        .filter_map(|id| units.system_of(id))
        .fold((0usize, 0usize), |(m, u), system| match system {
            MeasurementSystem::Metric => (m + 1, u),
            MeasurementSystem::Us => (m, u + 1),
        });

    if us > metric {
        MeasurementSystem::Us
    } else {
        MeasurementSystem::Metric
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLdRecipe {
    name: Option<String>,
    description: Option<String>,
    image: Option<ImageType>,
    recipe_ingredient: Option<RecipeIngredients>,
    recipe_instructions: Option<RecipeInstructions>,
    recipe_yield: Option<RecipeYield>,
    prep_time: Option<String>,
    cook_time: Option<String>,
    total_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    String(String),
    Object(ImageObject),
    MultipleStrings(Vec<String>),
    MultipleObjects(Vec<ImageObject>),
}

impl ImageType {
    fn first_url(self) -> Option<String> {
        match self {
            ImageType::String(url) => Some(url),
            ImageType::Object(obj) => obj.url,
            ImageType::MultipleStrings(urls) => urls.into_iter().next(),
            ImageType::MultipleObjects(objs) => objs.into_iter().find_map(|o| o.url),
        }
        .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInstructions {
    String(String),
    Multiple(Vec<InstructionItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionItem {
    Text(String),
    Section(HowToSection),
    Step(HowToStep),
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    text: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<InstructionItem>,
}

impl RecipeInstructions {
    fn into_texts(self) -> Vec<String> {
        match self {
            RecipeInstructions::String(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            RecipeInstructions::Multiple(items) => {
                items.into_iter().flat_map(InstructionItem::into_texts).collect()
            }
        }
    }
}

impl InstructionItem {
    fn into_texts(self) -> Vec<String> {
        match self {
            InstructionItem::Text(text) => vec![text],
            // Prefer text over name
            InstructionItem::Step(step) => step.text.or(step.name).into_iter().collect(),
            InstructionItem::Section(section) => section
                .item_list_element
                .into_iter()
                .flat_map(InstructionItem::into_texts)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    Number(u32),
    String(String),
    Array(Vec<Value>),
}

impl RecipeYield {
    fn servings(self) -> Option<u32> {
        match self {
            RecipeYield::Number(n) => Some(n),
            RecipeYield::String(s) => leading_number(&s),
            RecipeYield::Array(values) => values.iter().find_map(|v| match v {
                Value::Number(n) => n.as_u64().map(|n| n as u32),
                Value::String(s) => leading_number(s),
                _ => None,
            }),
        }
        .filter(|n| *n > 0)
    }
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// ISO 8601 duration (e.g., PT1H30M, P1DT2H, PT5400.0S) to whole minutes
fn duration_minutes(duration: &str) -> Option<u32> {
    let duration = duration.trim().strip_prefix('P')?;
    let mut total_seconds = 0f64;
    let mut number = String::new();
    let mut in_time = false;

    for c in duration.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' | '.' => number.push(c),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                total_seconds += match (unit, in_time) {
                    ('D', false) => value * 86_400.0,
                    ('H', true) => value * 3_600.0,
                    ('M', true) => value * 60.0,
                    ('S', true) => value,
                    _ => return None,
                };
            }
        }
    }

    if !number.is_empty() {
        return None;
    }

    Some((total_seconds / 60.0).round() as u32).filter(|m| *m > 0)
}

fn decode_html_symbols(text: &str) -> String {
    // Some sites double-encode entities
    decode_html_entities(&decode_html_entities(text)).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::DefaultIngredientParser;
    use serde_json::json;

    fn normalize(json: Value) -> Option<Recipe> {
        JsonLdNormalizer::new(DefaultIngredientParser).normalize(&json, &UnitTable::default())
    }

    #[test]
    fn test_normalize_basic_recipe() {
        let recipe = normalize(json!({
            "@type": "Recipe",
            "name": "Pancakes",
            "description": "Fluffy &amp; light",
            "image": ["https://example.com/p.jpg"],
            "recipeYield": "4 servings",
            "prepTime": "PT10M",
            "cookTime": "PT1H5M",
            "recipeIngredient": ["200 g flour", "300 ml milk", "2 eggs"],
            "recipeInstructions": ["Mix everything.", "Fry in a pan."]
        }))
        .unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.description.as_deref(), Some("Fluffy & light"));
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/p.jpg"));
        assert_eq!(recipe.servings, Some(4));
        assert_eq!(recipe.prep_minutes, Some(10));
        assert_eq!(recipe.cook_minutes, Some(65));
        assert_eq!(recipe.system_used, MeasurementSystem::Metric);

        assert_eq!(recipe.recipe_ingredients.len(), 3);
        assert_eq!(recipe.recipe_ingredients[0].ingredient_name, "flour");
        assert_eq!(recipe.recipe_ingredients[0].amount, Some(200.0));
        assert_eq!(recipe.recipe_ingredients[0].unit.as_deref(), Some("g"));
        assert_eq!(recipe.recipe_ingredients[2].order, 2);

        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.steps[0].order, 1);
        assert_eq!(recipe.steps[1].step, "Fry in a pan.");
    }

    #[test]
    fn test_normalize_howto_sections() {
        let recipe = normalize(json!({
            "name": "Bread",
            "recipeIngredient": ["500 g flour"],
            "recipeInstructions": [
                {"@type": "HowToSection", "name": "Dough", "itemListElement": [
                    {"@type": "HowToStep", "text": "Knead."},
                    {"@type": "HowToStep", "name": "Rest"}
                ]},
                {"@type": "HowToStep", "text": "Bake."}
            ]
        }))
        .unwrap();

        let steps: Vec<&str> = recipe.steps.iter().map(|s| s.step.as_str()).collect();
        assert_eq!(steps, vec!["Knead.", "Rest", "Bake."]);
    }

    #[test]
    fn test_normalize_detects_us_system() {
        let recipe = normalize(json!({
            "name": "Cookies",
            "recipeIngredient": ["2 cups flour", "1 tsp salt", "100 g butter"],
            "recipeInstructions": "Mix.\nBake."
        }))
        .unwrap();

        assert_eq!(recipe.system_used, MeasurementSystem::Us);
        assert!(recipe
            .recipe_ingredients
            .iter()
            .all(|i| i.system_used == MeasurementSystem::Us));
        assert_eq!(recipe.steps.len(), 2);
    }

    #[test]
    fn test_normalize_rejects_missing_name() {
        assert!(normalize(json!({
            "recipeIngredient": ["1 egg"],
            "recipeInstructions": ["Boil."]
        }))
        .is_none());
        assert!(normalize(json!({"name": "  ", "recipeIngredient": ["1 egg"]})).is_none());
    }

    #[test]
    fn test_normalize_rejects_empty_recipe() {
        assert!(normalize(json!({"name": "Nothing"})).is_none());
        assert!(normalize(json!("not an object")).is_none());
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes("PT30M"), Some(30));
        assert_eq!(duration_minutes("PT1H30M"), Some(90));
        assert_eq!(duration_minutes("PT5400.0S"), Some(90));
        assert_eq!(duration_minutes("P1DT2H"), Some(1560));
        assert_eq!(duration_minutes("PT0M"), None);
        assert_eq!(duration_minutes("30 minutes"), None);
        assert_eq!(duration_minutes("PT15-20M"), None);
    }

    #[test]
    fn test_detect_system_tie_is_metric() {
        let units = UnitTable::default();
        assert_eq!(
            detect_system(["g", "cup"].into_iter(), &units),
            MeasurementSystem::Metric
        );
        assert_eq!(detect_system(std::iter::empty(), &units), MeasurementSystem::Metric);
    }
}
