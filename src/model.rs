use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement system an ingredient or step is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    #[default]
    Metric,
    Us,
}

impl MeasurementSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementSystem::Metric => "metric",
            MeasurementSystem::Us => "us",
        }
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical recipe DTO handed to the persistence layer.
///
/// Ingredients and steps of both measurement systems live in the same lists;
/// `order` restarts for each system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub servings: Option<u32>,
    pub prep_minutes: Option<u32>,
    pub cook_minutes: Option<u32>,
    pub total_minutes: Option<u32>,
    pub system_used: MeasurementSystem,
    pub recipe_ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn ingredients_for(
        &self,
        system: MeasurementSystem,
    ) -> impl Iterator<Item = &RecipeIngredient> {
        self.recipe_ingredients
            .iter()
            .filter(move |i| i.system_used == system)
    }

    pub fn steps_for(&self, system: MeasurementSystem) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(move |s| s.system_used == system)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    /// Link to a known ingredient; `None` until matched
    pub ingredient_id: Option<String>,
    pub ingredient_name: String,
    pub amount: Option<f64>,
    /// Unit id from the unit table
    pub unit: Option<String>,
    pub system_used: MeasurementSystem,
    /// 0-based position within its measurement system
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step: String,
    /// 1-based position within its measurement system
    pub order: u32,
    pub system_used: MeasurementSystem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_serializes_camel_case() {
        let recipe = Recipe {
            name: "Pancakes".to_string(),
            recipe_ingredients: vec![RecipeIngredient {
                ingredient_id: None,
                ingredient_name: "flour".to_string(),
                amount: Some(200.0),
                unit: Some("g".to_string()),
                system_used: MeasurementSystem::Metric,
                order: 0,
            }],
            steps: vec![Step {
                step: "Mix".to_string(),
                order: 1,
                system_used: MeasurementSystem::Us,
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["systemUsed"], "metric");
        assert_eq!(json["recipeIngredients"][0]["ingredientId"], serde_json::Value::Null);
        assert_eq!(json["recipeIngredients"][0]["ingredientName"], "flour");
        assert_eq!(json["steps"][0]["systemUsed"], "us");
    }

    #[test]
    fn test_filters_by_system() {
        let recipe = Recipe {
            steps: vec![
                Step {
                    step: "a".to_string(),
                    order: 1,
                    system_used: MeasurementSystem::Metric,
                },
                Step {
                    step: "b".to_string(),
                    order: 1,
                    system_used: MeasurementSystem::Us,
                },
            ],
            ..Default::default()
        };

        assert_eq!(recipe.steps_for(MeasurementSystem::Us).count(), 1);
        assert_eq!(recipe.ingredients_for(MeasurementSystem::Metric).count(), 0);
    }
}
