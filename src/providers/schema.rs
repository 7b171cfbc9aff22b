use serde_json::{json, Value};

fn dual_string_lists(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "metric": {"type": "array", "items": {"type": "string"}},
            "us": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["metric", "us"]
    })
}

/// JSON schema for a Schema.org recipe carrying both metric and US measurements.
///
/// Kept to the subset of JSON schema that every supported provider accepts.
pub fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "description": {"type": "string"},
            "image": {"type": "string"},
            "recipeYield": {"type": "string"},
            "prepTime": {"type": "string", "description": "ISO 8601 duration"},
            "cookTime": {"type": "string", "description": "ISO 8601 duration"},
            "totalTime": {"type": "string", "description": "ISO 8601 duration"},
            "recipeIngredient": dual_string_lists(
                "One ingredient per line with quantity and unit, in each measurement system"
            ),
            "recipeInstructions": dual_string_lists(
                "One step per entry, with any quantities in each measurement system"
            )
        },
        "required": ["name", "recipeIngredient", "recipeInstructions"]
    })
}
