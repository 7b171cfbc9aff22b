use async_trait::async_trait;
use recipe_ai::extract::SYSTEM_INSTRUCTION;
use recipe_ai::ingredients::{IngredientParser, ParsedIngredient, UnitTable};
use recipe_ai::normalize::RecipeNormalizer;
use recipe_ai::prompts::EmbeddedDefaults;
use recipe_ai::providers::{AiProvider, ProviderError};
use recipe_ai::store::{set_typed, ConfigKey};
use recipe_ai::{
    AiConfig, AppError, ConfigStore, MeasurementSystem, MemoryConfigStore, PromptResolver, Recipe,
    RecipeExtractor, ServerSettings,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PAGE: &str = r#"
<html>
<head><title>Pancakes</title><script>track()</script></head>
<body>
    <h1>Fluffy Pancakes</h1>
    <p>Serves 4</p>
    <ul><li>250 g flour</li><li>300 ml milk</li></ul>
</body>
</html>
"#;

/// Provider returning a canned answer and recording what it was asked
struct FakeProvider {
    response: Result<Option<Value>, u16>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FakeProvider {
    fn answering(response: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(response),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        assert_eq!(system, SYSTEM_INSTRUCTION);
        assert_eq!(schema["type"], "object");

        match &self.response {
            Ok(value) => Ok(value.clone()),
            Err(status) => Err(ProviderError::Api {
                status: *status,
                message: "upstream failure".to_string(),
            }),
        }
    }
}

fn dual_recipe() -> Value {
    json!({
        "name": "Fluffy Pancakes",
        "description": "Weekend breakfast",
        "recipeYield": "4 servings",
        "prepTime": "PT10M",
        "cookTime": "PT20M",
        "recipeIngredient": {
            "metric": ["250 g flour", "300 ml milk"],
            "us": ["2 cups flour", "1 1/4 cups milk"]
        },
        "recipeInstructions": {
            "metric": ["Whisk flour and milk.", "Rest 10 minutes.", "Fry in a hot pan."],
            "us": ["Whisk flour and milk.", "Rest 10 minutes.", "Fry in a hot pan."]
        }
    })
}

async fn extractor_with(
    provider: Arc<FakeProvider>,
    enabled: bool,
) -> (RecipeExtractor, Arc<MemoryConfigStore>) {
    let store = Arc::new(MemoryConfigStore::new());
    let ai = AiConfig {
        enabled,
        ..Default::default()
    };
    set_typed(store.as_ref(), ConfigKey::AiConfig, &ai, "admin", true)
        .await
        .unwrap();

    let settings = ServerSettings::new(store.clone(), AiConfig::default());
    let prompts = PromptResolver::new(store.clone(), Arc::new(EmbeddedDefaults));
    (RecipeExtractor::new(settings, prompts, provider), store)
}

#[tokio::test]
async fn test_merges_metric_and_us() {
    let provider = FakeProvider::answering(Some(dual_recipe()));
    let (extractor, _) = extractor_with(provider.clone(), true).await;

    let recipe = extractor
        .extract_recipe(PAGE, Some("https://example.com/pancakes"))
        .await
        .unwrap()
        .expect("recipe");

    assert_eq!(recipe.name, "Fluffy Pancakes");
    assert_eq!(recipe.url.as_deref(), Some("https://example.com/pancakes"));
    assert_eq!(recipe.servings, Some(4));
    assert_eq!(recipe.prep_minutes, Some(10));
    assert_eq!(recipe.system_used, MeasurementSystem::Metric);

    assert_eq!(recipe.recipe_ingredients.len(), 4);
    assert_eq!(recipe.steps.len(), 6);

    let systems: Vec<_> = recipe
        .recipe_ingredients
        .iter()
        .map(|i| (i.system_used, i.order))
        .collect();
    assert_eq!(
        systems,
        vec![
            (MeasurementSystem::Metric, 0),
            (MeasurementSystem::Metric, 1),
            (MeasurementSystem::Us, 0),
            (MeasurementSystem::Us, 1),
        ]
    );

    let step_orders: Vec<_> = recipe.steps.iter().map(|s| (s.system_used, s.order)).collect();
    assert_eq!(
        step_orders,
        vec![
            (MeasurementSystem::Metric, 1),
            (MeasurementSystem::Metric, 2),
            (MeasurementSystem::Metric, 3),
            (MeasurementSystem::Us, 1),
            (MeasurementSystem::Us, 2),
            (MeasurementSystem::Us, 3),
        ]
    );

    let us_flour = &recipe.recipe_ingredients[2];
    assert_eq!(us_flour.ingredient_name, "flour");
    assert_eq!(us_flour.amount, Some(2.0));
    assert_eq!(us_flour.unit.as_deref(), Some("cup"));
    assert!(us_flour.ingredient_id.is_none());

    let us_milk = &recipe.recipe_ingredients[3];
    assert_eq!(us_milk.amount, Some(1.25));

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_prompt_layout() {
    let provider = FakeProvider::answering(Some(json!({})));
    let (extractor, store) = extractor_with(provider.clone(), true).await;
    store
        .set(
            ConfigKey::PromptRecipeExtraction,
            json!({"content": "CUSTOM PROMPT"}),
            "admin",
            false,
        )
        .await
        .unwrap();

    extractor
        .extract_recipe(PAGE, Some("https://example.com/p"))
        .await
        .unwrap();

    let prompt = provider.last_prompt();
    assert!(prompt.starts_with(
        "CUSTOM PROMPT\nURL: https://example.com/p\n\nWEBPAGE TEXT:\nFluffy Pancakes\n"
    ));
    assert!(prompt.contains("250 g flour"));
    assert!(!prompt.contains("track()"));
}

#[tokio::test]
async fn test_page_text_is_truncated() {
    let provider = FakeProvider::answering(None);
    let (extractor, store) = extractor_with(provider.clone(), true).await;
    store
        .set(ConfigKey::PromptRecipeExtraction, json!({"content": "P"}), "admin", false)
        .await
        .unwrap();
    let extractor = extractor.max_page_chars(5);

    let html = "<body><p>ééééééééé</p></body>";
    extractor.extract_recipe(html, None).await.unwrap();

    assert_eq!(provider.last_prompt(), "P\n\nWEBPAGE TEXT:\nééééé");
}

#[tokio::test]
async fn test_disabled_ai_never_calls_provider() {
    let provider = FakeProvider::answering(Some(dual_recipe()));
    let (extractor, _) = extractor_with(provider.clone(), false).await;

    let result = extractor.extract_recipe(PAGE, None).await.unwrap();

    assert!(result.is_none());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_empty_responses_give_none() {
    for response in [None, Some(json!({})), Some(json!([1, 2]))] {
        let provider = FakeProvider::answering(response);
        let (extractor, _) = extractor_with(provider, true).await;
        assert!(extractor.extract_recipe(PAGE, None).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_each_missing_field_gives_none() {
    let removals: [&dyn Fn(&mut Value); 5] = [
        &|v: &mut Value| v["name"] = json!(""),
        &|v: &mut Value| v["recipeIngredient"]["metric"] = json!([]),
        &|v: &mut Value| v["recipeIngredient"]["us"] = json!([]),
        &|v: &mut Value| v["recipeInstructions"]["metric"] = json!([]),
        &|v: &mut Value| {
            v["recipeInstructions"].as_object_mut().unwrap().remove("us");
        },
    ];

    for remove in removals {
        let mut response = dual_recipe();
        remove(&mut response);
        let provider = FakeProvider::answering(Some(response));
        let (extractor, _) = extractor_with(provider, true).await;

        assert!(extractor.extract_recipe(PAGE, None).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let provider = FakeProvider::failing(500);
    let (extractor, _) = extractor_with(provider, true).await;

    let result = extractor.extract_recipe(PAGE, None).await;
    assert!(matches!(
        result,
        Err(AppError::Provider(ProviderError::Api { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_url_is_null_without_url() {
    let provider = FakeProvider::answering(Some(dual_recipe()));
    let (extractor, _) = extractor_with(provider, true).await;

    let recipe = extractor.extract_recipe(PAGE, None).await.unwrap().unwrap();
    assert!(recipe.url.is_none());
}

#[tokio::test]
async fn test_metric_spoon_measures_stay_metric() {
    let mut response = dual_recipe();
    response["recipeIngredient"]["metric"] = json!(["1 tbsp olive oil", "1 tsp salt"]);
    let provider = FakeProvider::answering(Some(response));
    let (extractor, _) = extractor_with(provider, true).await;

    let recipe = extractor.extract_recipe(PAGE, None).await.unwrap().unwrap();

    assert_eq!(recipe.system_used, MeasurementSystem::Metric);
    assert_eq!(recipe.ingredients_for(MeasurementSystem::Metric).count(), 2);
    assert_eq!(recipe.ingredients_for(MeasurementSystem::Us).count(), 2);
    assert_eq!(recipe.steps_for(MeasurementSystem::Metric).count(), 3);
    assert_eq!(recipe.steps_for(MeasurementSystem::Us).count(), 3);

    let oil = &recipe.recipe_ingredients[0];
    assert_eq!(oil.ingredient_name, "olive oil");
    assert_eq!(oil.unit.as_deref(), Some("tbsp"));
    assert_eq!(oil.system_used, MeasurementSystem::Metric);
}

/// Normalizer that never finds a recipe
struct RejectingNormalizer;

impl RecipeNormalizer for RejectingNormalizer {
    fn normalize(&self, _json: &Value, _units: &UnitTable) -> Option<Recipe> {
        None
    }
}

#[tokio::test]
async fn test_normalizer_failure_gives_none() {
    let provider = FakeProvider::answering(Some(dual_recipe()));
    let (extractor, _) = extractor_with(provider.clone(), true).await;
    let extractor = extractor.normalizer(Arc::new(RejectingNormalizer));

    let result = extractor.extract_recipe(PAGE, None).await.unwrap();

    assert!(result.is_none());
    assert_eq!(provider.calls(), 1);
}

/// Parser keeping each line whole as the ingredient name
struct VerbatimParser;

impl IngredientParser for VerbatimParser {
    fn parse_ingredients(&self, lines: &[String], _units: &UnitTable) -> Vec<ParsedIngredient> {
        lines
            .iter()
            .map(|line| ParsedIngredient {
                description: line.clone(),
                quantity: None,
                unit_of_measure_id: None,
            })
            .collect()
    }
}

#[tokio::test]
async fn test_custom_parser_handles_us_half() {
    let provider = FakeProvider::answering(Some(dual_recipe()));
    let (extractor, _) = extractor_with(provider, true).await;
    let extractor = extractor.parser(Arc::new(VerbatimParser));

    let recipe = extractor.extract_recipe(PAGE, None).await.unwrap().unwrap();

    let us: Vec<_> = recipe
        .ingredients_for(MeasurementSystem::Us)
        .map(|i| (i.ingredient_name.as_str(), i.amount))
        .collect();
    assert_eq!(us, vec![("2 cups flour", None), ("1 1/4 cups milk", None)]);

    // The metric half still goes through the default normalizer
    let flour = &recipe.recipe_ingredients[0];
    assert_eq!(flour.ingredient_name, "flour");
    assert_eq!(flour.amount, Some(250.0));
}
