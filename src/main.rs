use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use recipe_ai::admin::{AdminContext, AiVideoProcedures, PromptProcedures, StaticAdmins, User};
use recipe_ai::events::PermissionsEmitter;
use recipe_ai::providers::{ConfiguredProvider, ConnectionTestRequest, ProviderFactory};
use recipe_ai::{
    default_prompts, AppConfig, ConfigStore, JsonFileConfigStore, PromptName, PromptResolver,
    RecipeExtractor, ServerSettings,
};

#[derive(Parser)]
#[command(name = "recipe-ai")]
#[command(about = "AI recipe extraction and prompt administration", long_about = None)]
struct Cli {
    /// User id the admin commands run as
    #[arg(long, env = "RECIPE_AI_USER", default_value = "cli", global = true)]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a recipe from a saved HTML page
    Extract {
        /// Path to the HTML file
        html_file: PathBuf,
        /// URL the page was fetched from
        #[arg(long)]
        url: Option<String>,
    },
    /// Manage AI prompt overrides
    Prompts {
        #[command(subcommand)]
        action: PromptCommand,
    },
    /// Show or change the AI configuration
    Ai {
        #[command(subcommand)]
        action: AiCommand,
    },
}

#[derive(Subcommand)]
enum PromptCommand {
    /// List prompts and whether they are customized
    List,
    /// Print the effective text of a prompt
    Get { name: PromptName },
    /// Override a prompt with the contents of a file
    Set { name: PromptName, file: PathBuf },
    /// Remove the override and go back to the default
    Reset { name: PromptName },
}

#[derive(Subcommand)]
enum AiCommand {
    /// Print the effective AI configuration (API key masked)
    Show,
    Enable,
    Disable,
    /// List the models of the configured endpoint
    Test,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    debug!("Using config store at {}", config.store_path.display());

    let store: Arc<dyn ConfigStore> = Arc::new(JsonFileConfigStore::open(&config.store_path).await?);
    let settings = ServerSettings::new(store.clone(), config.ai.clone());
    let admins = Arc::new(StaticAdmins::new(config.admins.clone()));
    let ctx = AdminContext::for_user(User::new(cli.user));

    match cli.command {
        Commands::Extract { html_file, url } => {
            let html = tokio::fs::read_to_string(&html_file).await?;
            let extractor = RecipeExtractor::new(
                settings.clone(),
                PromptResolver::new(store.clone(), default_prompts(&config)),
                Arc::new(ConfiguredProvider::new(settings)),
            )
            .max_page_chars(config.max_page_chars);

            match extractor.extract_recipe(&html, url.as_deref()).await? {
                Some(recipe) => println!("{}", serde_json::to_string_pretty(&recipe)?),
                None => println!("no recipe"),
            }
        }
        Commands::Prompts { action } => {
            let procedures = PromptProcedures::new(store, default_prompts(&config), admins);
            match action {
                PromptCommand::List => {
                    for status in procedures.list_prompts(&ctx).await? {
                        let marker = if status.is_custom { "custom" } else { "default" };
                        println!("{}\t{}", status.name, marker);
                    }
                }
                PromptCommand::Get { name } => {
                    let details = procedures.get_prompt(&ctx, name).await?;
                    println!("{}", details.content);
                }
                PromptCommand::Set { name, file } => {
                    let content = tokio::fs::read_to_string(&file).await?;
                    procedures.update_prompt(&ctx, name, content).await?;
                    println!("Prompt '{}' updated", name);
                }
                PromptCommand::Reset { name } => {
                    procedures.reset_prompt(&ctx, name).await?;
                    println!("Prompt '{}' reset to default", name);
                }
            }
        }
        Commands::Ai { action } => {
            let current = settings.ai_config().await?;
            let procedures =
                AiVideoProcedures::new(settings, PermissionsEmitter::default(), admins);
            match action {
                AiCommand::Show => {
                    let mut shown = current;
                    if shown.api_key.is_some() {
                        shown.api_key = Some("********".to_string());
                    }
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                    println!(
                        "Available providers: {}",
                        ProviderFactory::available_providers().join(", ")
                    );
                }
                AiCommand::Enable | AiCommand::Disable => {
                    let enabled = matches!(action, AiCommand::Enable);
                    let updated = recipe_ai::AiConfig {
                        enabled,
                        ..current
                    };
                    procedures.update_ai_config(&ctx, updated).await?;
                    println!("AI features {}", if enabled { "enabled" } else { "disabled" });
                }
                AiCommand::Test => {
                    let result = procedures
                        .test_ai_endpoint(
                            &ctx,
                            ConnectionTestRequest {
                                provider: current.provider,
                                endpoint: current.endpoint,
                                api_key: current.api_key,
                            },
                        )
                        .await?;
                    println!("{}", result.message);
                    for model in result.models {
                        println!("  {}", model);
                    }
                    if !result.success {
                        return Err("AI endpoint test failed".into());
                    }
                }
            }
        }
    }

    Ok(())
}
