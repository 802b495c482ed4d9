use anyhow::{bail, Context, Result};
use eden_planner::api_connection::Provider;
use eden_planner::catalog::{Recipe, RecipeCatalog};
use eden_planner::cli::{parse_args, Commands, GardenAction, PlanAction};
use eden_planner::config::Config;
use eden_planner::gateway::GeminiAssistant;
use eden_planner::logging;
use eden_planner::media::EncodedImage;
use eden_planner::session::{AiOutcome, Session};
use eden_planner::store::FileStore;
use eden_planner::taxonomy::CategoryTag;
use eden_planner::view::ViewEvent;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

fn print_recipe_line(recipe: &Recipe, planned: bool) {
    let marker = if planned { "*" } else { " " };
    let quick = if recipe.is_quick { " (quick)" } else { "" };
    println!(
        "{} {:<8} {:<34} {:<20} {:>3} min{}",
        marker,
        recipe.id,
        recipe.name,
        recipe.course.label(),
        recipe.prep_time,
        quick
    );
}

fn print_recipe_details(recipe: &Recipe) {
    println!("{} [{}]", recipe.name, recipe.id);
    println!("{} | {} min", recipe.course.label(), recipe.prep_time);
    println!("\n{}\n", recipe.description);
    let categories: Vec<&str> = recipe.categories.iter().map(|c| c.name()).collect();
    println!("Categories: {}", categories.join(", "));
    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {}", ingredient);
    }
    println!("\nSteps:");
    for (idx, step) in recipe.steps().iter().enumerate() {
        println!("  {}. {}", idx + 1, step);
    }
    if let Some(tip) = &recipe.health_tip {
        println!("\nHealth tip: {}", tip);
    }
}

fn print_garden(session: &Session) {
    println!("Daily garden: {}/{}", session.garden_score(), CategoryTag::ALL.len());
    for (tag, harvested) in session.progress().iter() {
        let mark = if harvested { "x" } else { " " };
        println!("  [{}] {} {}", mark, tag.icon(), tag.name());
    }
}

fn print_plan(session: &Session) {
    let (planned_count, target) = session.planner().plan_progress();
    println!(
        "Weekly plan: {}/{} ({:.0}%)",
        planned_count,
        target,
        session.planner().plan_completion() * 100.0
    );
    let planned = session.planned_recipes();
    if planned.is_empty() {
        println!("No recipes planned.");
        return;
    }
    println!("Planned recipes:");
    for recipe in planned {
        print_recipe_line(recipe, true);
    }
}

fn print_shopping_list(session: &Session) {
    let items = session.planner().shopping_list();
    if items.is_empty() {
        println!("Shopping list is empty.");
        return;
    }
    for item in items {
        let mark = if item.purchased { "x" } else { " " };
        println!("  [{}] {:<40} {:<10} {}", mark, item.name, item.category, item.id);
    }
}

async fn wait_for_outcome(session: &mut Session) -> Result<AiOutcome> {
    match session.next_outcome().await {
        Some(outcome) => Ok(outcome),
        None => bail!("the assistant task ended without an answer"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = parse_args();
    logging::init(cli_args.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = cli_args.data_dir.clone() {
        config.data_dir = dir;
    }
    debug!(?config, "configuration loaded");

    let provider = Provider::gemini_with(
        &config.api_key_env_var,
        &config.api_base_url,
        config.timeout_seconds,
    );
    let assistant = Arc::new(GeminiAssistant::new(provider, config.models.clone()));
    let catalog = Arc::new(RecipeCatalog::seeded());
    let store = FileStore::open(&config.data_dir);
    let mut session = Session::restore(Arc::clone(&catalog), Box::new(store), assistant);

    match cli_args.command {
        Commands::Recipes { course } => {
            session.dispatch(ViewEvent::SelectCourse(course));
            let visible = session.view().visible_recipes(&catalog);
            println!("{} recipes ({})", visible.len(), course.label());
            for recipe in visible {
                print_recipe_line(recipe, session.planner().is_planned(&recipe.id));
            }
        }
        Commands::Recipe { id } => {
            session.dispatch(ViewEvent::OpenRecipe(id.clone()));
            let recipe = session
                .view()
                .selected_recipe_info(&catalog)
                .with_context(|| format!("No recipe with id '{}'", id))?;
            print_recipe_details(recipe);
        }
        Commands::Tracks { id: None } => {
            for track in catalog.tracks() {
                println!("{:<10} {}", track.id, track.title);
                println!("           {}", track.description);
            }
        }
        Commands::Tracks { id: Some(id) } => {
            session.dispatch(ViewEvent::OpenTrack(id.clone()));
            let track = session
                .view()
                .active_track_info(&catalog)
                .with_context(|| format!("No track with id '{}'", id))?;
            println!("{}\n{}\nImpact: {}\n", track.title, track.description, track.impact);
            for recipe in session.view().track_recipes(&catalog) {
                print_recipe_line(recipe, session.planner().is_planned(&recipe.id));
            }
        }
        Commands::Garden { action } => match action {
            GardenAction::Show => print_garden(&session),
            GardenAction::Toggle { category } => {
                let tag = session
                    .toggle_category_named(&category)
                    .with_context(|| format!("Cannot toggle '{}'", category))?;
                let state = if session.progress().is_harvested(tag) {
                    "harvested"
                } else {
                    "cleared"
                };
                println!("{} {}", tag.name(), state);
                print_garden(&session);
            }
            GardenAction::Scan { image } => {
                let encoded = EncodedImage::from_file(&image)
                    .await
                    .with_context(|| format!("Failed to read image '{}'", image.display()))?;
                let before = *session.progress();
                session.request_meal_scan(encoded);
                if let AiOutcome::MealScan { labels, .. } = wait_for_outcome(&mut session).await? {
                    if labels.is_empty() {
                        println!("Detected: nothing");
                    } else {
                        println!("Detected: {}", labels.join(", "));
                    }
                }
                let added: Vec<&str> = CategoryTag::ALL
                    .iter()
                    .filter(|tag| {
                        !before.is_harvested(**tag) && session.progress().is_harvested(**tag)
                    })
                    .map(|tag| tag.name())
                    .collect();
                if !added.is_empty() {
                    println!("Newly harvested: {}", added.join(", "));
                }
                print_garden(&session);
            }
            GardenAction::Reset => {
                session.reset_progress();
                print_garden(&session);
            }
        },
        Commands::Plan { action } => match action {
            PlanAction::Show => print_plan(&session),
            PlanAction::Add { id } => {
                let added = session
                    .add_to_plan(&id)
                    .with_context(|| format!("Cannot plan '{}'", id))?;
                if added {
                    println!("Planned {}", id);
                } else {
                    println!("{} was already planned", id);
                }
                print_plan(&session);
            }
            PlanAction::Remove { id } => {
                if !session.remove_from_plan(&id) {
                    println!("{} was not planned", id);
                }
                print_plan(&session);
            }
            PlanAction::Reset => {
                session.reset_plan();
                println!("Plan and shopping list cleared.");
            }
        },
        Commands::List { purchased, unpurchased } => {
            if let Some(item_id) = purchased {
                session
                    .mark_purchased(&item_id, true)
                    .with_context(|| format!("Cannot update item '{}'", item_id))?;
            }
            if let Some(item_id) = unpurchased {
                session
                    .mark_purchased(&item_id, false)
                    .with_context(|| format!("Cannot update item '{}'", item_id))?;
            }
            print_shopping_list(&session);
        }
        Commands::Swap { featured: true, .. } => {
            for swap in catalog.featured_swaps() {
                println!("  {} {}", swap.icon, swap.label);
            }
        }
        Commands::Swap { query, featured: false } => {
            let query = query.context("Give an ingredient to swap, or pass --featured")?;
            if session.request_substitution(&query).is_none() {
                bail!("Give an ingredient to swap");
            }
            if let AiOutcome::Substitution { result, .. } = wait_for_outcome(&mut session).await? {
                println!("Swap for: {}", result.substitution);
                println!("Why: {}", result.reason);
                println!("How: {}", result.how_to_use);
            }
        }
        Commands::Ask { query } => {
            if session.request_health_search(&query).is_none() {
                bail!("Ask a question");
            }
            if let AiOutcome::HealthAnswer { answer, .. } = wait_for_outcome(&mut session).await? {
                println!("{}", answer.text);
                if !answer.sources.is_empty() {
                    println!("\nSources:");
                    for source in &answer.sources {
                        println!("  - {} <{}>", source.title, source.uri);
                    }
                }
            }
        }
        Commands::Tip { ingredient } => {
            session.request_ingredient_tip(&ingredient);
            if let AiOutcome::IngredientTip { tip, .. } = wait_for_outcome(&mut session).await? {
                println!("{}: {}", ingredient, tip);
            }
        }
        Commands::Image { id, output } => {
            session
                .request_recipe_image(&id)
                .with_context(|| format!("Cannot generate an image for '{}'", id))?;
            wait_for_outcome(&mut session).await?;
            let data_url = match session.view().generated_images.get(&id) {
                Some(data_url) => data_url.clone(),
                None => bail!("No image could be generated for '{}'", id),
            };
            match output {
                Some(path) => {
                    let image = EncodedImage::from_data_url(&data_url)
                        .context("The generated image is not a base64 data URL")?;
                    let bytes = image.decode().context("Failed to decode the generated image")?;
                    fs::write(&path, bytes)
                        .await
                        .with_context(|| format!("Failed to write '{}'", path.display()))?;
                    println!("Wrote {} ({})", path.display(), image.mime_type);
                }
                None => println!("{}", data_url),
            }
        }
        Commands::Preserve => {
            for rule in catalog.preservation_rules() {
                println!("{}: {}", rule.item, rule.rule);
                println!("  {}", rule.reason);
            }
        }
    }

    Ok(())
}
