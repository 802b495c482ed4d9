use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::Course;

#[derive(Parser, Debug)]
#[command(name = "eden", author, version)]
#[command(about = "Whole-food plant-based meal planner and daily variety tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the saved state (overrides EDEN_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List catalog recipes
    Recipes {
        /// Course filter, e.g. "breakfast" or "Side Dishes"
        #[arg(short, long, default_value = "all")]
        course: Course,
    },

    /// Show one recipe with its steps
    Recipe { id: String },

    /// List disease tracks, or the recipes of one track
    Tracks { id: Option<String> },

    /// Today's eight food categories
    Garden {
        #[command(subcommand)]
        action: GardenAction,
    },

    /// Planned recipes
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Show the shopping list
    List {
        /// Mark the item with this id as purchased
        #[arg(long)]
        purchased: Option<String>,

        /// Mark the item with this id as not purchased
        #[arg(long, conflicts_with = "purchased")]
        unpurchased: Option<String>,
    },

    /// Find a whole-food replacement for a processed ingredient
    Swap {
        query: Option<String>,

        /// Show the built-in swap shortcuts
        #[arg(long, conflicts_with = "query")]
        featured: bool,
    },

    /// Ask a nutrition question, answered with web sources
    Ask { query: String },

    /// A short nutrition note about one ingredient
    Tip { ingredient: String },

    /// Generate a photo for a recipe and print it as a data URL
    Image {
        id: String,

        /// Write the decoded image to this file instead
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Storage guidance for fresh produce
    Preserve,
}

#[derive(Subcommand, Debug)]
pub enum GardenAction {
    /// Show which categories are covered today
    Show,
    /// Flip one category, e.g. "Leaves"
    Toggle { category: String },
    /// Mark categories detected in a meal photo
    Scan { image: PathBuf },
    /// Clear every category
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum PlanAction {
    /// List planned recipes
    Show,
    /// Plan a recipe and add its ingredients to the shopping list
    Add { id: String },
    /// Unplan a recipe and drop its shopping items
    Remove { id: String },
    /// Clear the plan and the shopping list
    Reset,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
