//! # mealcraft CLI
//!
//! Plan a day of meals within a budget, from the terminal or the browser.
//!
//! Usage:
//!   mealcraft plan --dietary vegan --budget 25 --calories 1800
//!   mealcraft plan --save plan.json --format json
//!   mealcraft shopping-list plan.json
//!   mealcraft serve --port 5000
//!   mealcraft config

mod config;
mod plan_cmd;
mod serve_cmd;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mealcraft_agent::MealPlanner;
use mealcraft_llm::OpenAIProvider;

use crate::config::MealcraftConfig;
use crate::plan_cmd::PlanArgs;
use crate::serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "mealcraft")]
#[command(author, version, about = "mealcraft - budget-aware meal planning agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $MEALCRAFT_CONFIG or ./mealcraft.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan breakfast, lunch, dinner and snacks
    Plan {
        /// Dietary restriction: none, vegetarian, vegan, gluten-free
        #[arg(short, long, default_value = "none")]
        dietary: String,

        /// Daily budget in dollars
        #[arg(short, long, default_value_t = 30.0)]
        budget: f64,

        /// Daily calorie goal
        #[arg(long, default_value_t = 2000)]
        calories: u32,

        /// Preferred preparation time
        #[arg(short, long, default_value = "30 mins")]
        time: String,

        /// Save the plan as JSON for `shopping-list`
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Shopping list format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Print the shopping list of a saved plan
    ShoppingList {
        /// Plan file written by `plan --save`
        plan_file: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run the web app
    Serve {
        /// Address to bind (default from config: 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (default from config: 5000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the resolved configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mealcraft=debug,tower_http=debug"
    } else {
        "mealcraft=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_planner(config: &MealcraftConfig) -> Result<MealPlanner<OpenAIProvider>> {
    let provider = OpenAIProvider::new(config.provider_config()?)?;
    Ok(MealPlanner::new(provider).with_settings(config.planner_settings()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = MealcraftConfig::resolve(cli.config.as_deref())?;
    if let Some(source) = &config.source {
        tracing::debug!(path = %source.display(), "loaded config file");
    }

    match cli.command {
        Commands::Plan {
            dietary,
            budget,
            calories,
            time,
            save,
            format,
        } => {
            let planner = build_planner(&config)?;
            let args = PlanArgs {
                dietary,
                budget,
                calories,
                time,
                save,
                format,
            };
            println!("{}", plan_cmd::run_plan(&planner, &args).await?);
        }
        Commands::ShoppingList { plan_file, format } => {
            println!("{}", plan_cmd::run_shopping_list(&plan_file, &format)?);
        }
        Commands::Serve { bind, port } => {
            let config = config.with_server_overrides(bind, port);
            let server = &config.file.server;
            let state =
                AppState::new(build_planner(&config)?).with_max_sessions(server.max_sessions);
            serve_cmd::run_serve(state, &server.bind, server.port).await?;
        }
        Commands::Config => {
            match &config.source {
                Some(path) => println!("# {}", path.display()),
                None => println!("# built-in defaults"),
            }
            print!("{}", config.redacted()?);
        }
    }

    Ok(())
}
