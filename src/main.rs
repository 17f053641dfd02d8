//! Factory Planner
//!
//! Command-line front end: manages the recipe catalog and plans factory sets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use factory_planner::models::{Factory, Ingredient, Recipe};
use factory_planner::report::{PlanSummary, format_factory_tree};
use factory_planner::sync::{
    FactoryStore, JsonFileStore, LoadOutcome, SaveOutcome, SavePolicy, SavedFactories, SyncState,
    load_remote, save_local,
};
use factory_planner::{GameCatalog, db, extract, planner};

#[derive(Parser)]
#[command(name = "factory-planner")]
#[command(about = "Production planner for networks of interdependent factories")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "planner.db")]
    database: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import recipes and raw resources from a directory of game-data JSON
    Import {
        /// Directory to scan for *.json files
        source_dir: PathBuf,

        /// Clear the existing catalog before importing
        #[arg(long)]
        clear: bool,
    },

    /// Recompute a factory set and report supply, surplus and dependencies
    Plan {
        /// Factory set JSON (a saved `{ data, lastSaved }` body or a bare array)
        factories: PathBuf,

        /// Read recipes from a game-data JSON file instead of the database
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Write the recomputed factory set here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show every factory in detail
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all recipes in the catalog
    ListRecipes,

    /// Show a recipe and the recipes that consume its product
    Recipe {
        /// Recipe ID
        id: String,
    },

    /// Compare a local factory file against a stored copy
    SyncStatus { local: PathBuf, remote: PathBuf },

    /// Replace a local factory file with a newer stored copy
    Pull {
        remote: PathBuf,

        #[arg(long)]
        into: PathBuf,

        /// Take the stored copy even when local edits are newer
        #[arg(long)]
        force: bool,
    },

    /// Save a local factory set to a store
    Push {
        local: PathBuf,

        #[arg(long)]
        to: PathBuf,
    },

    /// Initialize empty database with schema
    Init,

    /// Load a small sample catalog for testing
    LoadSample,
}

/// Factory files come either as a saved body or as a bare list
#[derive(Deserialize)]
#[serde(untagged)]
enum FactoryFile {
    Saved(SavedFactories),
    Bare(Vec<Factory>),
}

fn read_factories(path: &Path) -> Result<(Vec<Factory>, Option<chrono::DateTime<chrono::Utc>>)> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: FactoryFile =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(match file {
        FactoryFile::Saved(saved) => (saved.data, Some(saved.last_saved)),
        FactoryFile::Bare(data) => (data, None),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import { source_dir, clear } => {
            let conn = open_catalog(&cli.database)?;
            if clear {
                println!("Clearing existing catalog...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::import_catalog_dir(&conn, &source_dir)?;
            println!("\n{}", stats);
        }

        Commands::Plan {
            factories,
            catalog,
            output,
            verbose,
        } => {
            let catalog = match catalog {
                Some(path) => GameCatalog::from_json_file(&path)?,
                None => db::load_catalog(&open_catalog(&cli.database)?)?,
            };
            if catalog.recipe_count() == 0 {
                println!("Catalog is empty. Run 'import' or 'load-sample' first.");
            }

            let (factories, _) = read_factories(&factories)?;
            let plan = planner::recompute(&factories, &catalog);

            if verbose {
                for factory in &plan.factories {
                    println!("{}", format_factory_tree(factory));
                }
                for issue in &plan.issues {
                    println!("! {}", issue);
                }
                println!();
            }

            println!("{}", PlanSummary::from_plan(&plan));

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&plan.factories)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Recomputed factories written to {}", path.display());
            }
        }

        Commands::ListRecipes => {
            let conn = open_catalog(&cli.database)?;
            let recipes = db::list_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<30} {:<30} {:>11}", "Recipe", "Name", "Ingredients");
                println!("{}", "-".repeat(73));
                for r in recipes {
                    println!("{:<30} {:<30} {:>11}", r.id, r.name, r.ingredients.len());
                }
            }
        }

        Commands::Recipe { id } => {
            let conn = open_catalog(&cli.database)?;
            if let Some(recipe) = db::get_recipe(&conn, &id)? {
                println!("Recipe: {}", recipe.name);
                println!("  ID: {}", recipe.id);
                println!("  Ingredients:");
                for i in &recipe.ingredients {
                    if i.amount.is_finite() {
                        println!("    {} x {}", i.part, i.amount);
                    } else {
                        println!("    {} x (invalid amount)", i.part);
                    }
                }

                let consumers = db::get_consumers(&conn, &id)?;
                if !consumers.is_empty() {
                    println!("  Used by:");
                    for c in consumers {
                        println!("    {}", c);
                    }
                }
            } else {
                println!("Recipe '{}' not found", id);
            }
        }

        Commands::SyncStatus { local, remote } => {
            let (_, local_edit) = read_factories(&local)?;
            let Some(stored) = JsonFileStore::new(remote).load_factories()? else {
                println!("Nothing stored yet.");
                return Ok(());
            };
            println!("{}", SyncState::compare(local_edit, stored.last_saved));
        }

        Commands::Pull {
            remote,
            into,
            force,
        } => {
            let local_edit = if into.exists() {
                read_factories(&into)?.1
            } else {
                None
            };
            match load_remote(&JsonFileStore::new(remote), local_edit, force)? {
                LoadOutcome::Empty => println!("Nothing stored yet."),
                LoadOutcome::UpToDate => println!("Local copy is current, nothing pulled."),
                LoadOutcome::Loaded(saved) | LoadOutcome::OutOfSync(saved) => {
                    let count = saved.data.len();
                    JsonFileStore::new(&into).write(&saved)?;
                    println!("Pulled {} factories into {}", count, into.display());
                }
            }
        }

        Commands::Push { local, to } => {
            let (factories, _) = read_factories(&local)?;
            let policy = SavePolicy {
                stop_syncing: false,
                save_pending: true,
            };
            match save_local(&JsonFileStore::new(to), &factories, policy)? {
                SaveOutcome::Saved(when) => {
                    println!("Saved {} factories at {}", factories.len(), when)
                }
                SaveOutcome::NoData => {
                    bail!("{} holds no factories, refusing to save", local.display())
                }
                SaveOutcome::Disabled | SaveOutcome::NothingPending => println!("Nothing saved."),
            }
        }

        Commands::Init => {
            open_catalog(&cli.database)?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let conn = open_catalog(&cli.database)?;
            load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

fn open_catalog(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Load a small sample catalog for testing without game data
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let raws = [
        ("OreIron", "Iron Ore"),
        ("OreCopper", "Copper Ore"),
        ("Stone", "Limestone"),
        ("Coal", "Coal"),
    ];
    for (id, name) in raws {
        db::upsert_raw_resource(conn, id, name)?;
    }

    let recipes: [(&str, &str, &[(&str, f64)]); 8] = [
        ("IngotIron", "Iron Ingot", &[("OreIron", 1.0)]),
        ("IngotCopper", "Copper Ingot", &[("OreCopper", 1.0)]),
        ("IronPlate", "Iron Plate", &[("IngotIron", 1.5)]),
        ("IronRod", "Iron Rod", &[("IngotIron", 1.0)]),
        ("IronScrew", "Screw", &[("IronRod", 0.25)]),
        ("Wire", "Wire", &[("IngotCopper", 0.5)]),
        ("Cement", "Concrete", &[("Stone", 3.0)]),
        (
            "IronPlateReinforced",
            "Reinforced Iron Plate",
            &[("IronPlate", 6.0), ("IronScrew", 12.0)],
        ),
    ];
    for (id, name, ingredients) in recipes {
        let recipe = Recipe {
            id: id.to_string(),
            name: name.to_string(),
            ingredients: ingredients
                .iter()
                .map(|(part, amount)| Ingredient {
                    part: part.to_string(),
                    amount: *amount,
                })
                .collect(),
        };
        db::upsert_recipe(conn, &recipe)?;
    }

    println!("Loaded {} sample recipes and {} raw resources", recipes.len(), raws.len());
    Ok(())
}
