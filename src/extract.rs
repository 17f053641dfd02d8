//! Game data import
//!
//! Walks a directory of game-data JSON files and loads their recipes and raw
//! resources into the catalog database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use walkdir::WalkDir;

use crate::catalog::{GameDataFile, RecipeRecord};
use crate::db;

/// Find all *.json files below `data_dir`, sorted for a stable import order
pub fn find_data_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Parse a single game-data file. `None` means it carried nothing to import.
fn parse_data_file(filepath: &Path) -> Result<Option<GameDataFile>> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read {}", filepath.display()))?;
    let data: GameDataFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", filepath.display()))?;

    if data.recipes.is_empty() && data.items.raw_resources.is_empty() {
        return Ok(None);
    }
    Ok(Some(data))
}

/// Import one game-data file into the database
pub fn import_catalog_file(conn: &Connection, filepath: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    match parse_data_file(filepath)? {
        Some(data) => {
            store(conn, data, &mut stats)?;
            stats.files += 1;
        }
        None => stats.skipped += 1,
    }
    Ok(stats)
}

/// Import every game-data file found below `data_dir`.
///
/// Files that fail to parse are counted and logged; the rest still load.
pub fn import_catalog_dir(conn: &Connection, data_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    tracing::info!(dir = %data_dir.display(), "scanning for game data");
    let files = find_data_files(data_dir)?;
    tracing::info!(count = files.len(), "found game data files");

    for filepath in &files {
        match parse_data_file(filepath) {
            Ok(Some(data)) => {
                let recipes = data.recipes.len();
                let raw = data.items.raw_resources.len();
                store(conn, data, &mut stats)?;
                stats.files += 1;
                tracing::debug!(file = %filepath.display(), recipes, raw, "imported");
            }
            Ok(None) => {
                stats.skipped += 1;
            }
            Err(e) => {
                tracing::error!(file = %filepath.display(), "{e:#}");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

fn store(conn: &Connection, data: GameDataFile, stats: &mut ImportStats) -> Result<()> {
    for record in data.recipes {
        let recipe = RecipeRecord::into_recipe(record);
        stats.ingredients += recipe.ingredients.len();
        db::upsert_recipe(conn, &recipe)?;
        stats.recipes += 1;
    }
    for (id, record) in &data.items.raw_resources {
        db::upsert_raw_resource(conn, id, &record.name)?;
        stats.raw_resources += 1;
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub recipes: usize,
    pub ingredients: usize,
    pub raw_resources: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} recipes ({} ingredients) and {} raw resources from {} files. Skipped: {}, Errors: {}",
            self.recipes,
            self.ingredients,
            self.raw_resources,
            self.files,
            self.skipped,
            self.errors
        )
    }
}
