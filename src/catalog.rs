//! Read-only game data: recipes and the set of raw resources

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{Ingredient, Recipe};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read game data {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed game data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recipes indexed by id plus raw resource display names.
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    recipes: HashMap<String, Recipe>,
    raw_resources: HashMap<String, String>,
}

impl GameCatalog {
    pub fn new(
        recipes: impl IntoIterator<Item = Recipe>,
        raw_resources: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            raw_resources: raw_resources.into_iter().collect(),
        }
    }

    pub fn find_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn is_raw_resource(&self, part: &str) -> bool {
        self.raw_resources.contains_key(part)
    }

    pub fn raw_resource_name(&self, part: &str) -> Option<&str> {
        self.raw_resources.get(part).map(String::as_str)
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn raw_resource_count(&self) -> usize {
        self.raw_resources.len()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let data: GameDataFile = serde_json::from_str(json)?;
        Ok(data.into_catalog())
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

// ===========================================================================
// Game data file shape
// ===========================================================================

/// Top level of a game-data JSON file. Both sections are optional so a file
/// may carry only recipes or only items.
#[derive(Debug, Default, Deserialize)]
pub struct GameDataFile {
    #[serde(default)]
    pub recipes: Vec<RecipeRecord>,
    #[serde(default)]
    pub items: ItemsRecord,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Each entry is a single-key object `{ "<part>": <amount> }`
    #[serde(default)]
    pub ingredients: Vec<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRecord {
    #[serde(default)]
    pub raw_resources: BTreeMap<String, RawResourceRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RawResourceRecord {
    pub name: String,
}

impl RecipeRecord {
    /// Amounts that are not numbers become NaN; the planner reports and skips them.
    pub fn into_recipe(self) -> Recipe {
        let ingredients = self
            .ingredients
            .into_iter()
            .flat_map(|entry| entry.into_iter())
            .map(|(part, amount)| Ingredient {
                part,
                amount: amount.as_f64().unwrap_or(f64::NAN),
            })
            .collect();

        Recipe {
            id: self.id,
            name: self.name,
            ingredients,
        }
    }
}

impl GameDataFile {
    pub fn into_catalog(self) -> GameCatalog {
        GameCatalog::new(
            self.recipes.into_iter().map(RecipeRecord::into_recipe),
            self.items
                .raw_resources
                .into_iter()
                .map(|(part, record)| (part, record.name)),
        )
    }
}
