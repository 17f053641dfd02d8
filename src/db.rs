//! Catalog database schema and operations

use anyhow::Result;
use rusqlite::Connection;

use crate::catalog::GameCatalog;
use crate::models::{Ingredient, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Recipes by id
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Ingredient lines, in recipe order; NULL amount = unreadable in source data
        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            part_id TEXT NOT NULL,
            amount REAL,
            PRIMARY KEY (recipe_id, position)
        );

        -- Parts that are extracted rather than built
        CREATE TABLE IF NOT EXISTS raw_resources (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_part ON recipe_ingredients(part_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a recipe and all of its ingredient lines
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, name) VALUES (?1, ?2)",
        (&recipe.id, &recipe.name),
    )?;
    conn.execute(
        "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
        [&recipe.id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO recipe_ingredients (recipe_id, position, part_id, amount)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        let amount = ingredient.amount.is_finite().then_some(ingredient.amount);
        stmt.execute((&recipe.id, position as i64, &ingredient.part, amount))?;
    }
    Ok(())
}

/// Insert or replace a raw resource
pub fn upsert_raw_resource(conn: &Connection, id: &str, name: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO raw_resources (id, name) VALUES (?1, ?2)",
        (id, name),
    )?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM raw_resources;
        "#,
    )?;
    Ok(())
}

/// List all recipes with their ingredients, ordered by id
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare("SELECT id, name FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            ingredients: Vec::new(),
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        let mut recipe = row?;
        recipe.ingredients = get_ingredients(conn, &recipe.id)?;
        results.push(recipe);
    }
    Ok(results)
}

/// Get the ingredient lines of a recipe in order
pub fn get_ingredients(conn: &Connection, recipe_id: &str) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(
        "SELECT part_id, amount FROM recipe_ingredients
         WHERE recipe_id = ?1
         ORDER BY position",
    )?;

    let rows = stmt.query_map([recipe_id], |row| {
        Ok(Ingredient {
            part: row.get(0)?,
            amount: row.get::<_, Option<f64>>(1)?.unwrap_or(f64::NAN),
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get a single recipe by id
pub fn get_recipe(conn: &Connection, id: &str) -> Result<Option<Recipe>> {
    let mut stmt = conn.prepare("SELECT id, name FROM recipes WHERE id = ?1")?;
    let mut rows = stmt.query([id])?;

    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut recipe = Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        ingredients: Vec::new(),
    };
    recipe.ingredients = get_ingredients(conn, &recipe.id)?;
    Ok(Some(recipe))
}

/// List recipes that consume a part
pub fn get_consumers(conn: &Connection, part_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT recipe_id FROM recipe_ingredients WHERE part_id = ?1 ORDER BY recipe_id",
    )?;
    let rows = stmt.query_map([part_id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all raw resources as `(id, name)`
pub fn list_raw_resources(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT id, name FROM raw_resources ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Load the whole catalog into memory for planning
pub fn load_catalog(conn: &Connection) -> Result<GameCatalog> {
    Ok(GameCatalog::new(
        list_recipes(conn)?,
        list_raw_resources(conn)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn plate() -> Recipe {
        Recipe {
            id: "plate".into(),
            name: "Iron Plate".into(),
            ingredients: vec![
                Ingredient {
                    part: "iron".into(),
                    amount: 3.0,
                },
                Ingredient {
                    part: "coal".into(),
                    amount: 1.0,
                },
            ],
        }
    }

    #[test]
    fn recipes_round_trip_in_ingredient_order() {
        let conn = open();
        upsert_recipe(&conn, &plate()).unwrap();

        assert_eq!(get_recipe(&conn, "plate").unwrap(), Some(plate()));
        assert_eq!(get_recipe(&conn, "gear").unwrap(), None);
        assert_eq!(get_consumers(&conn, "coal").unwrap(), vec!["plate".to_string()]);
    }

    #[test]
    fn upsert_replaces_ingredients() {
        let conn = open();
        upsert_recipe(&conn, &plate()).unwrap();

        let mut changed = plate();
        changed.ingredients.truncate(1);
        upsert_recipe(&conn, &changed).unwrap();

        assert_eq!(list_recipes(&conn).unwrap(), vec![changed]);
    }

    #[test]
    fn unreadable_amounts_come_back_as_nan() {
        let conn = open();
        let mut recipe = plate();
        recipe.ingredients[1].amount = f64::NAN;
        upsert_recipe(&conn, &recipe).unwrap();

        let loaded = get_ingredients(&conn, "plate").unwrap();
        assert_eq!(loaded[0].amount, 3.0);
        assert!(loaded[1].amount.is_nan());
    }

    #[test]
    fn load_catalog_and_clear() {
        let conn = open();
        upsert_recipe(&conn, &plate()).unwrap();
        upsert_raw_resource(&conn, "iron", "Iron Ore").unwrap();

        let catalog = load_catalog(&conn).unwrap();
        assert!(catalog.find_recipe("plate").is_some());
        assert_eq!(catalog.raw_resource_name("iron"), Some("Iron Ore"));

        clear_catalog(&conn).unwrap();
        let catalog = load_catalog(&conn).unwrap();
        assert_eq!(catalog.recipe_count(), 0);
        assert_eq!(catalog.raw_resource_count(), 0);
    }
}
