//! Data models for factories, recipes and the derived planning fields
//!
//! Field names serialize in camelCase so a factory set round-trips through the
//! same JSON shape the sync collaborator stores.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Factory identifier, an integer or a string.
///
/// A string of plain decimal digits names the same factory as that integer,
/// so ids survive being written out as JSON object keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FactoryId {
    Number(u64),
    Name(String),
}

impl From<u64> for FactoryId {
    fn from(id: u64) -> Self {
        Self::Number(id)
    }
}

impl From<String> for FactoryId {
    fn from(id: String) -> Self {
        match id.parse::<u64>() {
            Ok(n) if n.to_string() == id => Self::Number(n),
            _ => Self::Name(id),
        }
    }
}

impl From<&str> for FactoryId {
    fn from(id: &str) -> Self {
        Self::from(id.to_string())
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for FactoryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Name(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self::Number(n),
            RawId::Name(name) => Self::from(name),
        })
    }
}

/// A single ingredient line of a recipe: `amount` units of `part` per unit built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub part: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub ingredients: Vec<Ingredient>,
}

/// Per-part bookkeeping of how much is needed and where it comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub amount_required: f64,
    pub amount_supplied: f64,
    pub amount_supplied_via_internal: f64,
    pub amount_supplied_via_input: f64,
    pub amount_supplied_via_raw: f64,
    pub amount_remaining: f64,
    /// `None` until the satisfaction stage has run
    pub satisfied: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResourceEntry {
    pub name: String,
    pub amount: f64,
    pub satisfied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalProductEntry {
    pub id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Part id of what this product line builds
    pub id: String,
    pub recipe: String,
    pub amount: f64,
    #[serde(default)]
    pub requirements: BTreeMap<String, Requirement>,
}

impl Product {
    pub fn new(id: impl Into<String>, recipe: impl Into<String>, amount: f64) -> Self {
        Self {
            id: id.into(),
            recipe: recipe.into(),
            amount,
            requirements: BTreeMap::new(),
        }
    }
}

/// A declared feed of `output_part` from another factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub factory_id: FactoryId,
    pub output_part: String,
    pub amount: f64,
}

impl Input {
    pub fn new(
        factory_id: impl Into<FactoryId>,
        output_part: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            factory_id: factory_id.into(),
            output_part: output_part.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub part: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub part: String,
    pub request: f64,
    pub supply: f64,
    pub is_request_satisfied: bool,
}

impl Metric {
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            request: 0.0,
            supply: 0.0,
            is_request_satisfied: false,
        }
    }
}

/// Owned by the supplying factory, keyed there by the requesting factory's id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub requested_by: Vec<DependencyRequest>,
    pub metrics: BTreeMap<String, Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub id: FactoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub inputs: Vec<Input>,

    // Everything below is rebuilt by the planner on every run.
    #[serde(default)]
    pub raw_resources: BTreeMap<String, RawResourceEntry>,
    #[serde(default)]
    pub requirements: BTreeMap<String, Requirement>,
    #[serde(default)]
    pub internal_products: BTreeMap<String, InternalProductEntry>,
    #[serde(default)]
    pub surplus: BTreeMap<String, f64>,
    #[serde(default)]
    pub dependencies: BTreeMap<FactoryId, Dependency>,
    #[serde(default)]
    pub inputs_satisfied: bool,
}

impl Factory {
    pub fn new(id: impl Into<FactoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            products: Vec::new(),
            inputs: Vec::new(),
            raw_resources: BTreeMap::new(),
            requirements: BTreeMap::new(),
            internal_products: BTreeMap::new(),
            surplus: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            inputs_satisfied: false,
        }
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    /// Copy of the authored fields only, every derived field reset to empty
    pub fn authored(&self) -> Self {
        Self {
            products: self
                .products
                .iter()
                .map(|p| Product::new(p.id.clone(), p.recipe.clone(), p.amount))
                .collect(),
            inputs: self.inputs.clone(),
            ..Self::new(self.id.clone(), self.name.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_json_uses_camel_case_and_defaults_derived_fields() {
        let json = r#"{
            "id": 3,
            "products": [{ "id": "plate", "recipe": "plate-recipe", "amount": 4 }],
            "inputs": [{ "factoryId": 1, "outputPart": "ingot", "amount": 2.5 }]
        }"#;
        let factory: Factory = serde_json::from_str(json).unwrap();

        assert_eq!(factory.id, FactoryId::Number(3));
        assert_eq!(factory.inputs[0].output_part, "ingot");
        assert!(factory.requirements.is_empty());
        assert!(!factory.inputs_satisfied);

        let out = serde_json::to_value(&factory).unwrap();
        assert!(out.get("inputsSatisfied").is_some());
        assert!(out.get("rawResources").is_some());
    }

    #[test]
    fn factory_ids_may_be_strings_or_integers() {
        let json = r#"[
            { "id": "alpha", "inputs": [{ "factoryId": 7, "outputPart": "ore", "amount": 1 }] },
            { "id": 7, "inputs": [{ "factoryId": "alpha", "outputPart": "plate", "amount": 2 }] },
            { "id": "12" }
        ]"#;
        let factories: Vec<Factory> = serde_json::from_str(json).unwrap();

        assert_eq!(factories[0].id, FactoryId::Name("alpha".into()));
        assert_eq!(factories[0].inputs[0].factory_id, FactoryId::Number(7));
        assert_eq!(factories[1].inputs[0].factory_id, FactoryId::from("alpha"));
        assert_eq!(factories[2].id, FactoryId::Number(12));
        assert_eq!(FactoryId::from("007"), FactoryId::Name("007".into()));

        let out = serde_json::to_value(&factories).unwrap();
        assert_eq!(out[0]["id"], "alpha");
        assert_eq!(out[1]["id"], 7);
    }

    #[test]
    fn dependency_keys_round_trip_through_json() {
        let mut factory = Factory::new("alpha", "Smelting");
        factory.dependencies.insert(FactoryId::from(4), Dependency::default());
        factory.dependencies.insert(FactoryId::from("beta"), Dependency::default());

        let json = serde_json::to_string(&factory).unwrap();
        let restored: Factory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, factory);
        assert_eq!(FactoryId::from("beta").to_string(), "beta");
    }

    #[test]
    fn authored_drops_derived_state() {
        let mut factory =
            Factory::new(1, "Smelting").with_product(Product::new("ingot", "ingot", 2.0));
        factory.surplus.insert("ingot".into(), 2.0);
        factory.products[0]
            .requirements
            .insert("ore".into(), Requirement::default());

        let clean = factory.authored();
        assert!(clean.surplus.is_empty());
        assert!(clean.products[0].requirements.is_empty());
        assert_eq!(clean.products[0].amount, 2.0);
    }
}
