//! End-to-end planning scenarios over small factory networks.

use factory_planner::catalog::GameCatalog;
use factory_planner::models::{Factory, FactoryId, Input, Product};
use factory_planner::{PlanIssue, recompute};

const GAME_DATA: &str = r#"{
    "recipes": [
        { "id": "R1", "name": "Plate", "ingredients": [{ "iron": 3 }] },
        { "id": "X", "name": "Gizmo", "ingredients": [{ "iron": 1 }, { "copper": 1 }] },
        { "id": "Frame", "name": "Frame", "ingredients": [{ "P1": 2 }, { "X": 1 }] },
        { "id": "Odd", "name": "Odd", "ingredients": [{ "iron": "three" }] }
    ],
    "items": {
        "rawResources": {
            "iron": { "name": "Iron Ore" },
            "copper": { "name": "Copper Ore" }
        }
    }
}"#;

fn catalog() -> GameCatalog {
    GameCatalog::from_json_str(GAME_DATA).unwrap()
}

#[test]
fn raw_resource_requirement_is_satisfied() {
    let a = Factory::new(1, "A").with_product(Product::new("P1", "R1", 2.0));
    let plan = recompute(&[a], &catalog());
    let a = plan.factory(1).unwrap();

    assert_eq!(a.raw_resources["iron"].amount, 6.0);
    assert!(a.raw_resources["iron"].satisfied);
    assert_eq!(a.requirements["iron"].amount_supplied_via_raw, 6.0);
    assert_eq!(a.requirements["iron"].amount_required, 6.0);
    assert_eq!(a.requirements["iron"].satisfied, Some(true));
    assert!(a.inputs_satisfied);
}

#[test]
fn request_beyond_surplus_is_flagged_on_the_supplier() {
    let a = Factory::new(1, "A").with_product(Product::new("X", "X", 6.0));
    let b = Factory::new(2, "B").with_input(Input::new(1, "X", 10.0));
    let plan = recompute(&[a, b], &catalog());

    let a = plan.factory(1).unwrap();
    assert_eq!(a.surplus["X"], 6.0);
    let edge = &a.dependencies[&FactoryId::Number(2)];
    let metric = &edge.metrics["X"];
    assert_eq!(metric.request, 10.0);
    assert_eq!(metric.supply, 6.0);
    assert!(!metric.is_request_satisfied);
    assert_eq!(edge.requested_by.len(), 1);
}

#[test]
fn internal_production_satisfies_without_inputs() {
    let c = Factory::new(3, "C")
        .with_product(Product::new("P1", "R1", 4.0))
        .with_product(Product::new("X", "X", 2.0))
        .with_product(Product::new("Frame", "Frame", 2.0));
    let plan = recompute(&[c], &catalog());
    let c = plan.factory(3).unwrap();

    assert_eq!(c.requirements["P1"].amount_supplied_via_internal, 4.0);
    assert_eq!(c.requirements["X"].amount_supplied_via_internal, 2.0);
    assert_eq!(c.requirements["P1"].amount_supplied_via_input, 0.0);
    assert!(c.inputs.is_empty());
    assert!(c.inputs_satisfied);
    assert_eq!(c.surplus.get("Frame"), Some(&2.0));
    assert!(!c.surplus.contains_key("P1"));
}

#[test]
fn dangling_input_is_pruned_and_reported() {
    let b = Factory::new(2, "B").with_input(Input::new(404, "X", 1.0));
    let plan = recompute(&[b], &catalog());

    assert!(plan.factory(2).unwrap().inputs.is_empty());
    assert_eq!(
        plan.issues,
        vec![
            PlanIssue::MissingFactory {
                factory: 2.into(),
                source_factory: 404.into(),
            },
            PlanIssue::DanglingInput {
                factory: 2.into(),
                source_factory: 404.into(),
                part: "X".into()
            },
        ]
    );
}

#[test]
fn input_for_unknown_product_is_skipped_but_kept() {
    let a = Factory::new(1, "A").with_product(Product::new("P1", "R1", 1.0));
    let b = Factory::new(2, "B")
        .with_product(Product::new("Frame", "Frame", 1.0))
        .with_input(Input::new(1, "X", 1.0));
    let plan = recompute(&[a, b], &catalog());

    let b = plan.factory(2).unwrap();
    assert_eq!(b.requirements["X"].amount_supplied_via_input, 0.0);
    assert_eq!(b.inputs.len(), 1);
    assert!(!b.inputs_satisfied);
    assert!(plan
        .issues
        .iter()
        .any(|i| matches!(i, PlanIssue::MissingProduct { part, .. } if part == "X")));
}

#[test]
fn unreadable_ingredient_amount_is_reported() {
    let a = Factory::new(1, "A").with_product(Product::new("Odd", "Odd", 1.0));
    let plan = recompute(&[a], &catalog());

    assert!(matches!(
        &plan.issues[..],
        [PlanIssue::InvalidIngredientAmount { recipe, part, .. }]
            if recipe == "Odd" && part == "iron"
    ));
    assert!(plan.factory(1).unwrap().requirements.is_empty());
}

#[test]
fn recomputing_the_output_changes_nothing() {
    let factories = vec![
        Factory::new(1, "A")
            .with_product(Product::new("P1", "R1", 2.0))
            .with_product(Product::new("X", "X", 5.0)),
        Factory::new(2, "B")
            .with_product(Product::new("Frame", "Frame", 3.0))
            .with_input(Input::new(1, "P1", 6.0))
            .with_input(Input::new(1, "X", 3.0))
            .with_input(Input::new(9, "X", 3.0)),
    ];
    let catalog = catalog();
    let first = recompute(&factories, &catalog);
    let second = recompute(&first.factories, &catalog);

    assert_eq!(first.factories, second.factories);
    assert!(second.issues.is_empty());
}

#[test]
fn removing_a_product_leaves_no_stale_requirements() {
    let catalog = catalog();
    let before = vec![Factory::new(1, "A")
        .with_product(Product::new("P1", "R1", 2.0))
        .with_product(Product::new("X", "X", 1.0))];
    let mut edited = recompute(&before, &catalog).factories;
    edited[0].products.retain(|p| p.id != "X");

    let plan = recompute(&edited, &catalog);
    let a = plan.factory(1).unwrap();
    assert!(!a.requirements.contains_key("copper"));
    assert!(!a.raw_resources.contains_key("copper"));
    assert!(!a.surplus.contains_key("X"));
}

#[test]
fn factory_set_round_trips_through_json() {
    let factories = vec![
        Factory::new(1, "A").with_product(Product::new("X", "X", 6.0)),
        Factory::new(2, "B").with_input(Input::new(1, "X", 10.0)),
    ];
    let plan = recompute(&factories, &catalog());

    let json = serde_json::to_string(&plan.factories).unwrap();
    let restored: Vec<Factory> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, plan.factories);
}

#[test]
fn string_and_integer_ids_link_across_factories() {
    let json = r#"[
        { "id": "smelter", "products": [{ "id": "X", "recipe": "X", "amount": 6 }] },
        { "id": 2, "inputs": [{ "factoryId": "smelter", "outputPart": "X", "amount": 4 }] },
        { "id": "3", "inputs": [{ "factoryId": 2, "outputPart": "X", "amount": 1 }] }
    ]"#;
    let factories: Vec<Factory> = serde_json::from_str(json).unwrap();
    let plan = recompute(&factories, &catalog());

    let smelter = plan.factory("smelter").unwrap();
    let metric = &smelter.dependencies[&FactoryId::Number(2)].metrics["X"];
    assert_eq!(metric.request, 4.0);
    assert!(metric.is_request_satisfied);
    assert_eq!(plan.factory(2).unwrap().requirements["X"].amount_supplied_via_input, 4.0);
    // "3" and 3 name the same factory
    assert!(plan.factory(3).is_some());
    assert!(plan.issues.iter().any(|i| matches!(
        i,
        PlanIssue::MissingProduct { factory: FactoryId::Number(3), .. }
    )));

    let json = serde_json::to_string(&plan.factories).unwrap();
    let restored: Vec<Factory> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, plan.factories);
}
