//! Per-factory requirement and supply calculation
//!
//! The stages run in a fixed order. Each one consumes the previous stage's
//! [`FactoryPipeline`] and returns the next, so a stage can only read fields
//! that earlier stages have written:
//!
//! ```text
//! aggregate -> resolve_raw -> resolve_internal -> resolve_inputs -> evaluate -> calculate_surplus
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::catalog::GameCatalog;
use crate::index::FactoryIndex;
use crate::issues::{Diagnostics, PlanIssue};
use crate::models::{
    Factory, Ingredient, InternalProductEntry, RawResourceEntry, Recipe, Requirement,
};

/// Requirements expanded from recipes
pub struct Aggregated;
/// Raw resources credited
pub struct RawSupplied;
/// Same-factory production credited
pub struct InternalSupplied;
/// Cross-factory inputs credited
pub struct InputSupplied;
/// Shortfall and satisfaction computed
pub struct Evaluated;

/// A factory part-way through the calculation.
pub struct FactoryPipeline<'a, S> {
    factory: Factory,
    /// Resolved recipe per product, `None` where the recipe was unknown
    recipes: Vec<Option<&'a Recipe>>,
    _stage: PhantomData<S>,
}

impl<'a, S> FactoryPipeline<'a, S> {
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    fn advance<T>(self) -> FactoryPipeline<'a, T> {
        FactoryPipeline {
            factory: self.factory,
            recipes: self.recipes,
            _stage: PhantomData,
        }
    }

    /// Products whose recipe resolved, with their index
    fn resolved(&self) -> impl Iterator<Item = (usize, &'a Recipe)> + '_ {
        self.recipes
            .iter()
            .enumerate()
            .filter_map(|(i, recipe)| recipe.map(|r| (i, r)))
    }

    /// Total output per part over the product lines whose recipe resolved
    fn produced(&self) -> BTreeMap<String, f64> {
        let mut produced: BTreeMap<String, f64> = BTreeMap::new();
        for (i, _) in self.resolved() {
            let product = &self.factory.products[i];
            *produced.entry(product.id.clone()).or_default() += product.amount;
        }
        produced
    }
}

fn valid_ingredients(recipe: &Recipe) -> impl Iterator<Item = &Ingredient> {
    recipe.ingredients.iter().filter(|i| i.amount.is_finite())
}

/// Run every per-factory stage on a fresh copy of `factory`.
pub fn calculate_factory(
    factory: &Factory,
    catalog: &GameCatalog,
    sources: &FactoryIndex<'_>,
    diagnostics: &mut Diagnostics,
) -> Factory {
    aggregate(factory, catalog, diagnostics)
        .resolve_raw()
        .resolve_internal()
        .resolve_inputs(sources, diagnostics)
        .evaluate()
        .calculate_surplus()
}

/// Expand each product's recipe into required ingredient amounts.
///
/// Starts from the authored fields only, so nothing derived by a previous run
/// survives. Raw ingredients are also recorded in `raw_resources`; when two
/// products use the same raw part the later product's amount replaces the
/// earlier one.
pub fn aggregate<'a>(
    factory: &Factory,
    catalog: &'a GameCatalog,
    diagnostics: &mut Diagnostics,
) -> FactoryPipeline<'a, Aggregated> {
    let mut factory = factory.authored();
    let mut recipes = Vec::with_capacity(factory.products.len());

    for product in &mut factory.products {
        let Some(recipe) = catalog.find_recipe(&product.recipe) else {
            diagnostics.report(PlanIssue::MissingRecipe {
                factory: factory.id.clone(),
                product: product.id.clone(),
                recipe: product.recipe.clone(),
            });
            recipes.push(None);
            continue;
        };
        recipes.push(Some(recipe));

        for ingredient in &recipe.ingredients {
            if !ingredient.amount.is_finite() {
                diagnostics.report(PlanIssue::InvalidIngredientAmount {
                    factory: factory.id.clone(),
                    recipe: recipe.id.clone(),
                    part: ingredient.part.clone(),
                });
                continue;
            }

            let required = ingredient.amount * product.amount;

            if let Some(name) = catalog.raw_resource_name(&ingredient.part) {
                factory.raw_resources.insert(
                    ingredient.part.clone(),
                    RawResourceEntry {
                        name: name.to_string(),
                        amount: required,
                        satisfied: true,
                    },
                );
            }

            product
                .requirements
                .entry(ingredient.part.clone())
                .or_default()
                .amount_required += required;
        }
    }

    let mut requirements: BTreeMap<String, Requirement> = BTreeMap::new();
    for product in &factory.products {
        for (part, requirement) in &product.requirements {
            requirements
                .entry(part.clone())
                .or_default()
                .amount_required += requirement.amount_required;
        }
    }
    factory.requirements = requirements;

    tracing::debug!(
        factory = %factory.id,
        requirements = factory.requirements.len(),
        raw = factory.raw_resources.len(),
        "requirements aggregated"
    );

    FactoryPipeline {
        factory,
        recipes,
        _stage: PhantomData,
    }
}

impl<'a> FactoryPipeline<'a, Aggregated> {
    /// Raw resources are taken as unlimited: their whole requirement is supplied.
    pub fn resolve_raw(mut self) -> FactoryPipeline<'a, RawSupplied> {
        let factory = &mut self.factory;
        for part in factory.raw_resources.keys() {
            if let Some(requirement) = factory.requirements.get_mut(part) {
                requirement.amount_supplied_via_raw = requirement.amount_required;
            }
        }
        self.advance()
    }
}

impl<'a> FactoryPipeline<'a, RawSupplied> {
    /// Credit ingredients built by another product line of the same factory.
    ///
    /// The credit is the part's whole output across every line building it,
    /// counted once however many product lines consume it.
    pub fn resolve_internal(mut self) -> FactoryPipeline<'a, InternalSupplied> {
        let produced = self.produced();
        let mut internal = BTreeMap::new();
        for (consumer, recipe) in self.resolved() {
            let own = &self.factory.products[consumer].id;
            for ingredient in valid_ingredients(recipe) {
                if &ingredient.part == own {
                    continue;
                }
                let Some(&amount) = produced.get(&ingredient.part) else {
                    continue;
                };
                internal.insert(
                    ingredient.part.clone(),
                    InternalProductEntry {
                        id: ingredient.part.clone(),
                        amount,
                    },
                );
            }
        }

        for entry in internal.values() {
            if let Some(requirement) = self.factory.requirements.get_mut(&entry.id) {
                requirement.amount_supplied_via_internal += entry.amount;
            }
        }
        self.factory.internal_products = internal;
        self.advance()
    }
}

impl<'a> FactoryPipeline<'a, InternalSupplied> {
    /// Credit declared inputs at their declared rate.
    ///
    /// Whether the source can actually deliver is checked later by the
    /// dependency metrics. Inputs naming an unknown factory or product are
    /// reported and skipped; they are left in place here.
    pub fn resolve_inputs(
        mut self,
        sources: &FactoryIndex<'_>,
        diagnostics: &mut Diagnostics,
    ) -> FactoryPipeline<'a, InputSupplied> {
        let factory = &mut self.factory;
        for input in &factory.inputs {
            if !sources.contains(&input.factory_id) {
                diagnostics.report(PlanIssue::MissingFactory {
                    factory: factory.id.clone(),
                    source_factory: input.factory_id.clone(),
                });
                continue;
            }
            if sources.product(&input.factory_id, &input.output_part).is_none() {
                diagnostics.report(PlanIssue::MissingProduct {
                    factory: factory.id.clone(),
                    source_factory: input.factory_id.clone(),
                    part: input.output_part.clone(),
                });
                continue;
            }

            factory
                .requirements
                .entry(input.output_part.clone())
                .or_default()
                .amount_supplied_via_input += input.amount;
        }
        self.advance()
    }
}

impl<'a> FactoryPipeline<'a, InputSupplied> {
    pub fn evaluate(mut self) -> FactoryPipeline<'a, Evaluated> {
        for requirement in self.factory.requirements.values_mut() {
            requirement.amount_supplied = requirement.amount_supplied_via_internal
                + requirement.amount_supplied_via_input
                + requirement.amount_supplied_via_raw;
            requirement.amount_remaining =
                requirement.amount_required - requirement.amount_supplied;
            requirement.satisfied = Some(requirement.amount_remaining <= 0.0);
        }

        self.factory.inputs_satisfied = self
            .factory
            .requirements
            .values()
            .all(|r| r.satisfied == Some(true));

        tracing::debug!(
            factory = %self.factory.id,
            satisfied = self.factory.inputs_satisfied,
            "factory evaluated"
        );
        self.advance()
    }
}

impl FactoryPipeline<'_, Evaluated> {
    /// Exportable output per part: what the factory builds minus what its own
    /// product lines consume. Only positive surpluses are recorded.
    pub fn calculate_surplus(mut self) -> Factory {
        let produced = self.produced();
        let factory = &mut self.factory;
        factory.surplus = produced
            .into_iter()
            .filter_map(|(part, amount)| {
                let consumed = factory
                    .requirements
                    .get(&part)
                    .map_or(0.0, |r| r.amount_required);
                let surplus = amount - consumed;
                (surplus > 0.0).then_some((part, surplus))
            })
            .collect();

        self.factory
    }
}
