//! Whole-network recompute
//!
//! Per-factory stages first (independent of each other, optionally in
//! parallel), then the dependency graph once every factory is done.

use crate::calculator::calculate_factory;
use crate::catalog::GameCatalog;
use crate::dependencies::DependencyGraph;
use crate::index::FactoryIndex;
use crate::issues::{Diagnostics, PlanIssue};
use crate::models::{Factory, FactoryId};

/// Result of one recompute
#[derive(Debug, Clone)]
pub struct Plan {
    pub factories: Vec<Factory>,
    pub issues: Vec<PlanIssue>,
}

impl Plan {
    pub fn factory(&self, id: impl Into<FactoryId>) -> Option<&Factory> {
        let id = id.into();
        self.factories.iter().find(|f| f.id == id)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Recompute every derived field of `factories` from their products, inputs
/// and the catalog. The input is left untouched.
pub fn recompute(factories: &[Factory], catalog: &GameCatalog) -> Plan {
    let sources = FactoryIndex::new(factories);
    let (calculated, mut diagnostics) = calculate_all(factories, catalog, &sources);

    let factories = DependencyGraph::build(calculated, &mut diagnostics).measure();
    let issues = diagnostics.into_issues();

    tracing::info!(
        factories = factories.len(),
        satisfied = factories.iter().filter(|f| f.inputs_satisfied).count(),
        issues = issues.len(),
        "plan recomputed"
    );

    Plan { factories, issues }
}

/// Replace `factories` with their recomputed form and return the issues found.
pub fn recompute_in_place(factories: &mut Vec<Factory>, catalog: &GameCatalog) -> Vec<PlanIssue> {
    let plan = recompute(factories, catalog);
    *factories = plan.factories;
    plan.issues
}

#[cfg(not(feature = "parallel"))]
fn calculate_all(
    factories: &[Factory],
    catalog: &GameCatalog,
    sources: &FactoryIndex<'_>,
) -> (Vec<Factory>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let calculated = factories
        .iter()
        .map(|factory| calculate_factory(factory, catalog, sources, &mut diagnostics))
        .collect();
    (calculated, diagnostics)
}

#[cfg(feature = "parallel")]
fn calculate_all(
    factories: &[Factory],
    catalog: &GameCatalog,
    sources: &FactoryIndex<'_>,
) -> (Vec<Factory>, Diagnostics) {
    use rayon::prelude::*;

    let results: Vec<(Factory, Diagnostics)> = factories
        .par_iter()
        .map(|factory| {
            let mut diagnostics = Diagnostics::new();
            let calculated = calculate_factory(factory, catalog, sources, &mut diagnostics);
            (calculated, diagnostics)
        })
        .collect();

    // Merge in factory order so issue order matches the sequential path.
    let mut diagnostics = Diagnostics::new();
    let calculated = results
        .into_iter()
        .map(|(factory, found)| {
            diagnostics.extend(found);
            factory
        })
        .collect();
    (calculated, diagnostics)
}
