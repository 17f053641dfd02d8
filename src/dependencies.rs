//! Cross-factory dependency graph
//!
//! Runs after every factory has been through the per-factory stages. Each
//! factory's `dependencies` lists, per requesting factory, what was asked of
//! it and how that compares with its surplus.

use std::collections::HashMap;

use crate::issues::{Diagnostics, PlanIssue};
use crate::models::{DependencyRequest, Factory, FactoryId, Metric};

/// Factory set with freshly linked dependency edges, not yet measured
pub struct DependencyGraph {
    factories: Vec<Factory>,
}

impl DependencyGraph {
    /// Rebuild every factory's reverse edges from the declared inputs.
    ///
    /// Inputs whose source factory does not exist are reported and removed
    /// from the requesting factory.
    pub fn build(mut factories: Vec<Factory>, diagnostics: &mut Diagnostics) -> Self {
        let mut positions: HashMap<FactoryId, usize> = HashMap::with_capacity(factories.len());
        for (i, factory) in factories.iter_mut().enumerate() {
            factory.dependencies.clear();
            positions.entry(factory.id.clone()).or_insert(i);
        }

        let mut edges = 0;
        for i in 0..factories.len() {
            let requester = factories[i].id.clone();
            let inputs = std::mem::take(&mut factories[i].inputs);
            let mut kept = Vec::with_capacity(inputs.len());

            for input in inputs {
                let Some(&source) = positions.get(&input.factory_id) else {
                    diagnostics.report(PlanIssue::DanglingInput {
                        factory: requester.clone(),
                        source_factory: input.factory_id,
                        part: input.output_part,
                    });
                    continue;
                };

                factories[source]
                    .dependencies
                    .entry(requester.clone())
                    .or_default()
                    .requested_by
                    .push(DependencyRequest {
                        part: input.output_part.clone(),
                        amount: input.amount,
                    });
                edges += 1;
                kept.push(input);
            }

            factories[i].inputs = kept;
        }

        tracing::debug!(factories = factories.len(), edges, "dependency graph rebuilt");
        Self { factories }
    }

    /// Total requested and supplied per part on every edge.
    ///
    /// Supply is taken from the supplying factory's surplus and only credited
    /// when that surplus is nonzero. A metric with no credited supply stays
    /// unsatisfied.
    pub fn measure(mut self) -> Vec<Factory> {
        for factory in &mut self.factories {
            let surplus = &factory.surplus;
            for dependency in factory.dependencies.values_mut() {
                dependency.metrics.clear();

                for request in &dependency.requested_by {
                    let metric = dependency
                        .metrics
                        .entry(request.part.clone())
                        .or_insert_with(|| Metric::new(request.part.clone()));
                    metric.request += request.amount;

                    if let Some(&available) = surplus.get(&request.part).filter(|s| **s != 0.0) {
                        metric.supply += available;
                        metric.is_request_satisfied = metric.supply >= metric.request;
                    }
                }
            }
        }
        self.factories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Input, Product};

    fn id(n: u64) -> FactoryId {
        FactoryId::Number(n)
    }

    fn supplier(surplus: &[(&str, f64)]) -> Factory {
        let mut factory = Factory::new(1, "A").with_product(Product::new("x", "x", 0.0));
        for (part, amount) in surplus {
            factory.surplus.insert(part.to_string(), *amount);
        }
        factory
    }

    fn link(factories: Vec<Factory>) -> (Vec<Factory>, Vec<PlanIssue>) {
        let mut diagnostics = Diagnostics::new();
        let out = DependencyGraph::build(factories, &mut diagnostics).measure();
        (out, diagnostics.into_issues())
    }

    #[test]
    fn short_supply_is_unsatisfied() {
        let requester = Factory::new(2, "B").with_input(Input::new(1, "x", 10.0));
        let (out, issues) = link(vec![supplier(&[("x", 6.0)]), requester]);

        assert!(issues.is_empty());
        let metric = &out[0].dependencies[&id(2)].metrics["x"];
        assert_eq!(metric.request, 10.0);
        assert_eq!(metric.supply, 6.0);
        assert!(!metric.is_request_satisfied);
    }

    #[test]
    fn requests_for_the_same_part_add_up() {
        let requester = Factory::new(2, "B")
            .with_input(Input::new(1, "x", 5.0))
            .with_input(Input::new(1, "x", 7.0));
        let (out, _) = link(vec![supplier(&[("x", 30.0)]), requester]);

        let dependency = &out[0].dependencies[&id(2)];
        assert_eq!(dependency.requested_by.len(), 2);
        assert_eq!(dependency.metrics["x"].request, 12.0);
        // surplus is credited once per request record
        assert_eq!(dependency.metrics["x"].supply, 60.0);
        assert!(dependency.metrics["x"].is_request_satisfied);
    }

    #[test]
    fn no_surplus_means_no_supply() {
        let requester = Factory::new(2, "B").with_input(Input::new(1, "x", 1.0));
        let (out, _) = link(vec![supplier(&[]), requester]);

        let metric = &out[0].dependencies[&id(2)].metrics["x"];
        assert_eq!(metric.supply, 0.0);
        assert!(!metric.is_request_satisfied);
    }

    #[test]
    fn dangling_inputs_are_pruned() {
        let requester = Factory::new(2, "B")
            .with_input(Input::new(1, "x", 1.0))
            .with_input(Input::new(42, "x", 1.0));
        let (out, issues) = link(vec![supplier(&[("x", 1.0)]), requester]);

        assert_eq!(out[1].inputs, vec![Input::new(1, "x", 1.0)]);
        assert_eq!(
            issues,
            vec![PlanIssue::DanglingInput {
                factory: id(2),
                source_factory: id(42),
                part: "x".into()
            }]
        );
    }

    #[test]
    fn edges_are_keyed_by_requester_on_the_supplier() {
        let b = Factory::new(2, "B").with_input(Input::new(1, "x", 1.0));
        let c = Factory::new(3, "C").with_input(Input::new(1, "x", 2.0));
        let (out, _) = link(vec![supplier(&[("x", 5.0)]), b, c]);

        let keys: Vec<_> = out[0].dependencies.keys().cloned().collect();
        assert_eq!(keys, vec![id(2), id(3)]);
        assert!(out[1].dependencies.is_empty());
        assert!(out[2].dependencies.is_empty());
    }

    #[test]
    fn stale_edges_are_cleared() {
        let mut stale = supplier(&[]);
        stale.dependencies.insert(id(99), Default::default());
        let (out, _) = link(vec![stale]);
        assert!(out[0].dependencies.is_empty());
    }
}
