//! Human-readable plan output

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::{Factory, FactoryId};
use crate::planner::Plan;

/// Format one factory as an indented tree of products, requirements and edges
pub fn format_factory_tree(factory: &Factory) -> String {
    let mut output = String::new();
    let status = if factory.inputs_satisfied { "satisfied" } else { "SHORT" };
    let _ = writeln!(output, "#{} {} ({})", factory.id, factory.name, status);

    for product in &factory.products {
        let _ = writeln!(
            output,
            "  builds {:.2}x {} via {}",
            product.amount, product.id, product.recipe
        );
    }

    for (part, req) in &factory.requirements {
        let source = if factory.raw_resources.contains_key(part) {
            "raw"
        } else if factory.internal_products.contains_key(part) {
            "internal"
        } else if req.amount_supplied_via_input > 0.0 {
            "input"
        } else {
            "none"
        };
        let _ = writeln!(
            output,
            "    needs {} {:.2}, supplied {:.2} ({}), remaining {:.2}",
            part, req.amount_required, req.amount_supplied, source, req.amount_remaining
        );
    }

    for (part, amount) in &factory.surplus {
        let _ = writeln!(output, "  surplus {} {:.2}", part, amount);
    }

    for (requester, dependency) in &factory.dependencies {
        for metric in dependency.metrics.values() {
            let mark = if metric.is_request_satisfied { "ok" } else { "SHORT" };
            let _ = writeln!(
                output,
                "  -> #{} wants {} {:.2}, supply {:.2} [{}]",
                requester, metric.part, metric.request, metric.supply, mark
            );
        }
    }

    output
}

/// A dependency edge whose request exceeds the supplier's surplus
#[derive(Debug, Clone, PartialEq)]
pub struct Shortage {
    pub supplier: FactoryId,
    pub requester: FactoryId,
    pub part: String,
    pub request: f64,
    pub supply: f64,
}

/// Summary of a recompute
#[derive(Debug)]
pub struct PlanSummary {
    pub factory_count: usize,
    pub satisfied_count: usize,
    /// `(factory, part, remaining)` for every unmet requirement
    pub shortfalls: Vec<(FactoryId, String, f64)>,
    /// Raw extraction summed across factories, by resource name
    pub raw_totals: Vec<(String, f64)>,
    pub shortages: Vec<Shortage>,
    pub issue_count: usize,
}

impl PlanSummary {
    pub fn from_plan(plan: &Plan) -> Self {
        let mut shortfalls = Vec::new();
        let mut raw_totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut shortages = Vec::new();

        for factory in &plan.factories {
            for (part, req) in &factory.requirements {
                if req.satisfied == Some(false) {
                    shortfalls.push((factory.id.clone(), part.clone(), req.amount_remaining));
                }
            }
            for raw in factory.raw_resources.values() {
                *raw_totals.entry(raw.name.clone()).or_default() += raw.amount;
            }
            for (requester, dependency) in &factory.dependencies {
                for metric in dependency.metrics.values() {
                    if !metric.is_request_satisfied {
                        shortages.push(Shortage {
                            supplier: factory.id.clone(),
                            requester: requester.clone(),
                            part: metric.part.clone(),
                            request: metric.request,
                            supply: metric.supply,
                        });
                    }
                }
            }
        }

        PlanSummary {
            factory_count: plan.factories.len(),
            satisfied_count: plan.factories.iter().filter(|f| f.inputs_satisfied).count(),
            shortfalls,
            raw_totals: raw_totals.into_iter().collect(),
            shortages,
            issue_count: plan.issues.len(),
        }
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Plan Summary ===")?;
        writeln!(
            f,
            "Factories: {} ({} satisfied)",
            self.factory_count, self.satisfied_count
        )?;
        writeln!(f)?;

        writeln!(f, "Unmet requirements:")?;
        if self.shortfalls.is_empty() {
            writeln!(f, "  none")?;
        }
        for (factory, part, remaining) in &self.shortfalls {
            writeln!(f, "  #{} {} short by {:.2}", factory, part, remaining)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw extraction:")?;
        for (name, amount) in &self.raw_totals {
            writeln!(f, "  {} {:.2}", name, amount)?;
        }
        writeln!(f)?;

        writeln!(f, "Undersupplied dependencies:")?;
        if self.shortages.is_empty() {
            writeln!(f, "  none")?;
        }
        for s in &self.shortages {
            writeln!(
                f,
                "  #{} -> #{}: {} requested {:.2}, available {:.2}",
                s.supplier, s.requester, s.part, s.request, s.supply
            )?;
        }

        if self.issue_count > 0 {
            writeln!(f)?;
            writeln!(f, "{} data issue(s) found, see log", self.issue_count)?;
        }

        Ok(())
    }
}
