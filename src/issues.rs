//! Recoverable conditions found while planning
//!
//! None of these abort a recompute. They are collected so callers can show
//! them, and each one is logged the moment it is recorded.

use crate::models::FactoryId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanIssue {
    #[error("factory {factory}: product '{product}' references unknown recipe '{recipe}'")]
    MissingRecipe {
        factory: FactoryId,
        product: String,
        recipe: String,
    },

    #[error("recipe '{recipe}': invalid amount for ingredient '{part}', skipping")]
    InvalidIngredientAmount {
        factory: FactoryId,
        recipe: String,
        part: String,
    },

    #[error("factory {factory}: input references unknown factory {source_factory}")]
    MissingFactory {
        factory: FactoryId,
        source_factory: FactoryId,
    },

    #[error("factory {factory}: product '{part}' not found in factory {source_factory}")]
    MissingProduct {
        factory: FactoryId,
        source_factory: FactoryId,
        part: String,
    },

    #[error("factory {factory}: removed input of '{part}' from unknown factory {source_factory}")]
    DanglingInput {
        factory: FactoryId,
        source_factory: FactoryId,
        part: String,
    },
}

impl PlanIssue {
    /// The factory whose authored data triggered the issue
    pub fn factory(&self) -> &FactoryId {
        match self {
            Self::MissingRecipe { factory, .. }
            | Self::InvalidIngredientAmount { factory, .. }
            | Self::MissingFactory { factory, .. }
            | Self::MissingProduct { factory, .. }
            | Self::DanglingInput { factory, .. } => factory,
        }
    }
}

/// Collector for issues raised during one recompute
#[derive(Debug, Default)]
pub struct Diagnostics {
    issues: Vec<PlanIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, issue: PlanIssue) {
        tracing::warn!(factory = %issue.factory(), "{issue}");
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn into_issues(self) -> Vec<PlanIssue> {
        self.issues
    }
}
