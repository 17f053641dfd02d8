//! Factory network planner
//!
//! Works out, for every factory in a network, how much of each part it needs,
//! where that supply comes from (raw extraction, its own production lines, or
//! other factories), and how each factory's surplus covers what others ask of
//! it. [`planner::recompute`] is the entry point.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod dependencies;
pub mod extract;
pub mod index;
pub mod issues;
pub mod models;
pub mod planner;
pub mod report;
pub mod sync;

pub use catalog::GameCatalog;
pub use issues::PlanIssue;
pub use models::{Factory, FactoryId, Input, Product};
pub use planner::{Plan, recompute, recompute_in_place};
