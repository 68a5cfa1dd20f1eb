//! Solvers for allocation models.
//!
//! Search is a pluggable strategy behind [`AllocationSolver`]: any solver
//! consumes a fully built model and returns a [`SolveOutcome`]. Models never
//! depend on a particular solver.
//!
//! | Solver | Model | Verdicts |
//! |--------|-------|----------|
//! | [`BestFirstSolver`] | any [`AllocationModel`] | optimal / feasible / infeasible / inconclusive |
//! | [`QuotaSolver`] | emergency | optimal (maximum mode) / feasible / infeasible |
//! | [`BacktrackingSolver`] | post-emergency | feasible / infeasible / inconclusive |
//! | [`GreedySolver`] | post-emergency | feasible / inconclusive |
//!
//! [`minimum_time_limit`] wraps a post-emergency solver in a retry loop over
//! the time limit.

mod backtracking;
mod best_first;
mod greedy;
mod limit_search;
mod quota;

pub use backtracking::BacktrackingSolver;
pub use best_first::BestFirstSolver;
pub use greedy::GreedySolver;
pub use limit_search::minimum_time_limit;
pub use quota::QuotaSolver;

use serde::{Deserialize, Serialize};

use crate::models::{AllocationModel, Plan};

/// A search or optimization strategy for one model type.
pub trait AllocationSolver<M: AllocationModel> {
    /// Solver name (for logs).
    fn name(&self) -> &'static str;

    /// Solves the model from its initial state.
    ///
    /// Must not report `ProvenInfeasible` unless the goal is unreachable
    /// under every sequence of legal transitions.
    fn solve(&self, model: &M) -> SolveOutcome<M::Action>;
}

/// Verdict of a solve attempt.
///
/// `ProvenInfeasible` and `Inconclusive` are ordinary outcomes, not errors;
/// callers may react by relaxing the instance and retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SolveOutcome<A> {
    /// A goal-reaching plan with the minimum objective value.
    Optimal { plan: Plan<A>, objective: u64 },
    /// A goal-reaching plan, with no optimality claim.
    Feasible { plan: Plan<A> },
    /// No sequence of legal transitions reaches the goal.
    ProvenInfeasible,
    /// The solver could not decide within its own bounds.
    Inconclusive { reason: String },
}

impl<A> SolveOutcome<A> {
    /// Creates an inconclusive outcome.
    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self::Inconclusive {
            reason: reason.into(),
        }
    }

    /// Whether a plan was found.
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Optimal { .. } | Self::Feasible { .. })
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::ProvenInfeasible)
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Self::Inconclusive { .. })
    }

    /// The plan, if one was found.
    pub fn plan(&self) -> Option<&Plan<A>> {
        match self {
            Self::Optimal { plan, .. } | Self::Feasible { plan } => Some(plan),
            _ => None,
        }
    }

    pub fn into_plan(self) -> Option<Plan<A>> {
        match self {
            Self::Optimal { plan, .. } | Self::Feasible { plan } => Some(plan),
            _ => None,
        }
    }

    /// The proven optimal objective value.
    pub fn objective(&self) -> Option<u64> {
        match self {
            Self::Optimal { objective, .. } => Some(*objective),
            _ => None,
        }
    }

    /// Short status label.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Optimal { .. } => "optimal",
            Self::Feasible { .. } => "feasible",
            Self::ProvenInfeasible => "infeasible",
            Self::Inconclusive { .. } => "inconclusive",
        }
    }
}

/// Wraps a goal-reaching plan that minimizes the model's objective.
///
/// Satisfaction models, and models whose objective is only a search guide,
/// yield `Feasible`.
pub(crate) fn solved<M: AllocationModel>(
    model: &M,
    state: &M::State,
    plan: Plan<M::Action>,
) -> SolveOutcome<M::Action> {
    match model.objective(state) {
        Some(objective) if model.objective_is_exact() => {
            SolveOutcome::Optimal { plan, objective }
        }
        _ => SolveOutcome::Feasible { plan },
    }
}
