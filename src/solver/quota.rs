//! Exact quota solver for the emergency model.
//!
//! # Algorithm
//!
//! With a true maximum objective, roles are independent: an operator may be
//! credited to every role it is eligible for. For each required role with
//! quota `q`, the cheapest `q` eligible operators are taken; the optimum is
//! the largest `q`-th cheapest weight over all roles. Any plan must credit
//! `q` distinct eligible operators to that role, so no plan does better.
//!
//! Selections are emitted in non-decreasing weight order, which keeps the
//! objective fluent equal to the true maximum under `Maximum` mode.
//!
//! # Complexity
//! O(R · O log O) for R roles and O operators.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{solved, AllocationSolver, SolveOutcome};
use crate::models::emergency::Operator;
use crate::models::{
    AllocationModel, EmergencyAction, EmergencyProblem, OperatorId, Plan, RoleId,
};

/// Polynomial-time solver for [`EmergencyProblem`].
///
/// Optimal under [`ObjectiveMode::Maximum`]. Under
/// [`ObjectiveMode::Cumulative`] the plan is still valid (and reuses
/// operators across roles at equal weight) but reported only as feasible.
///
/// [`ObjectiveMode::Maximum`]: crate::models::ObjectiveMode::Maximum
/// [`ObjectiveMode::Cumulative`]: crate::models::ObjectiveMode::Cumulative
#[derive(Debug, Clone, Default)]
pub struct QuotaSolver;

impl QuotaSolver {
    /// Creates a new quota solver.
    pub fn new() -> Self {
        Self
    }

    /// Picks the operators credited to each required role.
    ///
    /// Returns `None` when a role has fewer eligible operators than its
    /// quota.
    fn choose(problem: &EmergencyProblem) -> Option<BTreeMap<OperatorId, Vec<RoleId>>> {
        let mut chosen: BTreeMap<OperatorId, Vec<RoleId>> = BTreeMap::new();

        for role in problem.required_roles() {
            let mut candidates: Vec<&Operator> = problem
                .operators()
                .iter()
                .filter(|op| op.eligible_roles.contains(&role.id))
                .collect();

            if candidates.len() < role.quota as usize {
                debug!(
                    role = %role.id,
                    quota = role.quota,
                    eligible = candidates.len(),
                    "quota exceeds eligible operators"
                );
                return None;
            }

            // Cheapest first; at equal weight, reuse operators already chosen.
            candidates.sort_by_key(|op| (op.cost, !chosen.contains_key(&op.id), op.id));
            for op in candidates.into_iter().take(role.quota as usize) {
                chosen.entry(op.id).or_default().push(role.id);
            }
        }

        Some(chosen)
    }
}

impl AllocationSolver<EmergencyProblem> for QuotaSolver {
    fn name(&self) -> &'static str {
        "quota"
    }

    fn solve(&self, problem: &EmergencyProblem) -> SolveOutcome<EmergencyAction> {
        let Some(chosen) = Self::choose(problem) else {
            info!(solver = "quota", "proven infeasible");
            return SolveOutcome::ProvenInfeasible;
        };

        let mut order: Vec<&Operator> = chosen
            .keys()
            .filter_map(|&id| problem.operator(id))
            .collect();
        order.sort_by_key(|op| (op.cost, op.id));

        let mut state = problem.initial_state();
        let mut plan = Plan::new();
        for op in order {
            if !state.is_selected(op.id) {
                plan.push(EmergencyAction::Select(op.id));
            }
            for &role in chosen.get(&op.id).into_iter().flatten() {
                plan.push(EmergencyAction::assign(op.id, role));
            }
        }

        // Replay rather than trust the construction.
        for action in &plan {
            if let Err(err) = problem.apply(&mut state, action) {
                return SolveOutcome::inconclusive(format!("constructed plan is illegal: {err}"));
            }
        }
        if !problem.is_goal(&state) {
            return SolveOutcome::inconclusive("constructed plan misses the goal");
        }

        info!(
            solver = "quota",
            selected = state.selected_count(),
            objective = state.objective(),
            "goal reached"
        );
        solved(problem, &state, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmergencyConfig;
    use crate::models::{EmergencyInput, ObjectiveMode};
    use crate::solver::BestFirstSolver;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn scenario_a() -> EmergencyProblem {
        let input = EmergencyInput::new(2)
            .with_operator(0, vec![0])
            .with_operator(1, vec![0, 1])
            .with_operator(1, vec![1])
            .with_quotas(vec![1, 1]);
        EmergencyProblem::from_input(&input).unwrap()
    }

    #[test]
    fn test_scenario_a() {
        let problem = scenario_a();
        let outcome = QuotaSolver::new().solve(&problem);
        assert_eq!(outcome.objective(), Some(1));

        let plan = outcome.plan().unwrap();
        // o0 is on site: credited without a select.
        assert_eq!(plan.actions()[0], EmergencyAction::assign(OperatorId(0), RoleId(0)));
        let state = problem.replay(plan).unwrap();
        assert_eq!(problem.max_selected_cost(&state), 1);
        assert_eq!(state.selected_count(), 2);
    }

    #[test]
    fn test_quota_above_supply() {
        let input = EmergencyInput::new(2)
            .with_operator(1, vec![0])
            .with_quotas(vec![2]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        assert!(QuotaSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_no_requirements() {
        let input = EmergencyInput::new(3)
            .with_operator(2, vec![0])
            .with_quotas(vec![0]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        let outcome = QuotaSolver::new().solve(&problem);
        assert_eq!(outcome.objective(), Some(0));
        assert!(outcome.plan().unwrap().is_empty());
    }

    #[test]
    fn test_multi_quota_takes_qth_cheapest() {
        let input = EmergencyInput::new(4)
            .with_operator(3, vec![0])
            .with_operator(1, vec![0])
            .with_operator(2, vec![0])
            .with_quotas(vec![2]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        // base 1: weight == location
        let outcome = QuotaSolver::new().solve(&problem);
        assert_eq!(outcome.objective(), Some(2));
    }

    #[test]
    fn test_cumulative_reported_feasible() {
        let config = EmergencyConfig {
            objective: ObjectiveMode::Cumulative,
            ..Default::default()
        };
        let input = EmergencyInput::new(2)
            .with_operator(1, vec![0, 1])
            .with_operator(1, vec![1])
            .with_quotas(vec![1, 1]);
        let problem = EmergencyProblem::from_input_with(&input, &config).unwrap();
        let outcome = QuotaSolver::new().solve(&problem);
        assert_eq!(outcome.status(), "feasible");
        // o0 covers both roles at equal weight, so only one select is needed.
        let state = problem.replay(outcome.plan().unwrap()).unwrap();
        assert_eq!(state.selected_count(), 1);
        assert_eq!(state.objective(), 1);
    }

    #[test]
    fn test_selects_in_weight_order() {
        let input = EmergencyInput::new(4)
            .with_operator(3, vec![0])
            .with_operator(1, vec![1])
            .with_operator(2, vec![2])
            .with_quotas(vec![1, 1, 1]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        let outcome = QuotaSolver::new().solve(&problem);
        let costs: Vec<u64> = outcome
            .plan()
            .unwrap()
            .iter()
            .filter_map(|a| match a {
                EmergencyAction::Select(o) => problem.operator(*o).map(|op| op.cost),
                _ => None,
            })
            .collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_agrees_with_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..40 {
            let locations = rng.random_range(1..4);
            let roles = rng.random_range(1..4);
            let mut input = EmergencyInput::new(locations);
            for _ in 0..rng.random_range(1..5) {
                let eligible: Vec<usize> = (0..roles).filter(|_| rng.random_bool(0.5)).collect();
                input = input.with_operator(rng.random_range(0..locations), eligible);
            }
            let quotas: Vec<u32> = (0..roles).map(|_| rng.random_range(0..3)).collect();
            let problem = EmergencyProblem::from_input(&input.with_quotas(quotas)).unwrap();

            let fast = QuotaSolver::new().solve(&problem);
            let exact = BestFirstSolver::new().solve(&problem);
            assert_eq!(fast.status(), exact.status());
            assert_eq!(fast.objective(), exact.objective());

            if let Some(plan) = fast.plan() {
                let state = problem.replay(plan).unwrap();
                assert_eq!(Some(problem.max_selected_cost(&state)), fast.objective());
                for role in problem.roles() {
                    assert!(state.assigned_count(role.id) as usize <= state.selected_count());
                }
            }
        }
    }
}
