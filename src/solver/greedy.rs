//! Greedy packer for the post-emergency model.
//!
//! # Algorithm
//!
//! Longest processing time first: patients sorted by cost (descending), each
//! assigned to the currently least-loaded operator (lowest identifier on
//! ties). Fast baseline; a failure proves nothing.
//!
//! # Complexity
//! O(n log n + n · m) for n patients and m operators.
//!
//! # Reference
//! Graham (1969), "Bounds on Multiprocessing Timing Anomalies"

use tracing::info;

use super::{AllocationSolver, SolveOutcome};
use crate::models::{
    AllocationModel, OperatorId, PatientId, Plan, PostEmergencyAction, PostEmergencyProblem,
};

/// LPT heuristic for [`PostEmergencyProblem`].
///
/// Never reports `ProvenInfeasible`: when the greedy loads break the limit
/// the outcome is `Inconclusive`.
#[derive(Debug, Clone, Default)]
pub struct GreedySolver;

impl GreedySolver {
    /// Creates a new greedy solver.
    pub fn new() -> Self {
        Self
    }
}

impl AllocationSolver<PostEmergencyProblem> for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, problem: &PostEmergencyProblem) -> SolveOutcome<PostEmergencyAction> {
        if problem.operators().is_empty() && !problem.patients().is_empty() {
            return SolveOutcome::inconclusive("no operator to assign patients to");
        }

        let mut loads: Vec<u64> = problem.operators().iter().map(|o| o.backlog).collect();
        let mut patients: Vec<usize> = (0..problem.patients().len()).collect();
        patients.sort_by_key(|&p| (std::cmp::Reverse(problem.patients()[p].cost), p));

        let mut assignment = vec![0usize; patients.len()];
        for p in patients {
            let Some(op) = (0..loads.len()).min_by_key(|&o| (loads[o], o)) else {
                break;
            };
            loads[op] = loads[op].saturating_add(problem.patients()[p].cost);
            assignment[p] = op;
        }

        let max_load = loads.iter().copied().max().unwrap_or(0);
        if max_load > problem.time_limit() {
            info!(solver = "greedy", max_load, limit = problem.time_limit(), "limit exceeded");
            return SolveOutcome::inconclusive(format!(
                "greedy load {max_load} exceeds limit {}",
                problem.time_limit()
            ));
        }

        let mut plan: Plan<_> = assignment
            .iter()
            .enumerate()
            .map(|(p, &o)| PostEmergencyAction::assign(PatientId(p), OperatorId(o)))
            .collect();
        for op in problem.operators() {
            plan.push(PostEmergencyAction::Submit(op.id));
        }

        if let Err(err) = problem.replay(&plan) {
            return SolveOutcome::inconclusive(format!("constructed plan is invalid: {err}"));
        }
        info!(solver = "greedy", max_load, "goal reached");
        SolveOutcome::Feasible { plan }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostEmergencyInput;
    use crate::solver::BacktrackingSolver;

    fn problem(limit: u64, costs: Vec<u64>, backlogs: Vec<u64>) -> PostEmergencyProblem {
        let input = PostEmergencyInput::new(limit)
            .with_patients(costs)
            .with_operators(backlogs);
        PostEmergencyProblem::from_input(&input).unwrap()
    }

    #[test]
    fn test_scenario_b() {
        let problem = problem(4, vec![3, 4], vec![0, 0]);
        let outcome = GreedySolver::new().solve(&problem);
        assert_eq!(outcome.status(), "feasible");
        let state = problem.replay(outcome.plan().unwrap()).unwrap();
        assert_eq!(state.accumulated_time(OperatorId(0)), 4);
        assert_eq!(state.accumulated_time(OperatorId(1)), 3);
    }

    #[test]
    fn test_respects_backlog() {
        let problem = problem(6, vec![2, 2], vec![5, 0]);
        let state = problem
            .replay(GreedySolver::new().solve(&problem).plan().unwrap())
            .unwrap();
        assert_eq!(state.accumulated_time(OperatorId(0)), 5);
        assert_eq!(state.accumulated_time(OperatorId(1)), 4);
    }

    #[test]
    fn test_failure_is_not_infeasibility() {
        // LPT ends at 7 | 5, but {3,3} {2,2,2} fits under 6.
        let problem = problem(6, vec![3, 3, 2, 2, 2], vec![0, 0]);
        let greedy = GreedySolver::new().solve(&problem);
        assert!(greedy.is_inconclusive());
        assert!(BacktrackingSolver::new().solve(&problem).is_solved());
    }

    #[test]
    fn test_no_operators() {
        assert!(GreedySolver::new()
            .solve(&problem(5, vec![1], vec![]))
            .is_inconclusive());
        assert!(GreedySolver::new()
            .solve(&problem(5, vec![], vec![]))
            .is_solved());
    }
}
