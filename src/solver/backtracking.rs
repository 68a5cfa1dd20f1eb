//! Backtracking packer for the post-emergency model.
//!
//! # Algorithm
//!
//! 1. Reject early on bounds: an operator whose backlog already exceeds the
//!    limit, total work above total capacity, or a patient that fits on no
//!    operator.
//! 2. Place patients largest cost first. For each, try every operator that
//!    stays within the limit, skipping operators whose current load equals
//!    one already tried (they are interchangeable).
//! 3. Prune when the remaining work exceeds the remaining capacity.
//!
//! The plan assigns patients in identifier order, then submits every
//! operator. Deferred submission means no operator can close early.
//!
//! # Reference
//! Martello & Toth (1990), "Knapsack Problems", Ch. 8 (bin packing)

use tracing::{debug, info};

use super::{AllocationSolver, SolveOutcome};
use crate::config::{SearchConfig, DEFAULT_NODE_LIMIT};
use crate::models::{
    AllocationModel, OperatorId, PatientId, Plan, PostEmergencyAction, PostEmergencyProblem,
};

/// Exact depth-first solver for [`PostEmergencyProblem`].
#[derive(Debug, Clone)]
pub struct BacktrackingSolver {
    node_limit: usize,
}

enum Search {
    Found,
    Exhausted,
    Aborted,
}

/// Mutable DFS state.
struct Packer<'a> {
    costs: Vec<u64>,
    /// Patient indices, largest cost first.
    order: Vec<usize>,
    loads: Vec<u64>,
    assignment: Vec<usize>,
    limit: u64,
    /// `remaining[k]` = total cost of `order[k..]`.
    remaining: Vec<u64>,
    nodes: usize,
    node_limit: usize,
    problem: &'a PostEmergencyProblem,
}

impl<'a> Packer<'a> {
    fn new(problem: &'a PostEmergencyProblem, node_limit: usize) -> Self {
        let costs: Vec<u64> = problem.patients().iter().map(|p| p.cost).collect();
        let mut order: Vec<usize> = (0..costs.len()).collect();
        order.sort_by(|&a, &b| costs[b].cmp(&costs[a]).then(a.cmp(&b)));

        let mut remaining = vec![0u64; order.len() + 1];
        for k in (0..order.len()).rev() {
            remaining[k] = remaining[k + 1] + costs[order[k]];
        }

        Self {
            loads: problem.operators().iter().map(|o| o.backlog).collect(),
            assignment: vec![0; costs.len()],
            limit: problem.time_limit(),
            costs,
            order,
            remaining,
            nodes: 0,
            node_limit,
            problem,
        }
    }

    fn capacity_left(&self) -> u128 {
        self.loads
            .iter()
            .map(|&l| u128::from(self.limit.saturating_sub(l)))
            .sum()
    }

    fn place(&mut self, k: usize) -> Search {
        if k == self.order.len() {
            return Search::Found;
        }
        if self.nodes >= self.node_limit {
            return Search::Aborted;
        }
        self.nodes += 1;

        if u128::from(self.remaining[k]) > self.capacity_left() {
            return Search::Exhausted;
        }

        let patient = self.order[k];
        let cost = self.costs[patient];
        let mut tried: Vec<u64> = Vec::new();

        for op in 0..self.loads.len() {
            let before = self.loads[op];
            if tried.contains(&before) {
                continue;
            }
            tried.push(before);
            let Some(after) = before.checked_add(cost) else {
                continue;
            };
            if after > self.limit {
                continue;
            }

            self.loads[op] = after;
            self.assignment[patient] = op;
            match self.place(k + 1) {
                Search::Found => return Search::Found,
                Search::Aborted => return Search::Aborted,
                Search::Exhausted => self.loads[op] = before,
            }
        }
        Search::Exhausted
    }

    fn plan(&self) -> Plan<PostEmergencyAction> {
        let mut plan: Plan<_> = self
            .assignment
            .iter()
            .enumerate()
            .map(|(p, &o)| PostEmergencyAction::assign(PatientId(p), OperatorId(o)))
            .collect();
        for op in self.problem.operators() {
            plan.push(PostEmergencyAction::Submit(op.id));
        }
        plan
    }
}

impl BacktrackingSolver {
    /// Creates a solver with the default node limit.
    pub fn new() -> Self {
        Self {
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }

    /// Creates a solver from search settings.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            node_limit: config.node_limit,
        }
    }

    /// Sets the maximum number of search nodes.
    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = node_limit;
        self
    }

    /// Cheap necessary conditions; `Some(reason)` proves infeasibility.
    fn bound_violation(problem: &PostEmergencyProblem) -> Option<String> {
        let limit = problem.time_limit();
        let operators = problem.operators();

        if operators.is_empty() {
            return (!problem.patients().is_empty())
                .then(|| "patients but no operators".to_string());
        }
        if let Some(op) = operators.iter().find(|o| o.backlog > limit) {
            return Some(format!("{} backlog {} exceeds limit {limit}", op.id, op.backlog));
        }

        let work = u128::from(problem.total_backlog()) + u128::from(problem.total_cost());
        let capacity = u128::from(limit) * operators.len() as u128;
        if work > capacity {
            return Some(format!("total work {work} exceeds capacity {capacity}"));
        }

        let min_backlog = operators.iter().map(|o| o.backlog).min().unwrap_or(0);
        if let Some(p) = problem
            .patients()
            .iter()
            .find(|p| u128::from(p.cost) + u128::from(min_backlog) > u128::from(limit))
        {
            return Some(format!("{} (cost {}) fits on no operator", p.id, p.cost));
        }
        None
    }
}

impl Default for BacktrackingSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationSolver<PostEmergencyProblem> for BacktrackingSolver {
    fn name(&self) -> &'static str {
        "backtracking"
    }

    fn solve(&self, problem: &PostEmergencyProblem) -> SolveOutcome<PostEmergencyAction> {
        if let Some(reason) = Self::bound_violation(problem) {
            info!(solver = "backtracking", %reason, "proven infeasible");
            return SolveOutcome::ProvenInfeasible;
        }

        let mut packer = Packer::new(problem, self.node_limit);
        let verdict = packer.place(0);
        debug!(nodes = packer.nodes, "search finished");

        match verdict {
            Search::Found => {
                let plan = packer.plan();
                if let Err(err) = problem.replay(&plan) {
                    return SolveOutcome::inconclusive(format!("constructed plan is invalid: {err}"));
                }
                info!(solver = "backtracking", nodes = packer.nodes, "goal reached");
                SolveOutcome::Feasible { plan }
            }
            Search::Exhausted => {
                info!(solver = "backtracking", nodes = packer.nodes, "proven infeasible");
                SolveOutcome::ProvenInfeasible
            }
            Search::Aborted => SolveOutcome::inconclusive(format!(
                "node limit of {} reached",
                self.node_limit
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostEmergencyInput;
    use crate::solver::BestFirstSolver;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn problem(limit: u64, costs: Vec<u64>, backlogs: Vec<u64>) -> PostEmergencyProblem {
        let input = PostEmergencyInput::new(limit)
            .with_patients(costs)
            .with_operators(backlogs);
        PostEmergencyProblem::from_input(&input).unwrap()
    }

    #[test]
    fn test_scenario_b_split() {
        let problem = problem(4, vec![3, 4], vec![0, 0]);
        let outcome = BacktrackingSolver::new().solve(&problem);
        let plan = outcome.plan().unwrap();
        let state = problem.replay(plan).unwrap();
        let mut loads = vec![
            state.accumulated_time(OperatorId(0)),
            state.accumulated_time(OperatorId(1)),
        ];
        loads.sort();
        assert_eq!(loads, vec![3, 4]);
    }

    #[test]
    fn test_scenario_b_single_operator() {
        let problem = problem(4, vec![3, 4], vec![0]);
        assert!(BacktrackingSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_scenario_c_zero_limit() {
        let problem = problem(0, vec![1], vec![0, 0, 0]);
        assert!(BacktrackingSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_backlog_over_limit() {
        // No patients, but one operator can never submit.
        let problem = problem(3, vec![], vec![1, 5]);
        assert!(BacktrackingSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_no_operators() {
        let empty = problem(0, vec![], vec![]);
        let outcome = BacktrackingSolver::new().solve(&empty);
        assert!(outcome.plan().unwrap().is_empty());

        let stranded = problem(10, vec![1], vec![]);
        assert!(BacktrackingSolver::new().solve(&stranded).is_infeasible());
    }

    #[test]
    fn test_tight_packing_needs_backtracking() {
        // Largest-first to least-loaded ends at 7 | 5; only {3,3} {2,2,2} fits.
        let problem = problem(6, vec![2, 3, 2, 3, 2], vec![0, 0]);
        assert!(BacktrackingSolver::new().solve(&problem).is_solved());

        // {7,3} {6,4} {5,5}
        let problem = problem_three();
        assert!(BacktrackingSolver::new().solve(&problem).is_solved());
    }

    fn problem_three() -> PostEmergencyProblem {
        problem(10, vec![3, 4, 5, 5, 6, 7], vec![0, 0, 0])
    }

    #[test]
    fn test_node_limit() {
        let problem = problem_three();
        let outcome = BacktrackingSolver::new().with_node_limit(1).solve(&problem);
        assert!(outcome.is_inconclusive());
    }

    #[test]
    fn test_trace_properties() {
        let problem = problem(9, vec![2, 7, 3, 1, 4], vec![1, 0, 3]);
        let plan = BacktrackingSolver::new().solve(&problem).into_plan().unwrap();

        let mut seen = vec![0usize; problem.patients().len()];
        let mut expected: Vec<u64> = problem.operators().iter().map(|o| o.backlog).collect();
        for action in &plan {
            if let PostEmergencyAction::AssignPatient { patient, operator } = action {
                seen[patient.index()] += 1;
                expected[operator.index()] += problem.patients()[patient.index()].cost;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));

        let state = problem.replay(&plan).unwrap();
        for op in problem.operators() {
            assert_eq!(state.accumulated_time(op.id), expected[op.id.index()]);
            assert!(state.accumulated_time(op.id) <= problem.time_limit());
        }
    }

    #[test]
    fn test_agrees_with_exhaustive_search() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..60 {
            let costs: Vec<u64> = (0..rng.random_range(0..6))
                .map(|_| rng.random_range(0..6))
                .collect();
            let backlogs: Vec<u64> = (0..rng.random_range(1..4))
                .map(|_| rng.random_range(0..3))
                .collect();
            let limit = rng.random_range(0..10);
            let problem = problem(limit, costs, backlogs);

            let fast = BacktrackingSolver::new().solve(&problem);
            let exact = BestFirstSolver::new().solve(&problem);
            assert_eq!(fast.is_solved(), exact.is_solved(), "{problem:?}");
            assert_eq!(fast.is_infeasible(), exact.is_infeasible(), "{problem:?}");
        }
    }
}
