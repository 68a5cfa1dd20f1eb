//! Best-first (uniform-cost) search over any allocation model.
//!
//! # Algorithm
//!
//! 1. Push the initial state with its objective value.
//! 2. Pop the open node with the lowest objective (deepest first on ties).
//! 3. Stop at the first goal popped: objectives never decrease along a
//!    transition, so no cheaper goal remains in the frontier.
//! 4. Otherwise expand `successors`, skipping dead ends and states already
//!    generated.
//!
//! An exhausted frontier proves infeasibility; hitting the node limit is
//! inconclusive.
//!
//! # Reference
//! Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach", Ch. 3.4

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, info, trace};

use super::{solved, AllocationSolver, SolveOutcome};
use crate::config::{SearchConfig, DEFAULT_NODE_LIMIT};
use crate::models::{AllocationModel, Plan};

/// Generic exhaustive solver.
///
/// Exact but exponential; intended for small instances and as a reference
/// to check specialised solvers against.
#[derive(Debug, Clone)]
pub struct BestFirstSolver {
    node_limit: usize,
}

struct Node<S, A> {
    state: S,
    parent: Option<usize>,
    action: Option<A>,
}

impl BestFirstSolver {
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

    /// Sets the maximum number of expanded nodes.
    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = node_limit;
        self
    }

    fn extract_plan<S, A: Clone>(nodes: &[Node<S, A>], mut index: usize) -> Plan<A> {
        let mut actions = Vec::new();
        while let Some(action) = &nodes[index].action {
            actions.push(action.clone());
            match nodes[index].parent {
                Some(parent) => index = parent,
                None => break,
            }
        }
        actions.reverse();
        actions.into()
    }
}

impl Default for BestFirstSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: AllocationModel> AllocationSolver<M> for BestFirstSolver {
    fn name(&self) -> &'static str {
        "best-first"
    }

    fn solve(&self, model: &M) -> SolveOutcome<M::Action> {
        let initial = model.initial_state();
        if model.is_dead_end(&initial) {
            info!(solver = "best-first", "initial state is a dead end");
            return SolveOutcome::ProvenInfeasible;
        }

        let cost_of = |state: &M::State| model.objective(state).unwrap_or(0);

        let mut nodes: Vec<Node<M::State, M::Action>> = Vec::new();
        let mut seen: HashSet<M::State> = HashSet::new();
        // (lowest cost, deepest, oldest)
        let mut open = BinaryHeap::new();

        seen.insert(initial.clone());
        open.push((Reverse(cost_of(&initial)), 0usize, Reverse(0usize)));
        nodes.push(Node {
            state: initial,
            parent: None,
            action: None,
        });

        let mut expanded = 0usize;
        let mut pruned = 0usize;

        while let Some((Reverse(cost), depth, Reverse(index))) = open.pop() {
            if model.is_goal(&nodes[index].state) {
                info!(
                    solver = "best-first",
                    expanded,
                    pruned,
                    objective = cost,
                    "goal reached"
                );
                let plan = Self::extract_plan(&nodes, index);
                return solved(model, &nodes[index].state, plan);
            }

            if expanded >= self.node_limit {
                info!(solver = "best-first", expanded, "node limit reached");
                return SolveOutcome::inconclusive(format!(
                    "node limit of {} expansions reached",
                    self.node_limit
                ));
            }
            expanded += 1;
            trace!(index, depth, cost, "expanding");

            for action in model.successors(&nodes[index].state) {
                let mut next = nodes[index].state.clone();
                if let Err(err) = model.apply(&mut next, &action) {
                    // successors() must only offer legal actions
                    return SolveOutcome::inconclusive(format!(
                        "model offered illegal action {action}: {err}"
                    ));
                }
                if model.is_dead_end(&next) {
                    pruned += 1;
                    continue;
                }
                if !seen.insert(next.clone()) {
                    continue;
                }
                let child = nodes.len();
                open.push((Reverse(cost_of(&next)), depth + 1, Reverse(child)));
                nodes.push(Node {
                    state: next,
                    parent: Some(index),
                    action: Some(action),
                });
            }
        }

        debug!(expanded, pruned, "frontier exhausted");
        info!(solver = "best-first", expanded, "proven infeasible");
        SolveOutcome::ProvenInfeasible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmergencyConfig;
    use crate::models::{
        AllocationModel, EmergencyAction, EmergencyInput, EmergencyProblem, ObjectiveMode,
        OperatorId, PostEmergencyInput, PostEmergencyProblem,
    };

    fn scenario_a() -> EmergencyProblem {
        let input = EmergencyInput::new(2)
            .with_operator(0, vec![0])
            .with_operator(1, vec![0, 1])
            .with_operator(1, vec![1])
            .with_quotas(vec![1, 1]);
        EmergencyProblem::from_input(&input).unwrap()
    }

    #[test]
    fn test_scenario_a_optimal() {
        let problem = scenario_a();
        let outcome = BestFirstSolver::new().solve(&problem);
        assert_eq!(outcome.objective(), Some(1));

        let plan = outcome.plan().unwrap();
        let state = problem.replay(plan).unwrap();
        assert_eq!(problem.max_selected_cost(&state), 1);
        assert!(state.is_selected(OperatorId(0)));
        let selects = plan
            .iter()
            .filter(|a| matches!(a, EmergencyAction::Select(_)))
            .count();
        assert_eq!(selects, 1);
    }

    #[test]
    fn test_prefers_nearer_operators() {
        // r0 can be covered from location 1 or 3; r1 only from location 2.
        let input = EmergencyInput::new(4)
            .with_operator(3, vec![0])
            .with_operator(1, vec![0])
            .with_operator(2, vec![1])
            .with_quotas(vec![1, 1]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        let outcome = BestFirstSolver::new().solve(&problem);
        // base 2: weights 7, 1, 3
        assert_eq!(outcome.objective(), Some(3));
    }

    #[test]
    fn test_emergency_shortfall_infeasible() {
        let input = EmergencyInput::new(2)
            .with_operator(1, vec![0])
            .with_operator(1, vec![1])
            .with_quotas(vec![2, 1]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        assert!(BestFirstSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_post_emergency_feasible_split() {
        let input = PostEmergencyInput::new(4)
            .with_patients(vec![3, 4])
            .with_operators(vec![0, 0]);
        let problem = PostEmergencyProblem::from_input(&input).unwrap();
        let outcome = BestFirstSolver::new().solve(&problem);
        assert_eq!(outcome.status(), "feasible");
        assert!(problem.replay(outcome.plan().unwrap()).is_ok());
    }

    #[test]
    fn test_post_emergency_single_operator_infeasible() {
        let input = PostEmergencyInput::new(4)
            .with_patients(vec![3, 4])
            .with_operators(vec![0]);
        let problem = PostEmergencyProblem::from_input(&input).unwrap();
        assert!(BestFirstSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_zero_limit_infeasible() {
        let input = PostEmergencyInput::new(0)
            .with_patients(vec![2])
            .with_operators(vec![0, 0]);
        let problem = PostEmergencyProblem::from_input(&input).unwrap();
        assert!(BestFirstSolver::new().solve(&problem).is_infeasible());
    }

    #[test]
    fn test_node_limit_inconclusive() {
        let input = PostEmergencyInput::new(100)
            .with_patients(vec![1; 8])
            .with_operators(vec![0, 1, 2]);
        let problem = PostEmergencyProblem::from_input(&input).unwrap();
        let outcome = BestFirstSolver::new().with_node_limit(2).solve(&problem);
        assert!(outcome.is_inconclusive());
    }

    #[test]
    fn test_idempotent_verdict() {
        let problem = scenario_a();
        let solver = BestFirstSolver::new();
        let first = solver.solve(&problem);
        let second = solver.solve(&problem);
        assert_eq!(first.status(), second.status());
        assert_eq!(first.objective(), second.objective());
    }

    #[test]
    fn test_cumulative_mode_is_feasible_only() {
        let input = EmergencyInput::new(3)
            .with_operator(1, vec![0])
            .with_operator(2, vec![1])
            .with_quotas(vec![1, 1]);
        let config = EmergencyConfig {
            objective: ObjectiveMode::Cumulative,
            ..Default::default()
        };
        let problem = EmergencyProblem::from_input_with(&input, &config).unwrap();
        let outcome = BestFirstSolver::new().solve(&problem);

        // The fluent sums to 4, the farthest selected weight is 3.
        assert_eq!(outcome.status(), "feasible");
        assert_eq!(outcome.objective(), None);
        let state = problem.replay(outcome.plan().unwrap()).unwrap();
        assert_eq!(state.objective(), 4);
        assert_eq!(problem.max_selected_cost(&state), 3);
    }

    #[test]
    fn test_idempotent_post_emergency_verdicts() {
        let split = PostEmergencyInput::new(4)
            .with_patients(vec![3, 4])
            .with_operators(vec![0, 0]);
        let single = PostEmergencyInput::new(4)
            .with_patients(vec![3, 4])
            .with_operators(vec![0]);
        let solver = BestFirstSolver::new();

        for input in [split, single] {
            let problem = PostEmergencyProblem::from_input(&input).unwrap();
            let first = solver.solve(&problem);
            let second = solver.solve(&problem);
            assert_eq!(first.status(), second.status());
            assert_eq!(first.is_infeasible(), input.operator_backlogs.len() == 1);
        }
    }

    #[test]
    fn test_idempotent_infeasible_emergency() {
        let input = EmergencyInput::new(3)
            .with_operator(2, vec![0])
            .with_operator(1, vec![1])
            .with_quotas(vec![2, 1]);
        let problem = EmergencyProblem::from_input(&input).unwrap();
        let solver = BestFirstSolver::new();
        assert!(solver.solve(&problem).is_infeasible());
        assert!(solver.solve(&problem).is_infeasible());
    }
}
