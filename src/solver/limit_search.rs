//! Smallest feasible time limit for a post-emergency instance.
//!
//! Retry orchestration around a solver: binary search over the limit, each
//! probe on a fresh problem copy. The search range is
//!
//! - lower: max(largest backlog, ceil(total work / operators),
//!   smallest backlog + largest patient cost)
//! - upper: max(largest backlog, smallest backlog + total patient cost),
//!   always feasible by giving every patient to the least-loaded operator.

use tracing::{debug, info};

use super::{AllocationSolver, SolveOutcome};
use crate::models::{Plan, PostEmergencyAction, PostEmergencyProblem};

/// Finds the smallest time limit under which `solver` finds a schedule.
///
/// Returns `Optimal` with the limit as objective, `ProvenInfeasible` when no
/// limit helps (patients but no operators), or `Inconclusive` as soon as one
/// probe is inconclusive. The time limit of `problem` itself is ignored.
///
/// # Example
/// ```
/// use u_response::models::{PostEmergencyInput, PostEmergencyProblem};
/// use u_response::solver::{minimum_time_limit, BacktrackingSolver};
///
/// let input = PostEmergencyInput::new(0)
///     .with_patients(vec![3, 4])
///     .with_operators(vec![0, 0]);
/// let problem = PostEmergencyProblem::from_input(&input).unwrap();
///
/// let outcome = minimum_time_limit(&problem, &BacktrackingSolver::new());
/// assert_eq!(outcome.objective(), Some(4));
/// ```
pub fn minimum_time_limit<S>(
    problem: &PostEmergencyProblem,
    solver: &S,
) -> SolveOutcome<PostEmergencyAction>
where
    S: AllocationSolver<PostEmergencyProblem>,
{
    let operators = problem.operators();
    if operators.is_empty() {
        return if problem.patients().is_empty() {
            SolveOutcome::Optimal {
                plan: Plan::new(),
                objective: 0,
            }
        } else {
            SolveOutcome::ProvenInfeasible
        };
    }

    let max_backlog = operators.iter().map(|o| o.backlog).max().unwrap_or(0);
    let min_backlog = operators.iter().map(|o| o.backlog).min().unwrap_or(0);
    let max_cost = problem.patients().iter().map(|p| p.cost).max().unwrap_or(0);
    let work = problem.total_backlog() as u128 + problem.total_cost() as u128;
    let average = work.div_ceil(operators.len() as u128) as u64;

    let mut lo = max_backlog.max(average);
    if max_cost > 0 {
        lo = lo.max(min_backlog + max_cost);
    }
    let mut hi = max_backlog.max(min_backlog + problem.total_cost());

    let mut best = match solver.solve(&problem.with_time_limit(hi)) {
        SolveOutcome::Optimal { plan, .. } | SolveOutcome::Feasible { plan } => plan,
        SolveOutcome::ProvenInfeasible => {
            return SolveOutcome::inconclusive(format!(
                "{} reported the always-feasible limit {hi} as infeasible",
                solver.name()
            ))
        }
        inconclusive @ SolveOutcome::Inconclusive { .. } => return inconclusive,
    };

    let mut probes = 1usize;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        probes += 1;
        match solver.solve(&problem.with_time_limit(mid)) {
            SolveOutcome::Optimal { plan, .. } | SolveOutcome::Feasible { plan } => {
                debug!(limit = mid, "feasible");
                best = plan;
                hi = mid;
            }
            SolveOutcome::ProvenInfeasible => {
                debug!(limit = mid, "infeasible");
                lo = mid + 1;
            }
            inconclusive @ SolveOutcome::Inconclusive { .. } => return inconclusive,
        }
    }

    info!(solver = solver.name(), limit = hi, probes, "minimum time limit found");
    SolveOutcome::Optimal {
        plan: best,
        objective: hi,
    }
}
