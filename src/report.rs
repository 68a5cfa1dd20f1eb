//! Plan quality indicators.
//!
//! Recomputes indicators from a plan trace independently of the state
//! fluents, so they can cross-check a solver's result.
//!
//! # Indicators
//!
//! | Report | Indicator | Definition |
//! |--------|-----------|-----------|
//! | Load | Final load | Backlog + cost of assigned patients |
//! | Load | Slack | max(0, limit - final load) |
//! | Load | Utilization | Total final load / (operators · limit) |
//! | Selection | Coverage | Operators credited per role |
//! | Selection | Max weighted distance | Largest weight among selected operators |

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ModelError;
use crate::models::{
    AllocationModel, EmergencyAction, EmergencyProblem, OperatorId, PatientId, Plan,
    PostEmergencyAction, PostEmergencyProblem, RoleId,
};

/// Final load of one post-emergency operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorLoad {
    pub operator: OperatorId,
    pub backlog: u64,
    /// Total cost of the patients assigned in the plan.
    pub assigned_cost: u64,
    /// Patients in plan order.
    pub patients: Vec<PatientId>,
    /// `backlog + assigned_cost`.
    pub final_time: u64,
    pub slack: u64,
    pub within_limit: bool,
}

/// Load indicators of a post-emergency plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub time_limit: u64,
    pub operators: Vec<OperatorLoad>,
    /// Largest final load (0 without operators).
    pub max_load: u64,
    /// Fraction of the available time in use (0.0 when nothing is available).
    pub utilization: f64,
}

impl LoadReport {
    /// Computes load indicators for a plan.
    ///
    /// Every action must be legal; a plan that stops short of the goal is
    /// still reported.
    pub fn calculate(
        problem: &PostEmergencyProblem,
        plan: &Plan<PostEmergencyAction>,
    ) -> Result<Self, ModelError> {
        trace(problem, plan)?;

        let mut operators: Vec<OperatorLoad> = problem
            .operators()
            .iter()
            .map(|op| OperatorLoad {
                operator: op.id,
                backlog: op.backlog,
                assigned_cost: 0,
                patients: Vec::new(),
                final_time: 0,
                slack: 0,
                within_limit: true,
            })
            .collect();

        for action in plan {
            if let PostEmergencyAction::AssignPatient { patient, operator } = action {
                let cost = problem.patient(*patient).map_or(0, |p| p.cost);
                let load = &mut operators[operator.index()];
                load.assigned_cost += cost;
                load.patients.push(*patient);
            }
        }

        let limit = problem.time_limit();
        for load in &mut operators {
            load.final_time = load.backlog + load.assigned_cost;
            load.slack = limit.saturating_sub(load.final_time);
            load.within_limit = load.final_time <= limit;
        }

        let max_load = operators.iter().map(|o| o.final_time).max().unwrap_or(0);
        let capacity = limit as f64 * operators.len() as f64;
        let utilization = if capacity == 0.0 {
            0.0
        } else {
            operators.iter().map(|o| o.final_time as f64).sum::<f64>() / capacity
        };

        Ok(Self {
            time_limit: limit,
            operators,
            max_load,
            utilization,
        })
    }

    /// Whether every operator ends within the limit.
    pub fn all_within_limit(&self) -> bool {
        self.operators.iter().all(|o| o.within_limit)
    }
}

/// Selection indicators of an emergency plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionReport {
    /// Selected operators, initially selected ones included.
    pub selected: Vec<OperatorId>,
    /// Operators credited to each role, in plan order.
    pub coverage: BTreeMap<RoleId, Vec<OperatorId>>,
    /// Largest weight among selected operators.
    pub max_weighted_distance: u64,
    /// Value of the objective fluent after the plan.
    pub objective: u64,
    /// Whether every quota is met exactly.
    pub quotas_met: bool,
}

impl SelectionReport {
    /// Computes selection indicators for a plan, goal reached or not.
    pub fn calculate(
        problem: &EmergencyProblem,
        plan: &Plan<EmergencyAction>,
    ) -> Result<Self, ModelError> {
        let state = trace(problem, plan)?;

        let mut selected: Vec<OperatorId> = problem
            .operators()
            .iter()
            .map(|o| o.id)
            .filter(|&id| problem.starts_selected(id))
            .collect();
        let mut coverage: BTreeMap<RoleId, Vec<OperatorId>> =
            problem.roles().iter().map(|r| (r.id, Vec::new())).collect();

        for action in plan {
            match *action {
                EmergencyAction::Select(operator) => selected.push(operator),
                EmergencyAction::AssignRole { operator, role } => {
                    coverage.entry(role).or_default().push(operator);
                }
            }
        }
        selected.sort();

        let max_weighted_distance = selected
            .iter()
            .filter_map(|&id| problem.operator(id))
            .map(|o| o.cost)
            .max()
            .unwrap_or(0);
        let quotas_met = problem
            .roles()
            .iter()
            .all(|r| !r.is_required() || coverage[&r.id].len() == r.quota as usize);

        Ok(Self {
            selected,
            coverage,
            max_weighted_distance,
            objective: state.objective(),
            quotas_met,
        })
    }
}

/// Applies every action of a plan without requiring a goal state.
fn trace<M: AllocationModel>(model: &M, plan: &Plan<M::Action>) -> Result<M::State, ModelError> {
    let mut state = model.initial_state();
    for action in plan {
        model.apply(&mut state, action)?;
    }
    Ok(state)
}
