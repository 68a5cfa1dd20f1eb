//! Post-emergency scheduling model.
//!
//! Every patient is assigned to exactly one operator; an operator's
//! accumulated time is its initial backlog plus the costs of its patients.
//! Once the whole population is processed, each operator submits its plan,
//! provided its accumulated time is within the global time limit.
//!
//! # Transitions
//!
//! | Action | Preconditions | Effects |
//! |--------|---------------|---------|
//! | `assign_patient(p, o)` | `p` not processed | `time(o) += cost(p)`; `p` processed |
//! | `submit_operator_plan(o)` | all patients processed, `o` not submitted, `time(o) <= limit` | `o` submitted |
//!
//! Assignment never checks the limit; overshoot is only caught at
//! submission. The "all processed" barrier is one shared counter, not a
//! per-operator check.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::{AllocationModel, OperatorId, PatientId};
use crate::error::{ModelError, TransitionError};
use crate::validation;

/// Raw post-emergency instance, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEmergencyInput {
    /// Processing cost per patient.
    pub patient_costs: Vec<u64>,
    /// Initial backlog per operator.
    pub operator_backlogs: Vec<u64>,
    /// Global time limit.
    pub time_limit: u64,
}

impl PostEmergencyInput {
    /// Creates an empty input with the given time limit.
    pub fn new(time_limit: u64) -> Self {
        Self {
            time_limit,
            ..Default::default()
        }
    }

    /// Sets the patient costs.
    pub fn with_patients(mut self, costs: Vec<u64>) -> Self {
        self.patient_costs = costs;
        self
    }

    /// Sets the operator backlogs.
    pub fn with_operators(mut self, backlogs: Vec<u64>) -> Self {
        self.operator_backlogs = backlogs;
        self
    }
}

/// A patient to be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    /// Processing cost.
    pub cost: u64,
}

/// An operator with its initial backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    /// Time already committed before any assignment.
    pub backlog: u64,
}

/// A validated post-emergency instance.
///
/// # Example
/// ```
/// use u_response::models::{AllocationModel, PostEmergencyAction, PostEmergencyInput};
/// use u_response::models::{OperatorId, PatientId, Plan, PostEmergencyProblem};
///
/// let input = PostEmergencyInput::new(4)
///     .with_patients(vec![3, 4])
///     .with_operators(vec![0, 0]);
/// let problem = PostEmergencyProblem::from_input(&input).unwrap();
///
/// let plan: Plan<_> = vec![
///     PostEmergencyAction::assign(PatientId(0), OperatorId(0)),
///     PostEmergencyAction::assign(PatientId(1), OperatorId(1)),
///     PostEmergencyAction::Submit(OperatorId(0)),
///     PostEmergencyAction::Submit(OperatorId(1)),
/// ]
/// .into();
/// assert!(problem.replay(&plan).is_ok());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PostEmergencyProblem {
    patients: Vec<Patient>,
    operators: Vec<Operator>,
    time_limit: u64,
}

impl PostEmergencyProblem {
    /// Builds a problem, validating every input field first.
    pub fn from_input(input: &PostEmergencyInput) -> Result<Self, ModelError> {
        validation::validate_post_emergency(input).map_err(ModelError::Construction)?;

        debug!(
            patients = input.patient_costs.len(),
            operators = input.operator_backlogs.len(),
            time_limit = input.time_limit,
            "built post-emergency problem"
        );

        Ok(Self {
            patients: input
                .patient_costs
                .iter()
                .enumerate()
                .map(|(i, &cost)| Patient {
                    id: PatientId(i),
                    cost,
                })
                .collect(),
            operators: input
                .operator_backlogs
                .iter()
                .enumerate()
                .map(|(i, &backlog)| Operator {
                    id: OperatorId(i),
                    backlog,
                })
                .collect(),
            time_limit: input.time_limit,
        })
    }

    /// Independent copy of this instance under another time limit.
    pub fn with_time_limit(&self, time_limit: u64) -> Self {
        Self {
            time_limit,
            ..self.clone()
        }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(id.index())
    }

    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(id.index())
    }

    #[inline]
    pub fn time_limit(&self) -> u64 {
        self.time_limit
    }

    /// Sum of all patient costs.
    pub fn total_cost(&self) -> u64 {
        self.patients.iter().map(|p| p.cost).sum()
    }

    /// Sum of all initial backlogs.
    pub fn total_backlog(&self) -> u64 {
        self.operators.iter().map(|o| o.backlog).sum()
    }
}

/// Mutable state of a post-emergency run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostEmergencyState {
    processed: Vec<bool>,
    /// Unprocessed patients; the global submission barrier.
    pending: usize,
    accumulated: Vec<u64>,
    submitted: Vec<bool>,
}

impl PostEmergencyState {
    pub fn is_processed(&self, id: PatientId) -> bool {
        self.processed.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of patients not yet processed.
    #[inline]
    pub fn pending_patients(&self) -> usize {
        self.pending
    }

    #[inline]
    pub fn all_processed(&self) -> bool {
        self.pending == 0
    }

    pub fn accumulated_time(&self, id: OperatorId) -> u64 {
        self.accumulated.get(id.index()).copied().unwrap_or(0)
    }

    pub fn is_submitted(&self, id: OperatorId) -> bool {
        self.submitted.get(id.index()).copied().unwrap_or(false)
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.iter().filter(|&&s| s).count()
    }
}

/// A post-emergency transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEmergencyAction {
    /// Give a patient to an operator.
    AssignPatient {
        patient: PatientId,
        operator: OperatorId,
    },
    /// Close an operator's plan.
    Submit(OperatorId),
}

impl PostEmergencyAction {
    /// Shorthand for [`PostEmergencyAction::AssignPatient`].
    pub fn assign(patient: PatientId, operator: OperatorId) -> Self {
        Self::AssignPatient { patient, operator }
    }
}

impl fmt::Display for PostEmergencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssignPatient { patient, operator } => {
                write!(f, "assign_patient({patient}, {operator})")
            }
            Self::Submit(o) => write!(f, "submit_operator_plan({o})"),
        }
    }
}

impl AllocationModel for PostEmergencyProblem {
    type State = PostEmergencyState;
    type Action = PostEmergencyAction;

    fn initial_state(&self) -> PostEmergencyState {
        PostEmergencyState {
            processed: vec![false; self.patients.len()],
            pending: self.patients.len(),
            accumulated: self.operators.iter().map(|o| o.backlog).collect(),
            submitted: vec![false; self.operators.len()],
        }
    }

    /// Assigns the lowest-index pending patient (assignment order does not
    /// change final loads), skipping operators it would push past the limit
    /// and operators whose load equals one already offered. After the
    /// barrier, offers the first unsubmitted operator.
    fn successors(&self, state: &PostEmergencyState) -> Vec<PostEmergencyAction> {
        if let Some(patient) = self.patients.iter().find(|p| !state.is_processed(p.id)) {
            let mut seen_loads = Vec::new();
            return self
                .operators
                .iter()
                .filter_map(|op| {
                    let load = state.accumulated[op.id.index()].checked_add(patient.cost)?;
                    if load > self.time_limit || seen_loads.contains(&load) {
                        return None;
                    }
                    seen_loads.push(load);
                    Some(PostEmergencyAction::assign(patient.id, op.id))
                })
                .collect();
        }

        self.operators
            .iter()
            .find(|op| !state.is_submitted(op.id))
            .filter(|op| state.accumulated[op.id.index()] <= self.time_limit)
            .map(|op| vec![PostEmergencyAction::Submit(op.id)])
            .unwrap_or_default()
    }

    fn apply(
        &self,
        state: &mut PostEmergencyState,
        action: &PostEmergencyAction,
    ) -> Result<(), TransitionError> {
        match *action {
            PostEmergencyAction::AssignPatient { patient, operator } => {
                let p = self
                    .patient(patient)
                    .ok_or(TransitionError::UnknownPatient(patient))?;
                if self.operator(operator).is_none() {
                    return Err(TransitionError::UnknownOperator(operator));
                }
                if state.processed[patient.index()] {
                    return Err(TransitionError::AlreadyProcessed(patient));
                }
                let slot = &mut state.accumulated[operator.index()];
                *slot = slot.saturating_add(p.cost);
                state.processed[patient.index()] = true;
                state.pending -= 1;
            }
            PostEmergencyAction::Submit(operator) => {
                if self.operator(operator).is_none() {
                    return Err(TransitionError::UnknownOperator(operator));
                }
                if state.pending > 0 {
                    return Err(TransitionError::PatientsPending {
                        remaining: state.pending,
                    });
                }
                if state.submitted[operator.index()] {
                    return Err(TransitionError::AlreadySubmitted(operator));
                }
                let accumulated = state.accumulated[operator.index()];
                if accumulated > self.time_limit {
                    return Err(TransitionError::TimeLimitExceeded {
                        operator,
                        accumulated,
                        limit: self.time_limit,
                    });
                }
                state.submitted[operator.index()] = true;
            }
        }
        Ok(())
    }

    fn is_goal(&self, state: &PostEmergencyState) -> bool {
        state.submitted.iter().all(|&s| s)
    }

    fn objective(&self, _state: &PostEmergencyState) -> Option<u64> {
        None
    }

    /// Accumulated time only grows, so an unsubmitted operator already past
    /// the limit can never submit.
    fn is_dead_end(&self, state: &PostEmergencyState) -> bool {
        self.operators.iter().any(|op| {
            !state.is_submitted(op.id) && state.accumulated[op.id.index()] > self.time_limit
        })
    }
}
