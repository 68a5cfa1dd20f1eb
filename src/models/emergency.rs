//! Emergency allocation model.
//!
//! Selects a subset of geographically distributed operators and credits each
//! selected operator to roles it is eligible for, so that every role with a
//! positive quota is covered exactly. The objective is the weighted maximum
//! distance among selected operators.
//!
//! # Transitions
//!
//! | Action | Preconditions | Effects |
//! |--------|---------------|---------|
//! | `select(o)` | `o` not selected | `o` selected; objective raised by `cost(o)` |
//! | `set_role(o, r)` | `o` selected, `o` still eligible for `r` | `assigned(r) += 1`; `r` removed from `o`'s eligible set |
//!
//! Operators at the home location (weight 0) start selected unless
//! [`EmergencyConfig::auto_select_home`] is off.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use super::{AllocationModel, DistanceWeighting, OperatorId, RoleId};
use crate::config::EmergencyConfig;
use crate::error::{ModelError, TransitionError};
use crate::validation;

/// How `select` updates the objective fluent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    /// `objective = max(objective, cost(o))`.
    #[default]
    Maximum,
    /// `objective += cost(o)` (increase-only emulation).
    ///
    /// Equals the true maximum only when at most one operator with a
    /// positive weight is selected; with weights growing geometrically it
    /// is dominated by the farthest selected operator.
    Cumulative,
}

/// Raw operator description, as supplied by input adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSpec {
    /// Home-location index (0 = on site).
    pub location: usize,
    /// Indices of roles the operator may cover.
    pub roles: Vec<usize>,
}

/// Raw emergency instance, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyInput {
    /// Number of known locations (valid location indices are `0..location_count`).
    pub location_count: usize,
    /// Number of roles.
    pub role_count: usize,
    /// Operators in identifier order.
    pub operators: Vec<OperatorSpec>,
    /// Required operators per role (0 = no requirement).
    pub quotas: Vec<u32>,
}

impl EmergencyInput {
    /// Creates an empty input over `location_count` locations.
    pub fn new(location_count: usize) -> Self {
        Self {
            location_count,
            ..Default::default()
        }
    }

    /// Adds an operator.
    pub fn with_operator(mut self, location: usize, roles: Vec<usize>) -> Self {
        self.operators.push(OperatorSpec { location, roles });
        self
    }

    /// Sets the role count explicitly.
    pub fn with_role_count(mut self, role_count: usize) -> Self {
        self.role_count = role_count;
        self
    }

    /// Sets the quotas; the role count follows the quota list.
    pub fn with_quotas(mut self, quotas: Vec<u32>) -> Self {
        self.role_count = quotas.len();
        self.quotas = quotas;
        self
    }
}

/// An operator with its derived distance cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    /// Home-location index.
    pub location: usize,
    /// Weighted distance, fixed at construction.
    pub cost: u64,
    /// Roles the operator is initially eligible for.
    pub eligible_roles: BTreeSet<RoleId>,
}

/// A role with its required quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Exact number of operators to credit (0 = no requirement).
    pub quota: u32,
}

impl Role {
    /// Whether the goal constrains this role.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.quota > 0
    }
}

/// A validated emergency instance.
///
/// # Example
/// ```
/// use u_response::models::{AllocationModel, EmergencyAction, EmergencyInput, EmergencyProblem};
/// use u_response::models::{OperatorId, Plan, RoleId};
///
/// let input = EmergencyInput::new(2)
///     .with_operator(0, vec![0])
///     .with_operator(1, vec![1])
///     .with_quotas(vec![1, 1]);
/// let problem = EmergencyProblem::from_input(&input).unwrap();
///
/// let plan: Plan<_> = vec![
///     EmergencyAction::assign(OperatorId(0), RoleId(0)),
///     EmergencyAction::Select(OperatorId(1)),
///     EmergencyAction::assign(OperatorId(1), RoleId(1)),
/// ]
/// .into();
/// let state = problem.replay(&plan).unwrap();
/// assert_eq!(state.objective(), 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyProblem {
    location_count: usize,
    operators: Vec<Operator>,
    roles: Vec<Role>,
    weighting: DistanceWeighting,
    objective_mode: ObjectiveMode,
    auto_select_home: bool,
}

impl EmergencyProblem {
    /// Builds a problem with the default configuration.
    pub fn from_input(input: &EmergencyInput) -> Result<Self, ModelError> {
        Self::from_input_with(input, &EmergencyConfig::default())
    }

    /// Builds a problem, validating every input field first.
    ///
    /// The weighting base is `config.weighting_base`, or the role count when
    /// unset.
    pub fn from_input_with(
        input: &EmergencyInput,
        config: &EmergencyConfig,
    ) -> Result<Self, ModelError> {
        let base = config.weighting_base.unwrap_or(input.role_count as u64);
        let (weighting, costs) =
            validation::validate_emergency(input, base).map_err(ModelError::Construction)?;

        let operators = input
            .operators
            .iter()
            .zip(costs)
            .enumerate()
            .map(|(index, (spec, cost))| Operator {
                id: OperatorId(index),
                location: spec.location,
                cost,
                eligible_roles: spec.roles.iter().map(|&r| RoleId(r)).collect(),
            })
            .collect();

        let roles = input
            .quotas
            .iter()
            .enumerate()
            .map(|(index, &quota)| Role {
                id: RoleId(index),
                quota,
            })
            .collect();

        debug!(
            operators = input.operators.len(),
            roles = input.role_count,
            base,
            "built emergency problem"
        );

        Ok(Self {
            location_count: input.location_count,
            operators,
            roles,
            weighting,
            objective_mode: config.objective,
            auto_select_home: config.auto_select_home,
        })
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(id.index())
    }

    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(id.index())
    }

    #[inline]
    pub fn location_count(&self) -> usize {
        self.location_count
    }

    #[inline]
    pub fn weighting(&self) -> DistanceWeighting {
        self.weighting
    }

    #[inline]
    pub fn objective_mode(&self) -> ObjectiveMode {
        self.objective_mode
    }

    /// Roles constrained by the goal.
    pub fn required_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|r| r.is_required())
    }

    /// Whether the operator starts selected.
    pub fn starts_selected(&self, id: OperatorId) -> bool {
        self.auto_select_home && self.operator(id).is_some_and(|o| o.cost == 0)
    }

    /// True maximum weight over selected operators, recomputed from the
    /// selection flags rather than read from the objective fluent.
    pub fn max_selected_cost(&self, state: &EmergencyState) -> u64 {
        self.operators
            .iter()
            .filter(|o| state.is_selected(o.id))
            .map(|o| o.cost)
            .max()
            .unwrap_or(0)
    }

    /// Operators (selected or not) still eligible for a role.
    fn remaining_supply(&self, state: &EmergencyState, role: RoleId) -> u32 {
        state
            .eligible
            .iter()
            .filter(|roles| roles.contains(&role))
            .count() as u32
    }

    /// Whether the role still needs credits.
    fn is_open(&self, state: &EmergencyState, role: &Role) -> bool {
        role.is_required() && state.assigned[role.id.index()] < role.quota
    }
}

/// Mutable state of an emergency run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmergencyState {
    selected: Vec<bool>,
    eligible: Vec<BTreeSet<RoleId>>,
    assigned: Vec<u32>,
    objective: u64,
}

impl EmergencyState {
    #[inline]
    pub fn is_selected(&self, id: OperatorId) -> bool {
        self.selected.get(id.index()).copied().unwrap_or(false)
    }

    /// Whether the operator may still be credited to the role.
    pub fn is_eligible(&self, operator: OperatorId, role: RoleId) -> bool {
        self.eligible
            .get(operator.index())
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Operators credited to a role so far.
    pub fn assigned_count(&self, role: RoleId) -> u32 {
        self.assigned.get(role.index()).copied().unwrap_or(0)
    }

    /// Current value of the objective fluent.
    #[inline]
    pub fn objective(&self) -> u64 {
        self.objective
    }

    pub fn selected_operators(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| OperatorId(i))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Sum of role credits over all roles.
    pub fn total_credits(&self) -> u64 {
        self.assigned.iter().map(|&c| u64::from(c)).sum()
    }
}

/// An emergency transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyAction {
    /// Mobilize an operator.
    Select(OperatorId),
    /// Credit a selected operator to a role.
    AssignRole { operator: OperatorId, role: RoleId },
}

impl EmergencyAction {
    /// Shorthand for [`EmergencyAction::AssignRole`].
    pub fn assign(operator: OperatorId, role: RoleId) -> Self {
        Self::AssignRole { operator, role }
    }
}

impl fmt::Display for EmergencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(o) => write!(f, "select({o})"),
            Self::AssignRole { operator, role } => write!(f, "set_role({operator}, {role})"),
        }
    }
}

impl AllocationModel for EmergencyProblem {
    type State = EmergencyState;
    type Action = EmergencyAction;

    fn initial_state(&self) -> EmergencyState {
        EmergencyState {
            selected: self
                .operators
                .iter()
                .map(|o| self.starts_selected(o.id))
                .collect(),
            eligible: self
                .operators
                .iter()
                .map(|o| o.eligible_roles.clone())
                .collect(),
            assigned: vec![0; self.roles.len()],
            objective: 0,
        }
    }

    /// Credits to open roles first, then selections of operators that can
    /// still serve an open role, cheapest first.
    fn successors(&self, state: &EmergencyState) -> Vec<EmergencyAction> {
        let mut actions = Vec::new();
        let open: Vec<&Role> = self
            .roles
            .iter()
            .filter(|r| self.is_open(state, r))
            .collect();

        for role in &open {
            for op in &self.operators {
                if state.is_selected(op.id) && state.is_eligible(op.id, role.id) {
                    actions.push(EmergencyAction::assign(op.id, role.id));
                }
            }
        }

        let mut selectable: Vec<&Operator> = self
            .operators
            .iter()
            .filter(|op| !state.is_selected(op.id))
            .filter(|op| open.iter().any(|r| state.is_eligible(op.id, r.id)))
            .collect();
        selectable.sort_by_key(|op| (op.cost, op.id));
        actions.extend(selectable.into_iter().map(|op| EmergencyAction::Select(op.id)));

        actions
    }

    fn apply(
        &self,
        state: &mut EmergencyState,
        action: &EmergencyAction,
    ) -> Result<(), TransitionError> {
        match *action {
            EmergencyAction::Select(id) => {
                let op = self
                    .operator(id)
                    .ok_or(TransitionError::UnknownOperator(id))?;
                if state.selected[id.index()] {
                    return Err(TransitionError::AlreadySelected(id));
                }
                state.selected[id.index()] = true;
                state.objective = match self.objective_mode {
                    ObjectiveMode::Maximum => state.objective.max(op.cost),
                    ObjectiveMode::Cumulative => state.objective.saturating_add(op.cost),
                };
            }
            EmergencyAction::AssignRole { operator, role } => {
                if self.operator(operator).is_none() {
                    return Err(TransitionError::UnknownOperator(operator));
                }
                if self.role(role).is_none() {
                    return Err(TransitionError::UnknownRole(role));
                }
                if !state.selected[operator.index()] {
                    return Err(TransitionError::NotSelected(operator));
                }
                if !state.eligible[operator.index()].remove(&role) {
                    return Err(TransitionError::NotEligible { operator, role });
                }
                state.assigned[role.index()] += 1;
            }
        }
        Ok(())
    }

    fn is_goal(&self, state: &EmergencyState) -> bool {
        self.required_roles()
            .all(|r| state.assigned[r.id.index()] == r.quota)
    }

    fn objective(&self, state: &EmergencyState) -> Option<u64> {
        Some(state.objective)
    }

    /// The cumulative fluent sums weights, so it does not rank plans by
    /// their maximum weight.
    fn objective_is_exact(&self) -> bool {
        self.objective_mode == ObjectiveMode::Maximum
    }

    /// A required role is lost once it is over-credited or when the
    /// operators still eligible for it cannot fill the gap.
    fn is_dead_end(&self, state: &EmergencyState) -> bool {
        self.required_roles().any(|r| {
            let assigned = state.assigned[r.id.index()];
            assigned > r.quota || assigned + self.remaining_supply(state, r.id) < r.quota
        })
    }
}
