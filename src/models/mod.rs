//! Allocation domain models.
//!
//! Both models follow the same pattern: objects created once from input,
//! state fluents that evolve monotonically, discrete actions with
//! preconditions and effects, a goal predicate, and an optional objective.
//!
//! # Domain Mappings
//!
//! | u-response | Emergency | Post-emergency |
//! |------------|-----------|----------------|
//! | Object | Operator, Role | Patient, Operator |
//! | Fluent | selected, eligible roles, assigned count, objective | processed, accumulated time, submitted |
//! | Action | `select`, `set_role` | `assign_patient`, `submit_operator_plan` |
//! | Goal | every positive quota met exactly | every operator submitted |
//! | Objective | minimize weighted max distance | none (satisfaction) |

pub mod emergency;
mod ids;
mod plan;
pub mod post_emergency;
mod weighting;

pub use emergency::{
    EmergencyAction, EmergencyInput, EmergencyProblem, EmergencyState, ObjectiveMode,
    OperatorSpec, Role,
};
pub use ids::{OperatorId, PatientId, RoleId};
pub use plan::Plan;
pub use post_emergency::{
    Patient, PostEmergencyAction, PostEmergencyInput, PostEmergencyProblem, PostEmergencyState,
};
pub use weighting::{distance_weight, DistanceWeighting};

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::{ModelError, TransitionError};

/// A state-transition allocation model.
///
/// Implementations must keep `apply` total over the action type: every
/// violated precondition is reported, never silently skipped.
///
/// Objectives, when present, must never decrease along a transition.
/// Search solvers rely on this to prune and to stop at the first goal.
pub trait AllocationModel {
    /// Full mutable problem state.
    type State: Clone + Eq + Hash + Debug;
    /// A transition application.
    type Action: Clone + Debug + Display;

    /// Fresh, independently owned initial state.
    fn initial_state(&self) -> Self::State;

    /// Legal actions worth exploring from `state`.
    ///
    /// May omit legal actions as long as some goal (an optimal one, for
    /// models with an objective) stays reachable through the returned ones.
    /// Must not return an action that `apply` would reject.
    fn successors(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies an action after checking all its preconditions.
    ///
    /// On error the state is left unchanged.
    fn apply(&self, state: &mut Self::State, action: &Self::Action)
        -> Result<(), TransitionError>;

    /// Goal predicate.
    fn is_goal(&self, state: &Self::State) -> bool;

    /// Objective value to minimize, or `None` for satisfaction models.
    fn objective(&self, state: &Self::State) -> Option<u64>;

    /// Whether `objective` is the model's true objective.
    ///
    /// When `false` it is only a search guide: a plan minimizing it is a
    /// valid goal plan but carries no optimality claim.
    fn objective_is_exact(&self) -> bool {
        true
    }

    /// Returns `true` when no goal is reachable from `state`.
    ///
    /// Must be sound (never prune a state from which a goal is reachable);
    /// it need not be complete.
    fn is_dead_end(&self, state: &Self::State) -> bool {
        let _ = state;
        false
    }

    /// Replays a plan from a fresh initial state.
    ///
    /// Fails on the first illegal transition, or with
    /// [`ModelError::GoalNotReached`] if the final state is not a goal.
    fn replay(&self, plan: &Plan<Self::Action>) -> Result<Self::State, ModelError> {
        let mut state = self.initial_state();
        for action in plan {
            self.apply(&mut state, action)?;
        }
        if self.is_goal(&state) {
            Ok(state)
        } else {
            Err(ModelError::GoalNotReached)
        }
    }
}
