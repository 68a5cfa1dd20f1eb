//! Allocation models for emergency-response management.
//!
//! Two state-transition models share one shape: objects, state fluents,
//! discrete actions with preconditions and effects, a goal predicate and
//! (for the first model) an objective to minimize.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `EmergencyProblem` (operator selection and
//!   role assignment under a weighted-distance objective),
//!   `PostEmergencyProblem` (patient assignment under a global time limit),
//!   `DistanceWeighting`, `Plan`
//! - **`solver`**: The `AllocationSolver` seam and concrete solvers
//!   (best-first search, quota solver, backtracking and greedy packers,
//!   time-limit search)
//! - **`validation`**: Input integrity checks run before any transition
//! - **`io`**: Text input formats and plan rendering
//! - **`report`**: Indicators recomputed from plan traces
//! - **`config`**: `AllocationConfig`, loadable from TOML
//!
//! # Example
//!
//! ```
//! use u_response::models::{EmergencyInput, EmergencyProblem};
//! use u_response::solver::{AllocationSolver, QuotaSolver};
//!
//! let input = EmergencyInput::new(2)
//!     .with_operator(0, vec![0])
//!     .with_operator(1, vec![0, 1])
//!     .with_operator(1, vec![1])
//!     .with_quotas(vec![1, 1]);
//! let problem = EmergencyProblem::from_input(&input).unwrap();
//!
//! let outcome = QuotaSolver::new().solve(&problem);
//! assert_eq!(outcome.objective(), Some(1));
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod report;
pub mod solver;
pub mod validation;

pub use error::{ModelError, Result, TransitionError};
