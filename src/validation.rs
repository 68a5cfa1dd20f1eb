//! Input validation for allocation problems.
//!
//! Checks structural integrity of raw inputs before any model state is
//! built. Every problem found is reported, not only the first. Detects:
//! - Negative values (from text adapters; typed inputs cannot hold them)
//! - Role and location references out of range
//! - Duplicate role references on one operator
//! - Quota lists that disagree with the role count
//! - Weighting bases that are not strictly increasing, and weight overflow
//! - Operator loads that cannot be represented
//!
//! Quotas larger than the eligible supply are not construction errors:
//! such instances are well formed but infeasible, and solvers report them
//! as [`SolveOutcome::ProvenInfeasible`](crate::solver::SolveOutcome).

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{DistanceWeighting, EmergencyInput, PostEmergencyInput};

/// Validation result.
pub type ValidationResult<T = ()> = Result<T, Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A count, cost, backlog or limit below zero.
    NegativeValue,
    /// An operator references a role index that doesn't exist.
    RoleOutOfRange,
    /// An operator's home location is not a known location.
    LocationOutOfRange,
    /// An operator lists the same role twice.
    DuplicateRole,
    /// The number of quotas differs from the number of roles.
    QuotaCountMismatch,
    /// The distance weighting base is 0.
    InvalidWeightingBase,
    /// A location weight does not fit in `u64`.
    WeightOverflow,
    /// Backlog plus total patient cost does not fit in `u64`.
    LoadOverflow,
    /// A value does not fit its target type.
    ValueTooLarge,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an emergency input against a weighting base.
///
/// Checks:
/// 1. The weighting base is at least 1
/// 2. One quota per role
/// 3. Every home location is below the location count
/// 4. Every role reference is below the role count, without duplicates
/// 5. Every location weight fits in `u64`
///
/// # Returns
/// The weighting and the weight of every operator's location (in operator
/// order) if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_emergency(
    input: &EmergencyInput,
    base: u64,
) -> ValidationResult<(DistanceWeighting, Vec<u64>)> {
    let mut errors = Vec::new();

    let weighting = DistanceWeighting::new(base);
    if weighting.is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWeightingBase,
            "Weighting base is 0 (no roles and no explicit base); weights would not increase",
        ));
    }
    let mut costs = Vec::with_capacity(input.operators.len());

    if input.quotas.len() != input.role_count {
        errors.push(ValidationError::new(
            ValidationErrorKind::QuotaCountMismatch,
            format!(
                "Expected {} quotas, found {}",
                input.role_count,
                input.quotas.len()
            ),
        ));
    }

    for (index, op) in input.operators.iter().enumerate() {
        if op.location >= input.location_count {
            errors.push(ValidationError::new(
                ValidationErrorKind::LocationOutOfRange,
                format!(
                    "Operator 'o{index}' is at location {} but only {} locations exist",
                    op.location, input.location_count
                ),
            ));
        } else if let Some(weighting) = weighting {
            match weighting.weight(op.location) {
                Some(cost) => costs.push(cost),
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::WeightOverflow,
                    format!(
                        "Operator 'o{index}': weight of location {} with base {base} overflows",
                        op.location
                    ),
                )),
            }
        }

        let mut seen = HashSet::new();
        for &role in &op.roles {
            if role >= input.role_count {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RoleOutOfRange,
                    format!(
                        "Operator 'o{index}' references unknown role 'r{role}' ({} roles)",
                        input.role_count
                    ),
                ));
            } else if !seen.insert(role) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateRole,
                    format!("Operator 'o{index}' lists role 'r{role}' more than once"),
                ));
            }
        }
    }

    match weighting {
        Some(weighting) if errors.is_empty() => Ok((weighting, costs)),
        _ => Err(errors),
    }
}

/// Validates a post-emergency input.
///
/// The only structural hazard left by unsigned inputs is arithmetic: the
/// largest possible load (largest backlog plus every patient) must fit.
pub fn validate_post_emergency(input: &PostEmergencyInput) -> ValidationResult {
    let mut errors = Vec::new();

    let total_cost = input
        .patient_costs
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c));
    let max_backlog = input.operator_backlogs.iter().copied().max().unwrap_or(0);

    match total_cost {
        None => errors.push(ValidationError::new(
            ValidationErrorKind::LoadOverflow,
            "Total patient cost overflows",
        )),
        Some(total) if total.checked_add(max_backlog).is_none() => {
            errors.push(ValidationError::new(
                ValidationErrorKind::LoadOverflow,
                format!("Backlog {max_backlog} plus total patient cost {total} overflows"),
            ))
        }
        Some(_) => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<T: std::fmt::Debug>(result: ValidationResult<T>) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_emergency() {
        let input = EmergencyInput::new(2)
            .with_operator(0, vec![0])
            .with_operator(1, vec![0, 1])
            .with_quotas(vec![1, 1]);
        let (weighting, costs) = validate_emergency(&input, 2).unwrap();
        assert_eq!(weighting.base(), 2);
        assert_eq!(costs, vec![0, 1]);
    }

    #[test]
    fn test_role_out_of_range() {
        let input = EmergencyInput::new(1)
            .with_operator(0, vec![3])
            .with_quotas(vec![1]);
        assert_eq!(
            kinds(validate_emergency(&input, 1)),
            vec![ValidationErrorKind::RoleOutOfRange]
        );
    }

    #[test]
    fn test_location_out_of_range() {
        let input = EmergencyInput::new(2)
            .with_operator(2, vec![0])
            .with_quotas(vec![1]);
        assert_eq!(
            kinds(validate_emergency(&input, 1)),
            vec![ValidationErrorKind::LocationOutOfRange]
        );
    }

    #[test]
    fn test_duplicate_role() {
        let input = EmergencyInput::new(1)
            .with_operator(0, vec![0, 0])
            .with_quotas(vec![1]);
        assert_eq!(
            kinds(validate_emergency(&input, 1)),
            vec![ValidationErrorKind::DuplicateRole]
        );
    }

    #[test]
    fn test_quota_mismatch() {
        let input = EmergencyInput::new(1)
            .with_quotas(vec![1])
            .with_role_count(2);
        assert_eq!(
            kinds(validate_emergency(&input, 2)),
            vec![ValidationErrorKind::QuotaCountMismatch]
        );
    }

    #[test]
    fn test_zero_base() {
        let input = EmergencyInput::new(1).with_operator(0, vec![]);
        assert_eq!(
            kinds(validate_emergency(&input, 0)),
            vec![ValidationErrorKind::InvalidWeightingBase]
        );
    }

    #[test]
    fn test_weight_overflow() {
        let input = EmergencyInput::new(100)
            .with_operator(99, vec![0])
            .with_quotas(vec![1]);
        assert_eq!(
            kinds(validate_emergency(&input, 10)),
            vec![ValidationErrorKind::WeightOverflow]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let input = EmergencyInput::new(1)
            .with_operator(5, vec![9])
            .with_operator(0, vec![0, 0])
            .with_quotas(vec![1]);
        let errors = validate_emergency(&input, 1).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_post_emergency_overflow() {
        let input = PostEmergencyInput::new(10)
            .with_patients(vec![u64::MAX, 1])
            .with_operators(vec![0]);
        assert_eq!(
            kinds(validate_post_emergency(&input)),
            vec![ValidationErrorKind::LoadOverflow]
        );

        let input = PostEmergencyInput::new(10)
            .with_patients(vec![u64::MAX - 1])
            .with_operators(vec![2]);
        assert_eq!(
            kinds(validate_post_emergency(&input)),
            vec![ValidationErrorKind::LoadOverflow]
        );
    }

    #[test]
    fn test_post_emergency_valid() {
        let input = PostEmergencyInput::new(4)
            .with_patients(vec![3, 4])
            .with_operators(vec![0, 0]);
        assert!(validate_post_emergency(&input).is_ok());
    }
}
