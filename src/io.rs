//! Text input formats.
//!
//! String-level adapters; reading files and command lines is left to the
//! caller. Plans render through their `Display` implementation, one action
//! per line.
//!
//! # Emergency format
//!
//! ```text
//! L O R            locations, operators, roles
//! loc r r ...      one line per operator: home location, eligible roles
//! q_0 q_1 ...      one quota per role
//! ```
//!
//! Roles missing at the end of the quota line get quota 0 (no requirement);
//! a quota line longer than the role count is rejected.
//!
//! # Post-emergency format
//!
//! ```text
//! N c_1 ... c_N    patient count, then processing costs
//! M b_1 ... b_M    operator count, then initial backlogs
//! ```
//!
//! The time limit is supplied separately.

use crate::error::{ModelError, Result};
use crate::models::{EmergencyInput, OperatorSpec, PostEmergencyInput};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Parses the emergency text format.
///
/// # Example
/// ```
/// use u_response::io::parse_emergency;
///
/// let input = parse_emergency("2 3 2\n0 0\n1 0 1\n1 1\n1 1\n").unwrap();
/// assert_eq!(input.operators.len(), 3);
/// assert_eq!(input.quotas, vec![1, 1]);
/// ```
pub fn parse_emergency(text: &str) -> Result<EmergencyInput> {
    let lines: Vec<&str> = text.lines().collect();
    let mut reader = Reader::default();

    let header = reader.line_values(&lines, 0, "header")?;
    if header.len() != 3 {
        return Err(parse_error(
            1,
            format!("expected 'locations operators roles', found {} values", header.len()),
        ));
    }
    let location_count = reader.non_negative(header[0], "location count");
    let operator_count = reader.non_negative(header[1], "operator count");
    let role_count = reader.non_negative(header[2], "role count");
    reader.finish()?;

    let mut operators = Vec::new();
    for o in 0..operator_count as usize {
        let values = reader.line_values(&lines, o + 1, "operator")?;
        let Some((&location, roles)) = values.split_first() else {
            return Err(parse_error(o + 2, format!("operator 'o{o}' has no location")));
        };
        operators.push(OperatorSpec {
            location: reader.non_negative(location, &format!("location of 'o{o}'")) as usize,
            roles: roles
                .iter()
                .map(|&r| reader.non_negative(r, &format!("role of 'o{o}'")) as usize)
                .collect(),
        });
    }

    let quota_line = operator_count as usize + 1;
    let mut quotas: Vec<u32> = reader
        .line_values(&lines, quota_line, "quota")?
        .into_iter()
        .enumerate()
        .map(|(r, q)| {
            let q = reader.non_negative(q, &format!("quota of 'r{r}'"));
            u32::try_from(q).unwrap_or_else(|_| {
                reader.reject(
                    ValidationErrorKind::ValueTooLarge,
                    format!("Quota of 'r{r}' ({q}) is too large"),
                );
                0
            })
        })
        .collect();
    reader.finish()?;
    if quotas.len() < role_count as usize {
        quotas.resize(role_count as usize, 0);
    }

    Ok(EmergencyInput {
        location_count: location_count as usize,
        role_count: role_count as usize,
        operators,
        quotas,
    })
}

/// Parses the post-emergency text format with a separate time limit.
///
/// # Example
/// ```
/// use u_response::io::parse_post_emergency;
///
/// let input = parse_post_emergency("2 3 4\n2 0 0\n", 4).unwrap();
/// assert_eq!(input.patient_costs, vec![3, 4]);
/// assert_eq!(input.operator_backlogs, vec![0, 0]);
/// ```
pub fn parse_post_emergency(text: &str, time_limit: i64) -> Result<PostEmergencyInput> {
    let lines: Vec<&str> = text.lines().collect();
    let mut reader = Reader::default();

    let patients = reader.counted_line(&lines, 0, "patient", "cost")?;
    let operators = reader.counted_line(&lines, 1, "operator", "backlog")?;
    let limit = reader.non_negative(time_limit, "time limit");
    reader.finish()?;

    Ok(PostEmergencyInput {
        patient_costs: patients,
        operator_backlogs: operators,
        time_limit: limit,
    })
}

fn parse_error(line: usize, message: impl Into<String>) -> ModelError {
    ModelError::Parse {
        line,
        message: message.into(),
    }
}

/// Tokenizer that collects negative values as construction errors, so that
/// every offending value is reported together.
#[derive(Default)]
struct Reader {
    errors: Vec<ValidationError>,
}

impl Reader {
    /// Integers on a zero-based line.
    fn line_values(&self, lines: &[&str], index: usize, what: &str) -> Result<Vec<i64>> {
        let line = lines
            .get(index)
            .ok_or_else(|| parse_error(index + 1, format!("missing {what} line")))?;
        line.split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    parse_error(index + 1, format!("'{token}' is not an integer"))
                })
            })
            .collect()
    }

    /// A `count v_1 .. v_count` line.
    fn counted_line(
        &mut self,
        lines: &[&str],
        index: usize,
        what: &str,
        field: &str,
    ) -> Result<Vec<u64>> {
        let values = self.line_values(lines, index, what)?;
        let Some((&count, rest)) = values.split_first() else {
            return Err(parse_error(index + 1, format!("missing {what} count")));
        };
        let negative = count < 0;
        let count = self.non_negative(count, &format!("{what} count"));
        if !negative && rest.len() as u64 != count {
            return Err(parse_error(
                index + 1,
                format!("expected {count} {field} values, found {}", rest.len()),
            ));
        }
        Ok(rest
            .iter()
            .enumerate()
            .map(|(i, &v)| self.non_negative(v, &format!("{field} of {what} {i}")))
            .collect())
    }

    /// Records a construction error for negative values; the returned
    /// placeholder is never used because `finish` then fails.
    fn non_negative(&mut self, value: i64, what: &str) -> u64 {
        u64::try_from(value).unwrap_or_else(|_| {
            self.reject(
                ValidationErrorKind::NegativeValue,
                format!("Negative {what}: {value}"),
            );
            0
        })
    }

    fn reject(&mut self, kind: ValidationErrorKind, message: String) {
        self.errors.push(ValidationError::new(kind, message));
    }

    fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Construction(std::mem::take(&mut self.errors)))
        }
    }
}
