//! Plans (ordered transition sequences).

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of transition applications.
///
/// A plan carries no state of its own; its meaning is defined by replaying
/// it from a problem's initial state (see
/// [`AllocationModel::replay`](super::AllocationModel::replay)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan<A> {
    actions: Vec<A>,
}

impl<A> Plan<A> {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Appends an action.
    pub fn push(&mut self, action: A) {
        self.actions.push(action);
    }

    /// Adds an action (builder style).
    pub fn with_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Number of actions.
    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions in application order.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.actions.iter()
    }

    pub fn into_actions(self) -> Vec<A> {
        self.actions
    }
}

impl<A> Default for Plan<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> From<Vec<A>> for Plan<A> {
    fn from(actions: Vec<A>) -> Self {
        Self { actions }
    }
}

impl<A> FromIterator<A> for Plan<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl<'a, A> IntoIterator for &'a Plan<A> {
    type Item = &'a A;
    type IntoIter = std::slice::Iter<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

/// One action per line, in application order.
impl<A: fmt::Display> fmt::Display for Plan<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for action in &self.actions {
            writeln!(f, "{action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_len() {
        let plan = Plan::new().with_action("a").with_action("b");
        assert_eq!(plan.len(), 2);
        assert!(!plan.is_empty());
        assert_eq!(plan.actions(), &["a", "b"]);
    }

    #[test]
    fn test_display_one_per_line() {
        let plan: Plan<&str> = vec!["select(o1)", "set_role(o1, r0)"].into();
        assert_eq!(plan.to_string(), "select(o1)\nset_role(o1, r0)\n");
    }

    #[test]
    fn test_empty_default() {
        let plan: Plan<u8> = Plan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "");
    }
}
